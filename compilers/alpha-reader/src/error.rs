use alpha_forest::{DatasetError, ForestError};
use alpha_tree::TreeError;
use thiserror::Error;

use crate::conll::ConllError;
use crate::sentence::SentenceError;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error(transparent)]
    Forest(#[from] ForestError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("model has {found} feature columns matching no known feature schema")]
    FeatureMismatch { found: usize },
}

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Sentence(#[from] SentenceError),
    #[error(transparent)]
    Conll(#[from] ConllError),
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
}
