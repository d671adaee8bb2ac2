use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] io::Error),
    #[error("dataset has no header row")]
    MissingHeader,
    #[error("dataset has no rows")]
    Empty,
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("line {line}: expected {expected} columns, found {found}")]
    Ragged {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: label {value} is not an integer")]
    NonIntegerLabel { line: usize, value: f64 },
    #[error("line {line}: column {column} is not a finite number")]
    NonFinite { line: usize, column: usize },
}

#[derive(Debug, Error)]
pub enum ForestError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("model i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("model artifact is corrupt: {0}")]
    Corrupt(String),
    #[error("failed to serialize model: {0}")]
    Serialize(String),
    #[error("model format version {found} is not supported (expected {expected})")]
    Version { found: u32, expected: u32 },
    #[error("model is inconsistent: {0}")]
    Invalid(String),
    #[error("expected {expected} features, got {found}")]
    FeatureCount { expected: usize, found: usize },
    #[error("invalid forest configuration: {0}")]
    Config(String),
}
