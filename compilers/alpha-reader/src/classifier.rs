use std::path::Path;

use alpha_forest::{Dataset, Forest, ForestConfig};
use alpha_protocol::{Position, Transformation};
use tracing::{debug, info, warn};

use crate::features::{Case, FeatureSchema};
use crate::sentence::Token;
use crate::ClassifierError;

/// Picks the transformation that grafts `child` onto `parent`.
pub trait TransformationPredictor {
    fn predict_transformation(
        &self,
        parent: &Token<'_>,
        child: &Token<'_>,
        position: Position,
    ) -> Transformation;
}

impl<T: TransformationPredictor + ?Sized> TransformationPredictor for &T {
    fn predict_transformation(
        &self,
        parent: &Token<'_>,
        child: &Token<'_>,
        position: Position,
    ) -> Transformation {
        (**self).predict_transformation(parent, child, position)
    }
}

impl<T: TransformationPredictor + ?Sized> TransformationPredictor for std::sync::Arc<T> {
    fn predict_transformation(
        &self,
        parent: &Token<'_>,
        child: &Token<'_>,
        position: Position,
    ) -> Transformation {
        (**self).predict_transformation(parent, child, position)
    }
}

/// Forest-backed predictor, loaded once and shared read-only.
#[derive(Debug, Clone)]
pub struct AlphaForest {
    forest: Forest,
    schema: FeatureSchema,
}

impl AlphaForest {
    /// Loads a model artifact; a missing, corrupt or mismatched model is fatal.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        Self::from_forest(Forest::load(path)?)
    }

    pub fn from_forest(forest: Forest) -> Result<Self, ClassifierError> {
        let schema = FeatureSchema::detect(forest.feature_names()).ok_or(
            ClassifierError::FeatureMismatch {
                found: forest.feature_names().len(),
            },
        )?;

        for &class in forest.classes() {
            if let Transformation::Noop(code) = Transformation::from_code(class) {
                if code != Transformation::IGNORE {
                    warn!(code, "model can predict an unknown transformation code; it will be a no-op");
                }
            }
        }
        debug!(encoding = ?schema.encoding(), "feature schema detected");

        Ok(Self { forest, schema })
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn predict_case(&self, case: &Case<'_>) -> Transformation {
        match self.forest.predict(case.features()) {
            Ok(code) => Transformation::from_code(code),
            Err(e) => {
                // Unreachable for cases built from `self.schema`.
                warn!(error = %e, "inference failed; leaving the parent untouched");
                Transformation::not_applicable()
            }
        }
    }
}

impl TransformationPredictor for AlphaForest {
    fn predict_transformation(
        &self,
        parent: &Token<'_>,
        child: &Token<'_>,
        position: Position,
    ) -> Transformation {
        let case = self.schema.build_case(parent, child, position);
        self.predict_case(&case)
    }
}

/// Outcome of an offline training run.
#[derive(Debug, Clone, PartialEq)]
pub struct LearnReport {
    pub rows: usize,
    pub features: usize,
    pub trees: usize,
    /// Resubstitution accuracy on the training rows
    pub score: f32,
}

/// Trains a forest on the CSV table at `infile` and writes it to `outfile`.
pub fn learn(
    infile: impl AsRef<Path>,
    outfile: impl AsRef<Path>,
    config: &ForestConfig,
) -> Result<LearnReport, ClassifierError> {
    let data = Dataset::read_csv(infile)?;
    let (forest, report) = learn_dataset(&data, config)?;
    forest.save(outfile)?;
    Ok(report)
}

/// Fits and scores a forest without touching the filesystem.
pub fn learn_dataset(
    data: &Dataset,
    config: &ForestConfig,
) -> Result<(Forest, LearnReport), ClassifierError> {
    if FeatureSchema::detect(data.feature_names()).is_none() {
        warn!(
            columns = data.n_features(),
            "training columns match no feature schema; the model will not load for reading"
        );
    }

    let forest = Forest::fit(data, config)?;
    let score = forest.score(data)?;
    info!(score, "resubstitution accuracy");

    let report = LearnReport {
        rows: data.len(),
        features: data.n_features(),
        trees: forest.n_trees(),
        score,
    };
    Ok((forest, report))
}
