use serde::{Deserialize, Serialize};

use crate::ForestError;

/// How many candidate features are examined at each split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// `floor(sqrt(n_features))`, at least one.
    Sqrt,
    All,
    Count(usize),
}

impl MaxFeatures {
    pub fn resolve(self, n_features: usize) -> usize {
        if n_features == 0 {
            return 0;
        }
        match self {
            MaxFeatures::Sqrt => ((n_features as f64).sqrt() as usize).max(1),
            MaxFeatures::All => n_features,
            MaxFeatures::Count(n) => n.clamp(1, n_features),
        }
    }
}

/// Training configuration for the transformation forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees in the ensemble
    pub n_trees: usize,
    /// Maximum depth of each tree; unbounded when absent
    pub max_depth: Option<usize>,
    /// Minimum rows a node needs before it may be split
    pub min_samples_split: usize,
    /// Minimum rows each side of a split must keep
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    /// Draw a bootstrap sample per tree instead of using every row
    pub bootstrap: bool,
    /// Seed for reproducibility
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            seed: 0,
        }
    }
}

impl ForestConfig {
    pub fn validate(&self) -> Result<(), ForestError> {
        if self.n_trees == 0 {
            return Err(ForestError::Config("n_trees must be at least 1".into()));
        }
        if self.min_samples_split < 2 {
            return Err(ForestError::Config("min_samples_split must be at least 2".into()));
        }
        if self.min_samples_leaf == 0 {
            return Err(ForestError::Config("min_samples_leaf must be at least 1".into()));
        }
        if self.max_features == MaxFeatures::Count(0) {
            return Err(ForestError::Config("max_features must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_max_features() {
        assert_eq!(MaxFeatures::Sqrt.resolve(40), 6);
        assert_eq!(MaxFeatures::Sqrt.resolve(1), 1);
        assert_eq!(MaxFeatures::All.resolve(40), 40);
        assert_eq!(MaxFeatures::Count(100).resolve(40), 40);
        assert_eq!(MaxFeatures::Sqrt.resolve(0), 0);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ForestConfig =
            serde_json::from_str(r#"{ "n_trees": 10, "max_features": { "count": 3 } }"#).unwrap();
        assert_eq!(config.n_trees, 10);
        assert_eq!(config.max_features, MaxFeatures::Count(3));
        assert_eq!(config.min_samples_split, 2);
        assert!(config.bootstrap);
        assert!(config.validate().is_ok());

        let bad = ForestConfig { n_trees: 0, ..ForestConfig::default() };
        assert!(matches!(bad.validate(), Err(ForestError::Config(_))));
    }
}
