use std::fs;
use std::path::Path;

use alpha_protocol::{DecisionTree, ForestModel, TreeNode, MODEL_FORMAT_VERSION};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use rkyv::AlignedVec;
use tracing::{debug, info};

use crate::fit::TreeGrower;
use crate::{Dataset, ForestConfig, ForestError};

/// A validated, read-only ensemble of decision trees.
///
/// Prediction never mutates the forest, so one instance can be shared by
/// reference (or behind an `Arc`) across any number of sentence readers.
#[derive(Debug, Clone, PartialEq)]
pub struct Forest {
    model: ForestModel,
}

impl Forest {
    /// Fits one tree per bootstrap sample of `data`.
    pub fn fit(data: &Dataset, config: &ForestConfig) -> Result<Self, ForestError> {
        config.validate()?;
        if data.is_empty() {
            return Err(crate::DatasetError::Empty.into());
        }

        let mut classes = data.labels().to_vec();
        classes.sort_unstable();
        classes.dedup();

        info!(
            trees = config.n_trees,
            rows = data.len(),
            features = data.n_features(),
            classes = classes.len(),
            "fitting forest"
        );

        let grower = TreeGrower::new(data, config, &classes);
        let trees: Vec<DecisionTree> = (0..config.n_trees)
            .map(|i| {
                let mut rng = Xoshiro256StarStar::seed_from_u64(tree_seed(config.seed, i));
                let rows = grower.sample(&mut rng);
                let tree = grower.grow(rows, &mut rng);
                debug!(tree = i, nodes = tree.nodes.len(), "grew tree");
                tree
            })
            .collect();

        Self::from_model(ForestModel {
            version: MODEL_FORMAT_VERSION,
            feature_names: data.feature_names().to_vec(),
            classes,
            trees,
        })
    }

    /// Checks that `model` can be traversed safely before accepting it.
    pub fn from_model(model: ForestModel) -> Result<Self, ForestError> {
        if model.version != MODEL_FORMAT_VERSION {
            return Err(ForestError::Version {
                found: model.version,
                expected: MODEL_FORMAT_VERSION,
            });
        }
        if model.classes.is_empty() {
            return Err(ForestError::Invalid("model has no classes".into()));
        }
        if model.trees.is_empty() {
            return Err(ForestError::Invalid("model has no trees".into()));
        }

        let n_features = model.feature_names.len();
        let n_classes = model.classes.len();
        for (t, tree) in model.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(ForestError::Invalid(format!("tree {} is empty", t)));
            }
            for (i, node) in tree.nodes.iter().enumerate() {
                match node {
                    TreeNode::Split { feature, left, right, .. } => {
                        let (left, right) = (*left as usize, *right as usize);
                        // Children always follow their parent, so traversal terminates.
                        if left <= i || right <= i || left >= tree.nodes.len() || right >= tree.nodes.len() {
                            return Err(ForestError::Invalid(format!(
                                "tree {} node {} has out-of-order children",
                                t, i
                            )));
                        }
                        if *feature as usize >= n_features {
                            return Err(ForestError::Invalid(format!(
                                "tree {} node {} splits on unknown feature {}",
                                t, i, feature
                            )));
                        }
                    }
                    TreeNode::Leaf { distribution } => {
                        if distribution.len() != n_classes {
                            return Err(ForestError::Invalid(format!(
                                "tree {} leaf {} has {} probabilities for {} classes",
                                t,
                                i,
                                distribution.len(),
                                n_classes
                            )));
                        }
                    }
                }
            }
        }

        Ok(Self { model })
    }

    pub fn model(&self) -> &ForestModel {
        &self.model
    }

    pub fn feature_names(&self) -> &[String] {
        &self.model.feature_names
    }

    pub fn classes(&self) -> &[i32] {
        &self.model.classes
    }

    pub fn n_trees(&self) -> usize {
        self.model.trees.len()
    }

    /// Mean of the leaf distributions reached in every tree.
    pub fn predict_proba(&self, features: &[f32]) -> Result<Vec<f32>, ForestError> {
        let expected = self.model.feature_names.len();
        if features.len() != expected {
            return Err(ForestError::FeatureCount {
                expected,
                found: features.len(),
            });
        }

        let mut proba = vec![0.0f32; self.model.classes.len()];
        for tree in &self.model.trees {
            for (p, q) in proba.iter_mut().zip(leaf_for(tree, features)) {
                *p += q;
            }
        }
        let n = self.model.trees.len() as f32;
        proba.iter_mut().for_each(|p| *p /= n);
        Ok(proba)
    }

    /// The most probable class label; ties go to the smallest label.
    pub fn predict(&self, features: &[f32]) -> Result<i32, ForestError> {
        let proba = self.predict_proba(features)?;
        let mut best = 0;
        for (i, p) in proba.iter().enumerate() {
            if *p > proba[best] {
                best = i;
            }
        }
        Ok(self.model.classes[best])
    }

    /// Fraction of rows of `data` predicted correctly.
    pub fn score(&self, data: &Dataset) -> Result<f32, ForestError> {
        if data.is_empty() {
            return Ok(0.0);
        }
        let mut hits = 0usize;
        for (row, label) in data.rows().iter().zip(data.labels()) {
            if self.predict(row)? == *label {
                hits += 1;
            }
        }
        Ok(hits as f32 / data.len() as f32)
    }

    pub fn to_bytes(&self) -> Result<AlignedVec, ForestError> {
        rkyv::to_bytes::<_, 4096>(&self.model).map_err(|e| ForestError::Serialize(format!("{:?}", e)))
    }

    /// Validates and deserializes an archived model.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ForestError> {
        // Archives must be read from suitably aligned memory.
        let mut aligned = AlignedVec::with_capacity(bytes.len());
        aligned.extend_from_slice(bytes);
        let model = rkyv::from_bytes::<ForestModel>(&aligned)
            .map_err(|e| ForestError::Corrupt(format!("{:?}", e)))?;
        Self::from_model(model)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ForestError> {
        let bytes = self.to_bytes()?;
        fs::write(path.as_ref(), bytes.as_slice())?;
        info!(path = %path.as_ref().display(), bytes = bytes.len(), "model written");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ForestError> {
        let bytes = fs::read(path.as_ref())?;
        let forest = Self::from_bytes(&bytes)?;
        info!(
            path = %path.as_ref().display(),
            trees = forest.n_trees(),
            features = forest.feature_names().len(),
            "model loaded"
        );
        Ok(forest)
    }
}

fn leaf_for<'t>(tree: &'t DecisionTree, features: &[f32]) -> &'t [f32] {
    let mut index = 0;
    loop {
        match &tree.nodes[index] {
            TreeNode::Split { feature, threshold, left, right } => {
                index = if features[*feature as usize] <= *threshold {
                    *left as usize
                } else {
                    *right as usize
                };
            }
            TreeNode::Leaf { distribution } => return distribution,
        }
    }
}

fn tree_seed(seed: u64, tree: usize) -> u64 {
    seed ^ (tree as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}
