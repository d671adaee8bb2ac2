use rkyv::{Archive, Deserialize, Serialize};
use alloc::string::String;
use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// Bumped whenever the archived layout or the feature column order changes.
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// A fitted ensemble of decision trees, as written to the model artifact.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[archive(check_bytes)]
pub struct ForestModel {
    pub version: u32,
    /// Feature column names, label column excluded.
    pub feature_names: Vec<String>,
    /// Sorted distinct labels seen during training.
    pub classes: Vec<i32>,
    pub trees: Vec<DecisionTree>,
}

/// Flat node storage; `nodes[0]` is the root.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[archive(check_bytes)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[archive(check_bytes)]
pub enum TreeNode {
    /// Rows with `features[feature] <= threshold` go left.
    Split {
        feature: u32,
        threshold: f32,
        left: u32,
        right: u32,
    },
    /// Class probabilities, indexed like `ForestModel::classes`.
    Leaf { distribution: Vec<f32> },
}
