#![no_std] // Model schema must stay usable from embedded/WASM readers

extern crate alloc;

// Tools and host-side readers link std.
#[cfg(feature = "std")]
extern crate std;

pub mod ids;
pub mod tags;
pub mod transform;

pub use ids::{ElementId, SentenceId};
pub use tags::{dep_index, pos_index, DEP_LABELS, POS_TAGS};
pub use transform::{Position, Transformation};

pub mod model;
pub use model::*;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec;
    use rkyv::{from_bytes, to_bytes};

    #[test]
    fn test_model_serialization() {
        let original = ForestModel {
            version: MODEL_FORMAT_VERSION,
            feature_names: vec!["child_pos_ADJ".to_string(), "child_position".to_string()],
            classes: vec![Transformation::GROW, Transformation::NEST],
            trees: vec![DecisionTree {
                nodes: vec![
                    TreeNode::Split { feature: 1, threshold: 0.5, left: 1, right: 2 },
                    TreeNode::Leaf { distribution: vec![1.0, 0.0] },
                    TreeNode::Leaf { distribution: vec![0.25, 0.75] },
                ],
            }],
        };

        let bytes = to_bytes::<_, 256>(&original).expect("Failed to serialize ForestModel");

        // Same path the model loader takes.
        let deserialized: ForestModel = from_bytes(&bytes).expect("Failed to deserialize ForestModel");

        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_corrupt_bytes_rejected() {
        let garbage = rkyv::AlignedVec::new();
        assert!(from_bytes::<ForestModel>(&garbage).is_err());
    }

    #[test]
    fn test_id_layout() {
        // ElementId(u32) should be exactly 4 bytes
        assert_eq!(core::mem::size_of::<ElementId>(), 4);
        assert_eq!(ElementId::new(7).index(), 7);
        assert_eq!(ElementId::new(7).to_string(), "e7");
    }

    #[test]
    fn test_transformation_codes() {
        for t in [
            Transformation::Grow,
            Transformation::Apply,
            Transformation::Nest,
            Transformation::NestDeep,
        ] {
            assert_eq!(Transformation::from_code(t.code()), t);
            assert!(!t.is_noop());
        }
        assert_eq!(Transformation::from_code(Transformation::IGNORE), Transformation::Noop(0));
        assert_eq!(Transformation::from_code(42), Transformation::Noop(42));
        assert_eq!(Transformation::not_applicable().code(), -1);
    }

    #[test]
    fn test_vocabulary_lookup() {
        assert_eq!(pos_index("ADJ"), Some(0));
        assert_eq!(pos_index("VERB"), Some(16));
        assert_eq!(pos_index("verb"), None);
        assert_eq!(dep_index("nsubj"), Some(28));
        assert_eq!(Position::Left.as_feature(), 0.);
        assert_eq!(Position::Right.as_feature(), 1.);
    }
}
