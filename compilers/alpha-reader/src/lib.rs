//! Alpha-forest reader: turns dependency-parsed sentences into semantic
//! hyperedge trees.
//!
//! The pipeline is: [`conll`] or [`Sentence::new`] for input, [`features`]
//! to encode each head/dependent edge, [`classifier`] to pick a
//! [`Transformation`] per edge, and [`builder`] to apply those
//! transformations bottom-up to an [`alpha_tree::Tree`].

pub mod builder;
pub mod classifier;
pub mod conll;
pub mod error;
pub mod features;
pub mod output;
pub mod sentence;

pub use alpha_protocol::{ElementId, Position, Transformation};
pub use builder::{apply_transformation, transform, Link, TreeBuilder};
pub use classifier::{learn, learn_dataset, AlphaForest, LearnReport, TransformationPredictor};
pub use conll::{parse_conll, read_conll, ConllError};
pub use error::{ClassifierError, ReaderError};
pub use features::{
    build_case, expanded_fields, Case, DependencyEncoding, FeatureSchema, TokenFeatures,
    CASE_FIELDS,
};
pub use output::ParserOutput;
pub use sentence::{Sentence, SentenceError, Token, TokenData};

#[cfg(test)]
mod tests {
    use super::*;
    use alpha_forest::{Dataset, ForestConfig};
    use std::sync::Arc;
    use std::thread;

    const TEXT: &str = "\
# text = Satellites have been tracking ice.
1\tSatellites\tsatellite\tNOUN\tNNS\t_\t4\tnsubj\t_\t_
2\thave\thave\tAUX\tVBP\t_\t4\taux\t_\t_
3\tbeen\tbe\tAUX\tVBN\t_\t4\taux\t_\t_
4\ttracking\ttrack\tVERB\tVBG\t_\t0\tROOT\t_\t_
5\tice\tice\tNOUN\tNN\t_\t4\tdobj\t_\t_

# text = Mary likes apples
1\tMary\tMary\tPROPN\tNNP\t_\t2\tnsubj\t_\t_
2\tlikes\tlike\tVERB\tVBZ\t_\t0\tROOT\t_\t_
3\tapples\tapple\tNOUN\tNNS\t_\t2\tdobj\t_\t_
";

    /// NOUN/PROPN children grow their head, AUX children nest.
    fn model() -> AlphaForest {
        let schema = FeatureSchema::default();
        let mut csv = schema.csv_header();
        csv.push('\n');
        let parent = TokenData::new("v", "VERB", "ROOT", None);
        for (tag, label) in [
            ("NOUN", Transformation::GROW),
            ("PROPN", Transformation::GROW),
            ("AUX", Transformation::NEST),
        ] {
            for position in [Position::Left, Position::Right] {
                for _ in 0..4 {
                    let child = TokenData::new("c", tag, "dep", Some(0));
                    let mut case = schema.build_case(&parent, &child, position);
                    case.set("transformation", label as f32);
                    let row: Vec<String> = case.values().iter().map(|v| v.to_string()).collect();
                    csv.push_str(&row.join(","));
                    csv.push('\n');
                }
            }
        }
        let data = Dataset::from_csv(&csv).unwrap();
        let config = ForestConfig { n_trees: 20, seed: 5, ..ForestConfig::default() };
        let (forest, _) = learn_dataset(&data, &config).unwrap();
        AlphaForest::from_forest(forest).unwrap()
    }

    #[test]
    fn test_end_to_end() {
        let alpha = model();
        let outputs: Vec<ParserOutput> = parse_conll(TEXT)
            .unwrap()
            .into_iter()
            .map(|s| transform(s, &alpha).unwrap())
            .collect();

        for output in &outputs {
            assert_eq!(output.tree().len(), output.sentence().len());
            assert_eq!(output.tree().root_id(), Some(ElementId(0)));
        }

        // `have` nests on the left, so `been` is classified as a right child.
        assert_eq!(
            outputs[0].to_hyperedge_str(false).unwrap(),
            "(tracking have satellites been ice)"
        );
        assert_eq!(outputs[1].to_hyperedge_str(false).unwrap(), "(likes mary apples)");
    }

    #[test]
    fn test_model_is_shared_across_threads() {
        let alpha = Arc::new(model());
        let sentences = parse_conll(TEXT).unwrap();

        let handles: Vec<_> = sentences
            .into_iter()
            .map(|sentence| {
                let alpha = Arc::clone(&alpha);
                thread::spawn(move || {
                    transform(sentence, &alpha)
                        .unwrap()
                        .to_hyperedge_str(false)
                        .unwrap()
                })
            })
            .collect();

        let rendered: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(rendered[1], "(likes mary apples)");
    }
}
