//! Closed part-of-speech vocabulary used by the feature encoder.
//!
//! The order of [`POS_TAGS`] fixes the order of the one-hot columns in every
//! training table and every trained model, so entries are only ever appended
//! together with a new model format version.

/// Universal part-of-speech tags, in column order.
pub const POS_TAGS: [&str; 19] = [
    "ADJ", "ADP", "ADV", "AUX", "CONJ", "CCONJ", "DET", "INTJ", "NOUN", "NUM", "PART", "PRON",
    "PROPN", "PUNCT", "SCONJ", "SYM", "VERB", "X", "SPACE",
];

/// Dependency relation labels, in column order. Only read when dependency
/// labels are one-hot encoded.
pub const DEP_LABELS: [&str; 45] = [
    "acl", "acomp", "advcl", "advmod", "agent", "amod", "appos", "attr", "aux", "auxpass", "case",
    "cc", "ccomp", "compound", "conj", "csubj", "csubjpass", "dative", "dep", "det", "dobj",
    "expl", "intj", "mark", "meta", "neg", "nmod", "npadvmod", "nsubj", "nsubjpass", "nummod",
    "oprd", "parataxis", "pcomp", "pobj", "poss", "preconj", "predet", "prep", "prt", "punct",
    "quantmod", "relcl", "xcomp", "ROOT",
];

/// Returns the column offset of `tag` inside [`POS_TAGS`].
pub fn pos_index(tag: &str) -> Option<usize> {
    POS_TAGS.iter().position(|t| *t == tag)
}

/// Returns the column offset of `label` inside [`DEP_LABELS`].
pub fn dep_index(label: &str) -> Option<usize> {
    DEP_LABELS.iter().position(|l| *l == label)
}
