use alpha_tree::{Tree, TreeError};

use crate::sentence::Sentence;

/// A sentence paired with the semantic tree built for it.
#[derive(Debug, Clone)]
pub struct ParserOutput {
    sentence: Sentence,
    tree: Tree,
}

impl ParserOutput {
    pub fn new(sentence: Sentence, tree: Tree) -> Self {
        Self { sentence, tree }
    }

    pub fn sentence(&self) -> &Sentence {
        &self.sentence
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn into_parts(self) -> (Sentence, Tree) {
        (self.sentence, self.tree)
    }

    pub fn to_hyperedge_str(&self, with_namespaces: bool) -> Result<String, TreeError> {
        self.tree.to_hyperedge_str(with_namespaces)
    }
}
