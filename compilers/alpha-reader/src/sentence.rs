use std::fmt;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SentenceError {
    #[error("sentence has no tokens")]
    Empty,
    #[error("sentence has no root token")]
    NoRoot,
    #[error("sentence has several root tokens ({0} and {1})")]
    MultipleRoots(usize, usize),
    #[error("token {token} points at head {head}, outside the sentence")]
    HeadOutOfRange { token: usize, head: usize },
    #[error("token {0} is its own head")]
    SelfHead(usize),
    #[error("dependency heads form a cycle")]
    Cycle,
}

/// One token as delivered by the dependency parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenData {
    pub text: String,
    pub lemma: String,
    /// Part-of-speech tag
    pub tag: String,
    /// Dependency label towards the head
    pub dep: String,
    /// Surface position of the head, `None` for the root
    pub head: Option<usize>,
}

impl TokenData {
    pub fn new(text: impl Into<String>, tag: impl Into<String>, dep: impl Into<String>, head: Option<usize>) -> Self {
        let text = text.into();
        Self {
            lemma: text.to_lowercase(),
            text,
            tag: tag.into(),
            dep: dep.into(),
            head,
        }
    }
}

/// A dependency-parsed sentence.
///
/// Tokens are graph nodes in surface order; edges run from head to dependent.
#[derive(Debug, Clone)]
pub struct Sentence {
    text: String,
    graph: DiGraph<TokenData, ()>,
    root: NodeIndex,
}

impl Sentence {
    pub fn new(text: impl Into<String>, tokens: Vec<TokenData>) -> Result<Self, SentenceError> {
        if tokens.is_empty() {
            return Err(SentenceError::Empty);
        }

        let n = tokens.len();
        let mut root = None;
        for (i, token) in tokens.iter().enumerate() {
            match token.head {
                None => match root {
                    None => root = Some(i),
                    Some(first) => return Err(SentenceError::MultipleRoots(first, i)),
                },
                Some(head) if head >= n => {
                    return Err(SentenceError::HeadOutOfRange { token: i, head })
                }
                Some(head) if head == i => return Err(SentenceError::SelfHead(i)),
                Some(_) => {}
            }
        }
        let root = root.ok_or(SentenceError::NoRoot)?;

        let mut graph = DiGraph::with_capacity(n, n - 1);
        let heads: Vec<Option<usize>> = tokens.iter().map(|t| t.head).collect();
        for token in tokens {
            graph.add_node(token);
        }
        for (i, head) in heads.into_iter().enumerate() {
            if let Some(head) = head {
                graph.add_edge(NodeIndex::new(head), NodeIndex::new(i), ());
            }
        }
        if toposort(&graph, None).is_err() {
            return Err(SentenceError::Cycle);
        }

        Ok(Self {
            text: text.into(),
            graph,
            root: NodeIndex::new(root),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// The syntactic root token.
    pub fn root(&self) -> Token<'_> {
        Token { sentence: self, node: self.root }
    }

    pub fn token(&self, index: usize) -> Option<Token<'_>> {
        (index < self.len()).then(|| Token {
            sentence: self,
            node: NodeIndex::new(index),
        })
    }

    pub fn tokens(&self) -> impl Iterator<Item = Token<'_>> {
        self.graph
            .node_indices()
            .map(move |node| Token { sentence: self, node })
    }
}

/// Borrowed view of one token of a [`Sentence`].
#[derive(Clone, Copy)]
pub struct Token<'s> {
    sentence: &'s Sentence,
    node: NodeIndex,
}

impl<'s> Token<'s> {
    pub fn data(&self) -> &'s TokenData {
        &self.sentence.graph[self.node]
    }

    /// Surface position inside the sentence.
    pub fn index(&self) -> usize {
        self.node.index()
    }

    pub fn text(&self) -> &'s str {
        &self.data().text
    }

    pub fn tag(&self) -> &'s str {
        &self.data().tag
    }

    pub fn dep(&self) -> &'s str {
        &self.data().dep
    }

    pub fn head(&self) -> Option<Token<'s>> {
        self.data().head.and_then(|h| self.sentence.token(h))
    }

    /// Dependents preceding the token, in surface order.
    pub fn left_children(&self) -> Vec<Token<'s>> {
        self.children().into_iter().filter(|c| c.index() < self.index()).collect()
    }

    /// Dependents following the token, in surface order.
    pub fn right_children(&self) -> Vec<Token<'s>> {
        self.children().into_iter().filter(|c| c.index() > self.index()).collect()
    }

    fn children(&self) -> Vec<Token<'s>> {
        let mut children: Vec<Token<'s>> = self
            .sentence
            .graph
            .neighbors_directed(self.node, Direction::Outgoing)
            .map(|node| Token { sentence: self.sentence, node })
            .collect();
        children.sort_by_key(|c| c.index());
        children
    }
}

impl PartialEq for Token<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.sentence, other.sentence) && self.node == other.node
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.index(), self.text(), self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// "Satellites from NASA have been tracking ice"
    fn satellites() -> Sentence {
        Sentence::new(
            "Satellites from NASA have been tracking ice",
            vec![
                TokenData::new("Satellites", "NOUN", "nsubj", Some(5)),
                TokenData::new("from", "ADP", "prep", Some(0)),
                TokenData::new("NASA", "PROPN", "pobj", Some(1)),
                TokenData::new("have", "AUX", "aux", Some(5)),
                TokenData::new("been", "AUX", "aux", Some(5)),
                TokenData::new("tracking", "VERB", "ROOT", None),
                TokenData::new("ice", "NOUN", "dobj", Some(5)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_children_are_split_by_side() {
        let sentence = satellites();
        let root = sentence.root();
        assert_eq!(root.text(), "tracking");

        let left: Vec<&str> = root.left_children().iter().map(|t| t.text()).collect();
        let right: Vec<&str> = root.right_children().iter().map(|t| t.text()).collect();
        assert_eq!(left, vec!["Satellites", "have", "been"]);
        assert_eq!(right, vec!["ice"]);

        let satellites = sentence.token(0).unwrap();
        assert!(satellites.left_children().is_empty());
        assert_eq!(satellites.right_children()[0].text(), "from");
        assert_eq!(satellites.head().unwrap(), root);
        assert!(root.head().is_none());
    }

    #[test]
    fn test_malformed_heads() {
        let t = |head| TokenData::new("x", "X", "dep", head);
        assert_eq!(Sentence::new("", vec![]).unwrap_err(), SentenceError::Empty);
        assert_eq!(
            Sentence::new("", vec![t(None), t(None)]).unwrap_err(),
            SentenceError::MultipleRoots(0, 1)
        );
        assert_eq!(
            Sentence::new("", vec![t(Some(1)), t(Some(0))]).unwrap_err(),
            SentenceError::NoRoot
        );
        assert_eq!(
            Sentence::new("", vec![t(None), t(Some(7))]).unwrap_err(),
            SentenceError::HeadOutOfRange { token: 1, head: 7 }
        );
        assert_eq!(
            Sentence::new("", vec![t(None), t(Some(1))]).unwrap_err(),
            SentenceError::SelfHead(1)
        );
        assert_eq!(
            Sentence::new("", vec![t(None), t(Some(2)), t(Some(1))]).unwrap_err(),
            SentenceError::Cycle
        );
    }
}
