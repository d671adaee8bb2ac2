//! Bottom-up construction of the semantic tree from a dependency tree.
//!
//! Each token gets a leaf element on the way down. On the way back up, once
//! all of a token's children are built, the classifier is asked how the
//! token's element attaches to its parent's, and the parent is mutated.
//!
//! Left children are visited in surface order. They are classified as LEFT
//! until one of them comes back as NEST; from then on the remaining left
//! children of that head are classified as RIGHT. Right children are always
//! RIGHT.
//!
//! Traversal runs on an explicit stack, so sentence depth is not bounded by
//! the native call stack.

use alpha_protocol::{ElementId, Position, Transformation};
use alpha_tree::{Leaf, Tree, TreeError};
use tracing::debug;

use crate::classifier::TransformationPredictor;
use crate::output::ParserOutput;
use crate::sentence::{Sentence, Token};
use crate::ReaderError;

/// Where a token hangs: its head, the head's element and its side.
#[derive(Debug, Clone, Copy)]
pub struct Link<'s> {
    pub parent: Token<'s>,
    pub parent_id: ElementId,
    pub position: Position,
}

struct Frame<'s> {
    token: Token<'s>,
    id: ElementId,
    link: Option<Link<'s>>,
    /// Whether this token is a left child of its head.
    from_left: bool,
    left: Vec<Token<'s>>,
    right: Vec<Token<'s>>,
    next_left: usize,
    next_right: usize,
    /// Set once a left child came back as NEST; never reset.
    nested_left: bool,
}

impl<'s> Frame<'s> {
    fn enter(
        token: Token<'s>,
        link: Option<Link<'s>>,
        from_left: bool,
        tree: &mut Tree,
    ) -> Result<Self, TreeError> {
        let id = tree.create_leaf(Leaf::new(token.text(), token.tag(), token.dep()))?;
        Ok(Self {
            token,
            id,
            link,
            from_left,
            left: token.left_children(),
            right: token.right_children(),
            next_left: 0,
            next_right: 0,
            nested_left: false,
        })
    }

    fn next_child(&mut self) -> Option<(Token<'s>, Position, bool)> {
        if let Some(&child) = self.left.get(self.next_left) {
            self.next_left += 1;
            let position = if self.nested_left {
                Position::Right
            } else {
                Position::Left
            };
            return Some((child, position, true));
        }
        if let Some(&child) = self.right.get(self.next_right) {
            self.next_right += 1;
            return Some((child, Position::Right, false));
        }
        None
    }
}

pub struct TreeBuilder<'p, P: ?Sized> {
    predictor: &'p P,
}

impl<'p, P> TreeBuilder<'p, P>
where
    P: TransformationPredictor + ?Sized,
{
    pub fn new(predictor: &'p P) -> Self {
        Self { predictor }
    }

    /// Builds the tree of `sentence` from its root token.
    pub fn process_sentence(&self, sentence: Sentence) -> Result<ParserOutput, ReaderError> {
        let mut tree = Tree::new();
        let (root_id, _) = self.process_token(sentence.root(), None, &mut tree)?;
        tree.set_root_id(root_id)?;
        debug!(tokens = sentence.len(), elements = tree.len(), "sentence processed");
        Ok(ParserOutput::new(sentence, tree))
    }

    /// Builds the subtree of `token` and, when `link` is given, grafts it
    /// onto the linked parent element.
    ///
    /// Returns the token's element id and the transformation computed for it
    /// ([`Transformation::not_applicable`] without a link).
    pub fn process_token<'s>(
        &self,
        token: Token<'s>,
        link: Option<Link<'s>>,
        tree: &mut Tree,
    ) -> Result<(ElementId, Transformation), TreeError> {
        let mut stack = vec![Frame::enter(token, link, false, tree)?];
        let mut result = None;

        while let Some(frame) = stack.last_mut() {
            if let Some((child, position, from_left)) = frame.next_child() {
                let link = Link {
                    parent: frame.token,
                    parent_id: frame.id,
                    position,
                };
                stack.push(Frame::enter(child, Some(link), from_left, tree)?);
                continue;
            }

            let Some(done) = stack.pop() else { break };
            let transformation = self.attach(&done, tree)?;
            match stack.last_mut() {
                Some(parent) => {
                    if done.from_left && transformation == Transformation::Nest {
                        parent.nested_left = true;
                    }
                }
                None => result = Some((done.id, transformation)),
            }
        }

        result.ok_or(TreeError::NoRoot)
    }

    fn attach(&self, frame: &Frame<'_>, tree: &mut Tree) -> Result<Transformation, TreeError> {
        let Some(link) = frame.link else {
            return Ok(Transformation::not_applicable());
        };

        let transformation = self
            .predictor
            .predict_transformation(&link.parent, &frame.token, link.position);
        debug!(
            parent = link.parent.text(),
            child = frame.token.text(),
            position = %link.position,
            %transformation,
            "edge classified"
        );
        apply_transformation(tree, transformation, link.parent_id, frame.id, link.position)?;
        Ok(transformation)
    }
}

/// Mutates `parent` according to `transformation`. No-op codes leave the
/// tree untouched.
pub fn apply_transformation(
    tree: &mut Tree,
    transformation: Transformation,
    parent: ElementId,
    child: ElementId,
    position: Position,
) -> Result<(), TreeError> {
    match transformation {
        Transformation::Grow => tree.grow(parent, child, position),
        Transformation::Apply => tree.apply(parent, child, position),
        Transformation::Nest => tree.nest(parent, child, position),
        Transformation::NestDeep => tree.nest_deep(parent, child, position),
        Transformation::Noop(code) => {
            debug!(code, %child, "transformation is a no-op");
            Ok(())
        }
    }
}

/// Builds the output of one sentence with an already loaded predictor.
pub fn transform<P>(sentence: Sentence, predictor: &P) -> Result<ParserOutput, ReaderError>
where
    P: TransformationPredictor + ?Sized,
{
    TreeBuilder::new(predictor).process_sentence(sentence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentence::TokenData;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Answers from a per-child script and records every call.
    #[derive(Default)]
    struct Scripted {
        answers: HashMap<String, Transformation>,
        calls: RefCell<Vec<(String, String, Position)>>,
    }

    impl Scripted {
        fn with(answers: &[(&str, Transformation)]) -> Self {
            Self {
                answers: answers.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
                calls: RefCell::default(),
            }
        }

        fn position_of(&self, child: &str) -> Position {
            self.calls
                .borrow()
                .iter()
                .find(|(_, c, _)| c == child)
                .map(|(_, _, p)| *p)
                .unwrap()
        }

        fn order(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|(_, c, _)| c.clone()).collect()
        }
    }

    impl TransformationPredictor for Scripted {
        fn predict_transformation(
            &self,
            parent: &Token<'_>,
            child: &Token<'_>,
            position: Position,
        ) -> Transformation {
            self.calls
                .borrow_mut()
                .push((parent.text().to_string(), child.text().to_string(), position));
            self.answers
                .get(child.text())
                .copied()
                .unwrap_or(Transformation::Grow)
        }
    }

    fn svo() -> Sentence {
        Sentence::new(
            "Mary likes apples",
            vec![
                TokenData::new("Mary", "NOUN", "nsubj", Some(1)),
                TokenData::new("likes", "VERB", "ROOT", None),
                TokenData::new("apples", "NOUN", "dobj", Some(1)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_verb_with_subject_and_object() {
        let predictor = Scripted::with(&[]);
        let output = transform(svo(), &predictor).unwrap();
        let tree = output.tree();

        assert_eq!(tree.len(), 3);
        assert_eq!(tree.root_id(), Some(ElementId(0)));
        assert_eq!(tree.get(ElementId(0)).unwrap().token().unwrap().text, "likes");
        assert_eq!(predictor.position_of("Mary"), Position::Left);
        assert_eq!(predictor.position_of("apples"), Position::Right);
        // Left operand is in place before the right child attaches.
        assert_eq!(predictor.order(), vec!["Mary", "apples"]);
        assert_eq!(output.to_hyperedge_str(false).unwrap(), "(likes mary apples)");
    }

    #[test]
    fn test_sticky_nest_flag() {
        let sentence = Sentence::new(
            "the big dog barks",
            vec![
                TokenData::new("the", "DET", "det", Some(2)),
                TokenData::new("big", "ADJ", "amod", Some(2)),
                TokenData::new("dog", "NOUN", "ROOT", None),
                TokenData::new("barks", "VERB", "acl", Some(2)),
            ],
        )
        .unwrap();
        let predictor = Scripted::with(&[
            ("the", Transformation::Nest),
            ("big", Transformation::Grow),
            ("barks", Transformation::Grow),
        ]);
        let output = transform(sentence, &predictor).unwrap();

        assert_eq!(predictor.position_of("the"), Position::Left);
        assert_eq!(predictor.position_of("big"), Position::Right);
        assert_eq!(predictor.position_of("barks"), Position::Right);
        assert_eq!(output.tree().len(), 4);
        assert_eq!(output.to_hyperedge_str(false).unwrap(), "(dog the big barks)");
    }

    #[test]
    fn test_flag_is_per_head() {
        // tracking <- Satellites <- from <- NASA ; tracking <- have <- been (left)
        let sentence = Sentence::new(
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
        .unwrap();
        let predictor = Scripted::with(&[
            ("NASA", Transformation::Apply),
            ("from", Transformation::Nest),
            ("Satellites", Transformation::Grow),
            ("have", Transformation::Nest),
            ("been", Transformation::NestDeep),
            ("ice", Transformation::Grow),
        ]);
        let output = transform(sentence, &predictor).unwrap();

        // `from` nests under Satellites, but it is a right child: no effect on tracking.
        assert_eq!(predictor.position_of("from"), Position::Right);
        assert_eq!(predictor.position_of("Satellites"), Position::Left);
        assert_eq!(predictor.position_of("have"), Position::Left);
        assert_eq!(predictor.position_of("been"), Position::Right);
        assert_eq!(predictor.position_of("ice"), Position::Right);
        assert_eq!(
            predictor.order(),
            vec!["NASA", "from", "Satellites", "have", "been", "ice"]
        );
        assert_eq!(output.tree().len(), 7);
        assert_eq!(
            output.to_hyperedge_str(false).unwrap(),
            "(tracking (have been) (satellites (from nasa)) ice)"
        );
    }

    #[test]
    fn test_noop_codes_leave_parent_untouched() {
        let predictor = Scripted::with(&[
            ("Mary", Transformation::Noop(Transformation::IGNORE)),
            ("apples", Transformation::Noop(99)),
        ]);
        let output = transform(svo(), &predictor).unwrap();
        assert_eq!(output.tree().len(), 3);
        assert_eq!(output.to_hyperedge_str(false).unwrap(), "likes");
        assert!(output.tree().elements().all(|e| e.attached_to.is_none()));
    }

    #[test]
    fn test_process_token_with_link() {
        let sentence = svo();
        let predictor = Scripted::with(&[("apples", Transformation::Apply)]);
        let builder = TreeBuilder::new(&predictor);
        let mut tree = Tree::new();

        let head = tree.create_leaf(Leaf::new("likes", "VERB", "ROOT")).unwrap();
        let link = Link {
            parent: sentence.root(),
            parent_id: head,
            position: Position::Right,
        };
        let (id, transformation) = builder
            .process_token(sentence.token(2).unwrap(), Some(link), &mut tree)
            .unwrap();

        assert_eq!(transformation, Transformation::Apply);
        assert_eq!(tree.get(id).unwrap().attached_to, Some(head));
        assert_eq!(tree.render(head, false).unwrap(), "(likes apples)");
    }

    #[test]
    fn test_deep_chain_does_not_recurse() {
        let n = 50_000;
        let tokens = (0..n)
            .map(|i| {
                let head = if i == 0 { None } else { Some(i - 1) };
                TokenData::new(format!("w{}", i), "NOUN", "dep", head)
            })
            .collect();
        let sentence = Sentence::new("chain", tokens).unwrap();
        let predictor = Scripted::with(&[]);
        let output = transform(sentence, &predictor).unwrap();
        assert_eq!(output.tree().len(), n);
        assert_eq!(output.tree().root_id(), Some(ElementId(0)));
    }

    struct Always(Transformation);

    impl TransformationPredictor for Always {
        fn predict_transformation(&self, _: &Token<'_>, _: &Token<'_>, _: Position) -> Transformation {
            self.0
        }
    }

    #[test]
    fn test_wide_nest_deep_head() {
        let n = 20_000;
        let mut tokens: Vec<TokenData> = (0..n)
            .map(|i| TokenData::new(format!("w{}", i), "ADV", "advmod", Some(n)))
            .collect();
        tokens.push(TokenData::new("head", "VERB", "ROOT", None));
        let sentence = Sentence::new("wide", tokens).unwrap();

        let output = transform(sentence, &Always(Transformation::NestDeep)).unwrap();
        let tree = output.tree();
        assert_eq!(tree.len(), n + 1);

        // Each left child opens the next level below the previous one.
        let head = ElementId(0);
        assert_eq!(tree.get(ElementId(1)).unwrap().attached_to, Some(head));
        for i in 2..=n as u32 {
            assert_eq!(tree.get(ElementId(i)).unwrap().attached_to, Some(ElementId(i - 1)));
        }
        assert_eq!(tree.deepest_nested(head).unwrap(), ElementId(n as u32));
    }

    proptest! {
        /// Left children before the first NEST are LEFT, all later ones RIGHT.
        #[test]
        fn test_sticky_flag_law(
            answers in proptest::collection::vec(0u8..5, 1..8),
            right_children in 0usize..3,
        ) {
            let n_left = answers.len();
            let mut tokens: Vec<TokenData> = (0..n_left)
                .map(|i| TokenData::new(format!("l{}", i), "NOUN", "dep", Some(n_left)))
                .collect();
            tokens.push(TokenData::new("head", "VERB", "ROOT", None));
            for i in 0..right_children {
                tokens.push(TokenData::new(format!("r{}", i), "NOUN", "dep", Some(n_left)));
            }
            let sentence = Sentence::new("", tokens).unwrap();

            let script: Vec<(String, Transformation)> = answers
                .iter()
                .enumerate()
                .map(|(i, code)| (format!("l{}", i), Transformation::from_code(*code as i32)))
                .chain((0..right_children).map(|i| (format!("r{}", i), Transformation::Nest)))
                .collect();
            let refs: Vec<(&str, Transformation)> =
                script.iter().map(|(k, v)| (k.as_str(), *v)).collect();
            let predictor = Scripted::with(&refs);

            let output = transform(sentence, &predictor).unwrap();
            prop_assert_eq!(output.tree().len(), n_left + 1 + right_children);
            // The head is entered first.
            prop_assert_eq!(output.tree().root_id(), Some(ElementId(0)));

            let first_nest = answers.iter().position(|c| *c as i32 == Transformation::NEST);
            for i in 0..n_left {
                let expected = match first_nest {
                    Some(k) if i > k => Position::Right,
                    _ => Position::Left,
                };
                prop_assert_eq!(predictor.position_of(&format!("l{}", i)), expected);
            }
            for i in 0..right_children {
                prop_assert_eq!(predictor.position_of(&format!("r{}", i)), Position::Right);
            }
        }
    }
}
