//! Id-addressed semantic tree built for one sentence.
//!
//! Every token gets exactly one [`Element`]; elements are never replaced,
//! only mutated in place by grafting already-built children onto them.
//!
//! Attachment checks and nested-level lookups are amortized: attached
//! elements are tracked with a union-find over their top elements, and the
//! deepest open level found from an element is remembered until a nested
//! level inside an attached structure is replaced.

pub mod element;
pub mod render;

pub use element::{Content, Element, Leaf};

use alpha_protocol::{ElementId, Position};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("unknown element {0}")]
    UnknownElement(ElementId),
    #[error("element {0} cannot be attached to itself")]
    SelfAttachment(ElementId),
    #[error("element {child} is already attached to {parent}")]
    AlreadyAttached { child: ElementId, parent: ElementId },
    #[error("attaching {child} under {parent} would create a cycle")]
    Cycle { child: ElementId, parent: ElementId },
    #[error("tree has no root element")]
    NoRoot,
    #[error("tree cannot hold more than {} elements", u32::MAX)]
    Full,
}

#[derive(Debug, Clone, Default)]
pub struct Tree {
    elements: Vec<Element>,
    root_id: Option<ElementId>,
    /// Union-find parent per element; one set per attached structure.
    sets: Vec<u32>,
    /// A point on the open nested chain of each element, stamped with `epoch`.
    deepest: Vec<Option<(u64, ElementId)>>,
    /// Bumped whenever a nested level of an attached element is replaced.
    epoch: u64,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fresh leaf element and returns its id.
    pub fn create_leaf(&mut self, leaf: Leaf) -> Result<ElementId, TreeError> {
        let raw = u32::try_from(self.elements.len()).map_err(|_| TreeError::Full)?;
        let id = ElementId::new(raw);
        self.elements.push(Element::leaf(id, leaf));
        self.sets.push(raw);
        self.deepest.push(None);
        Ok(id)
    }

    pub fn get(&self, id: ElementId) -> Result<&Element, TreeError> {
        self.elements
            .get(id.index())
            .ok_or(TreeError::UnknownElement(id))
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    pub fn root_id(&self) -> Option<ElementId> {
        self.root_id
    }

    pub fn set_root_id(&mut self, id: ElementId) -> Result<(), TreeError> {
        self.get(id)?;
        self.root_id = Some(id);
        Ok(())
    }

    /// Adds `child` as a new argument of `parent`'s edge.
    pub fn grow(
        &mut self,
        parent: ElementId,
        child: ElementId,
        position: Position,
    ) -> Result<(), TreeError> {
        self.check_link(parent, child)?;
        let items = self.elements[parent.index()].enclose();
        insert_argument(items, Content::Ref(child), position);
        self.link(parent, child);
        Ok(())
    }

    /// Turns `parent`'s whole structure into a connector applied to `child`.
    ///
    /// The resulting edge holds a single argument, so the position does not
    /// change its shape.
    pub fn apply(
        &mut self,
        parent: ElementId,
        child: ElementId,
        _position: Position,
    ) -> Result<(), TreeError> {
        self.check_link(parent, child)?;
        self.elements[parent.index()]
            .wrap()
            .push(Content::Ref(child));
        self.link(parent, child);
        Ok(())
    }

    /// Attaches `child` under `parent` and opens it as `parent`'s nested level.
    pub fn nest(
        &mut self,
        parent: ElementId,
        child: ElementId,
        position: Position,
    ) -> Result<(), TreeError> {
        self.grow(parent, child, position)?;

        let element = &mut self.elements[parent.index()];
        let replaced = element.nested.replace(child).is_some();
        if replaced {
            if element.attached_to.is_some() {
                // Chains of other elements may run through `parent`.
                self.epoch += 1;
            } else {
                // Nothing nests into an unattached element.
                self.deepest[parent.index()] = None;
            }
        }
        Ok(())
    }

    /// Same as [`Tree::nest`], targeting the deepest open nested level below `parent`.
    pub fn nest_deep(
        &mut self,
        parent: ElementId,
        child: ElementId,
        position: Position,
    ) -> Result<(), TreeError> {
        let target = self.deepest_nested(parent)?;
        self.nest(target, child, position)?;
        self.deepest[parent.index()] = Some((self.epoch, child));
        Ok(())
    }

    /// Follows the chain of open nested levels starting at `id`.
    pub fn deepest_nested(&self, id: ElementId) -> Result<ElementId, TreeError> {
        self.walk_nested(id).map(|(deepest, _)| deepest)
    }

    /// Returns the deepest open level and the number of links followed.
    fn walk_nested(&self, id: ElementId) -> Result<(ElementId, usize), TreeError> {
        self.get(id)?;
        let mut current = match self.deepest[id.index()] {
            Some((epoch, hint)) if epoch == self.epoch => hint,
            _ => id,
        };
        // A chain can never be longer than the arena.
        for steps in 0..self.elements.len() {
            match self.get(current)?.nested {
                Some(next) => current = next,
                None => return Ok((current, steps)),
            }
        }
        Ok((current, self.elements.len()))
    }

    fn check_link(&mut self, parent: ElementId, child: ElementId) -> Result<(), TreeError> {
        self.get(parent)?;
        let child_elem = self.get(child)?;
        if parent == child {
            return Err(TreeError::SelfAttachment(child));
        }
        if let Some(existing) = child_elem.attached_to {
            return Err(TreeError::AlreadyAttached { child, parent: existing });
        }

        // `child` is unattached, so it is the top of its own structure; sharing
        // a set with `parent` means it is one of `parent`'s ancestors.
        if self.find(parent) == self.find(child) {
            return Err(TreeError::Cycle { child, parent });
        }
        Ok(())
    }

    fn link(&mut self, parent: ElementId, child: ElementId) {
        let (top, sub) = (self.find(parent), self.find(child));
        self.sets[sub as usize] = top;
        self.elements[child.index()].attached_to = Some(parent);
    }

    fn find(&mut self, id: ElementId) -> u32 {
        let mut top = id.0;
        while self.sets[top as usize] != top {
            top = self.sets[top as usize];
        }
        let mut current = id.0;
        while self.sets[current as usize] != top {
            let next = self.sets[current as usize];
            self.sets[current as usize] = top;
            current = next;
        }
        top
    }
}

fn insert_argument(items: &mut Vec<Content>, arg: Content, position: Position) {
    match position {
        // Index 0 is the connector.
        Position::Left => items.insert(items.len().min(1), arg),
        Position::Right => items.push(arg),
    }
}
