use alpha_protocol::ElementId;

/// Surface data of the token an element was created for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    pub text: String,
    pub tag: String,
    pub dep: String,
}

impl Leaf {
    pub fn new(text: impl Into<String>, tag: impl Into<String>, dep: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tag: tag.into(),
            dep: dep.into(),
        }
    }
}

/// Structure held by an element.
///
/// `Ref` points at another element of the same tree; `Edge` lists its
/// connector first and its arguments after it.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Leaf(Leaf),
    Ref(ElementId),
    Edge(Vec<Content>),
}

impl Content {
    pub fn is_edge(&self) -> bool {
        matches!(self, Content::Edge(_))
    }
}

/// One node of the semantic tree, created once per token.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub id: ElementId,
    pub content: Content,
    /// Most recently nested child, i.e. the open nested level below this element.
    pub nested: Option<ElementId>,
    /// Element this one has been grafted onto, if any.
    pub attached_to: Option<ElementId>,
}

impl Element {
    pub(crate) fn leaf(id: ElementId, leaf: Leaf) -> Self {
        Self {
            id,
            content: Content::Leaf(leaf),
            nested: None,
            attached_to: None,
        }
    }

    /// The token data this element was created from.
    pub fn token(&self) -> Option<&Leaf> {
        let mut current = &self.content;
        loop {
            match current {
                Content::Leaf(leaf) => return Some(leaf),
                Content::Edge(items) => current = items.first()?,
                Content::Ref(_) => return None,
            }
        }
    }

    /// Makes sure the content is an edge, keeping the old content as its connector.
    pub(crate) fn enclose(&mut self) -> &mut Vec<Content> {
        if !self.content.is_edge() {
            self.wrap();
        }
        match &mut self.content {
            Content::Edge(items) => items,
            _ => unreachable!("content was just enclosed"),
        }
    }

    /// Turns the whole current content into the connector of a new edge.
    pub(crate) fn wrap(&mut self) -> &mut Vec<Content> {
        let old = std::mem::replace(&mut self.content, Content::Edge(Vec::with_capacity(2)));
        match &mut self.content {
            Content::Edge(items) => {
                items.push(old);
                items
            }
            _ => unreachable!("content was just replaced by an edge"),
        }
    }
}
