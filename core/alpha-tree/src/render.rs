use alpha_protocol::ElementId;

use crate::{Content, Leaf, Tree, TreeError};

enum Step<'a> {
    Content(&'a Content),
    Text(&'static str),
}

impl Tree {
    /// Renders the tree from its root as a hyperedge string.
    pub fn to_hyperedge_str(&self, with_namespaces: bool) -> Result<String, TreeError> {
        let root = self.root_id().ok_or(TreeError::NoRoot)?;
        self.render(root, with_namespaces)
    }

    /// Renders the structure reachable from `id`.
    ///
    /// Elements never attached to anything are not reachable and are left out.
    pub fn render(&self, id: ElementId, with_namespaces: bool) -> Result<String, TreeError> {
        let mut out = String::new();
        let mut stack = vec![Step::Content(&self.get(id)?.content)];

        while let Some(step) = stack.pop() {
            match step {
                Step::Text(text) => out.push_str(text),
                Step::Content(Content::Leaf(leaf)) => push_atom(&mut out, leaf, with_namespaces),
                Step::Content(Content::Ref(target)) => {
                    stack.push(Step::Content(&self.get(*target)?.content));
                }
                Step::Content(Content::Edge(items)) => {
                    out.push('(');
                    stack.push(Step::Text(")"));
                    for (i, item) in items.iter().enumerate().rev() {
                        stack.push(Step::Content(item));
                        if i > 0 {
                            stack.push(Step::Text(" "));
                        }
                    }
                }
            }
        }

        Ok(out)
    }
}

fn push_atom(out: &mut String, leaf: &Leaf, with_namespaces: bool) {
    for c in leaf.text.chars().flat_map(char::to_lowercase) {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '(' => out.push_str("%28"),
            ')' => out.push_str("%29"),
            '/' => out.push_str("%2f"),
            c => out.push(c),
        }
    }
    if with_namespaces && !leaf.tag.is_empty() {
        out.push('/');
        out.push_str(&leaf.tag.to_lowercase());
    }
}
