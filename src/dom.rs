//! Owned XML tree with a text/tail layout.
//!
//! Every element stores the text between its start tag and first child
//! (`text`); every node stores the text between its end and the next
//! sibling (`tail`). The tree is an arena addressed by [`NodeId`], so
//! mutation never requires interior mutability and positions referring
//! to nodes stay valid across structural edits.

pub(crate) type NodeId = usize;

#[derive(Debug, Clone)]
pub(crate) struct Attribute {
    pub(crate) name: String,
    pub(crate) value: String,
}

#[derive(Debug)]
pub(crate) enum NodeKind {
    Element {
        name: String,
        attributes: Vec<Attribute>,
        /// Text between the start tag and the first child.
        text: String,
        children: Vec<NodeId>,
    },
    Comment(String),
}

#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    /// Text between this node's end and the next sibling.
    pub(crate) tail: String,
    pub(crate) kind: NodeKind,
}

#[derive(Debug, Default)]
pub(crate) struct Document {
    nodes: Vec<Node>,
    pub(crate) root: Option<NodeId>,
    /// Raw prolog lines (`<?xml …?>`, `<!DOCTYPE …>`) replayed on output.
    pub(crate) prolog: Vec<String>,
}

/// The name of a node without its namespace prefix.
pub(crate) fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

impl Document {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn new_element(&mut self, name: impl Into<String>) -> NodeId {
        self.push_node(NodeKind::Element {
            name: name.into(),
            attributes: Vec::new(),
            text: String::new(),
            children: Vec::new(),
        })
    }

    pub(crate) fn new_comment(&mut self, content: impl Into<String>) -> NodeId {
        self.push_node(NodeKind::Comment(content.into()))
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            parent: None,
            tail: String::new(),
            kind,
        });
        id
    }

    ////////////////////////////////////////////////////////////////////////////////
    // Accessors
    ////////////////////////////////////////////////////////////////////////////////

    pub(crate) fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id].kind, NodeKind::Element { .. })
    }

    /// The raw tag name, including any namespace prefix.
    pub(crate) fn name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id].kind {
            NodeKind::Element { name, .. } => Some(name),
            NodeKind::Comment(_) => None,
        }
    }

    /// Compares the prefix-stripped tag name, ASCII case-insensitively.
    pub(crate) fn tag_is(&self, id: NodeId, tag: &str) -> bool {
        self.name(id)
            .is_some_and(|name| local_name(name).eq_ignore_ascii_case(tag))
    }

    /// The content of a comment node.
    pub(crate) fn comment(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id].kind {
            NodeKind::Comment(content) => Some(content),
            NodeKind::Element { .. } => None,
        }
    }

    pub(crate) fn attributes(&self, id: NodeId) -> &[Attribute] {
        match &self.nodes[id].kind {
            NodeKind::Element { attributes, .. } => attributes,
            NodeKind::Comment(_) => &[],
        }
    }

    pub(crate) fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|attribute| attribute.name == name)
            .map(|attribute| attribute.value.as_str())
    }

    pub(crate) fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let NodeKind::Element { attributes, .. } = &mut self.nodes[id].kind {
            let value = value.into();
            match attributes.iter_mut().find(|attribute| attribute.name == name) {
                Some(attribute) => attribute.value = value,
                None => attributes.push(Attribute {
                    name: name.to_owned(),
                    value,
                }),
            }
        }
    }

    pub(crate) fn text(&self, id: NodeId) -> &str {
        match &self.nodes[id].kind {
            NodeKind::Element { text, .. } => text,
            NodeKind::Comment(_) => "",
        }
    }

    pub(crate) fn set_text(&mut self, id: NodeId, value: impl Into<String>) {
        if let NodeKind::Element { text, .. } = &mut self.nodes[id].kind {
            *text = value.into();
        }
    }

    pub(crate) fn push_text(&mut self, id: NodeId, value: &str) {
        if let NodeKind::Element { text, .. } = &mut self.nodes[id].kind {
            text.push_str(value);
        }
    }

    pub(crate) fn tail(&self, id: NodeId) -> &str {
        &self.nodes[id].tail
    }

    pub(crate) fn set_tail(&mut self, id: NodeId, value: impl Into<String>) {
        self.nodes[id].tail = value.into();
    }

    pub(crate) fn push_tail(&mut self, id: NodeId, value: &str) {
        self.nodes[id].tail.push_str(value);
    }

    pub(crate) fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.nodes[id].kind {
            NodeKind::Element { children, .. } => children,
            NodeKind::Comment(_) => &[],
        }
    }

    pub(crate) fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    ////////////////////////////////////////////////////////////////////////////////
    // Traversal
    ////////////////////////////////////////////////////////////////////////////////

    /// All element nodes of the subtree rooted at `id`, in pre-order,
    /// including `id` itself. Comments are skipped.
    pub(crate) fn elements(&self, id: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![id];

        while let Some(current) = stack.pop() {
            if !self.is_element(current) {
                continue;
            }
            found.push(current);
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
        }
        found
    }

    /// The first descendant element of `id` (excluding `id`) whose
    /// prefix-stripped name matches `tag`, in pre-order.
    pub(crate) fn find_descendant(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.elements(id)
            .into_iter()
            .skip(1)
            .find(|&e| self.tag_is(e, tag))
    }

    /// The first direct child element of `id` matching `tag`.
    pub(crate) fn find_child(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&child| self.tag_is(child, tag))
    }

    /// Concatenated text of the whole subtree, in document order.
    /// Tail text of the subtree root is not included.
    pub(crate) fn subtree_text(&self, id: NodeId) -> String {
        fn collect(doc: &Document, id: NodeId, out: &mut String) {
            out.push_str(doc.text(id));
            for &child in doc.children(id) {
                collect(doc, child, out);
                out.push_str(doc.tail(child));
            }
        }

        let mut out = String::new();
        collect(self, id, &mut out);
        out
    }

    ////////////////////////////////////////////////////////////////////////////////
    // Mutation
    ////////////////////////////////////////////////////////////////////////////////

    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child].parent = Some(parent);
        if let NodeKind::Element { children, .. } = &mut self.nodes[parent].kind {
            children.push(child);
        }
    }

    pub(crate) fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.nodes[child].parent = Some(parent);
        if let NodeKind::Element { children, .. } = &mut self.nodes[parent].kind {
            let index = index.min(children.len());
            children.insert(index, child);
        }
    }

    /// Inserts `new` as the next sibling of `target`.
    /// Returns `false` when `target` has no parent.
    pub(crate) fn insert_after(&mut self, target: NodeId, new: NodeId) -> bool {
        let Some(parent) = self.parent(target) else {
            return false;
        };
        let Some(position) = self
            .children(parent)
            .iter()
            .position(|&child| child == target)
        else {
            return false;
        };
        self.insert_child(parent, position + 1, new);
        true
    }

    /// Detaches `id` from its parent, leaving it orphaned in the arena.
    pub(crate) fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id].parent.take() else {
            return;
        };
        if let NodeKind::Element { children, .. } = &mut self.nodes[parent].kind {
            children.retain(|&child| child != id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let root = doc.new_element("body");
        let p = doc.new_element("p");
        let em = doc.new_element("em");

        doc.root = Some(root);
        doc.set_text(root, "a");
        doc.append_child(root, p);
        doc.set_text(p, "b");
        doc.set_tail(p, "c");
        doc.append_child(p, em);
        doc.set_text(em, "d");
        doc.set_tail(em, "e");

        (doc, root, p, em)
    }

    #[test]
    fn test_subtree_text() {
        let (doc, root, p, em) = sample();

        assert_eq!("abdec", doc.subtree_text(root));
        assert_eq!("bde", doc.subtree_text(p));
        assert_eq!("d", doc.subtree_text(em));
    }

    #[test]
    fn test_traversal() {
        let (doc, root, p, em) = sample();

        assert_eq!(vec![root, p, em], doc.elements(root));
        assert_eq!(Some(em), doc.find_descendant(root, "em"));
        assert_eq!(None, doc.find_descendant(root, "div"));
        assert_eq!(Some(p), doc.find_child(root, "p"));
        assert!(doc.tag_is(p, "P"));
    }

    #[test]
    fn test_insert_after() {
        let (mut doc, root, p, em) = sample();

        let span = doc.new_element("span");
        assert!(doc.insert_after(em, span));
        assert_eq!(&[em, span], doc.children(p));
        assert!(!doc.insert_after(root, span));
    }

    #[test]
    fn test_detach() {
        let (mut doc, root, p, _) = sample();

        doc.detach(p);
        assert!(doc.children(root).is_empty());
        assert_eq!(None, doc.parent(p));
    }

    #[test]
    fn test_attributes() {
        let (mut doc, root, ..) = sample();

        assert_eq!(None, doc.attr(root, "id"));
        doc.set_attr(root, "id", "main");
        assert_eq!(Some("main"), doc.attr(root, "id"));
        doc.set_attr(root, "id", "other");
        assert_eq!(Some("other"), doc.attr(root, "id"));
        assert_eq!(1, doc.attributes(root).len());
    }

    #[test]
    fn test_local_name() {
        assert_eq!("type", local_name("epub:type"));
        assert_eq!("nav", local_name("nav"));
    }
}
