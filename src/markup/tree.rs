//! Arena-backed markup tree
//!
//! Nodes live in a single `Vec` and are addressed by [`NodeId`]. Removing a
//! node only unlinks it from its parent; the slot stays in the arena, so ids
//! held by a traversal never dangle.

/// Elements that never have children or a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose body is raw text rather than markup
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Check whether a tag name is a void element
pub fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

/// Check whether a tag name holds raw text
pub fn is_raw_text(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

/// Index of a node inside a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A single attribute on an element
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
    /// The value holds JSON text produced by a bound attribute
    pub encoded: bool,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            encoded: false,
        }
    }
}

/// An element's tag name and attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<Attribute>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
        }
    }

    /// Case-insensitive tag comparison
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Set a plain attribute, replacing any existing value
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        self.put(name, value.into(), false);
    }

    /// Set an attribute whose value is JSON text
    pub fn set_encoded_attr(&mut self, name: &str, json: impl Into<String>) {
        self.put(name, json.into(), true);
    }

    fn put(&mut self, name: &str, value: String, encoded: bool) {
        match self
            .attrs
            .iter_mut()
            .find(|a| a.name.eq_ignore_ascii_case(name))
        {
            Some(existing) => {
                existing.value = value;
                existing.encoded = encoded;
            }
            None => self.attrs.push(Attribute {
                name: name.to_string(),
                value,
                encoded,
            }),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<Attribute> {
        let index = self
            .attrs
            .iter()
            .position(|a| a.name.eq_ignore_ascii_case(name))?;
        Some(self.attrs.remove(index))
    }
}

/// Payload of a node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    /// A container with no markup of its own (the document root, or a holder
    /// for nodes that are about to be spliced somewhere)
    Fragment,
    Element(Element),
    /// Text exactly as it appears in markup (entities are not decoded)
    Text(String),
    Comment(String),
    /// The full `<!...>` declaration
    Doctype(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A mutable markup tree
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document holding only its root fragment
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Fragment,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn text_mut(&mut self, id: NodeId) -> Option<&mut String> {
        match &mut self.nodes[id.0].data {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Tag name of an element node
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.name.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    pub fn create_element(&mut self, element: Element) -> NodeId {
        self.push(NodeData::Element(element))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Comment(text.into()))
    }

    pub fn create_doctype(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Doctype(text.into()))
    }

    pub fn create_fragment(&mut self) -> NodeId {
        self.push(NodeData::Fragment)
    }

    /// Unlink a node from its parent. The node keeps its own subtree.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    /// Append `child` as the last child of `parent`, moving it if attached elsewhere
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Insert `child` as the first child of `parent`
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[parent.0].children.insert(0, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Insert `node` immediately before `reference`. No-op when `reference`
    /// has no parent.
    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) {
        if reference == node {
            return;
        }
        self.detach(node);
        let Some(parent) = self.nodes[reference.0].parent else {
            return;
        };
        let siblings = &mut self.nodes[parent.0].children;
        let index = siblings
            .iter()
            .position(|&c| c == reference)
            .unwrap_or(siblings.len());
        siblings.insert(index, node);
        self.nodes[node.0].parent = Some(parent);
    }

    /// Put `replacements` where `id` was, in order, then detach `id`
    pub fn replace_with(&mut self, id: NodeId, replacements: &[NodeId]) {
        for &node in replacements {
            self.insert_before(id, node);
        }
        self.detach(id);
    }

    /// Deep-copy a subtree. The copy is detached.
    pub fn clone_subtree(&mut self, id: NodeId) -> NodeId {
        let data = self.nodes[id.0].data.clone();
        let copy = self.push(data);
        let children = self.nodes[id.0].children.clone();
        for child in children {
            let child_copy = self.clone_subtree(child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    /// Deep-copy a subtree from another document into this one. The copy is
    /// detached.
    pub fn adopt(&mut self, other: &Document, id: NodeId) -> NodeId {
        let copy = self.push(other.data(id).clone());
        for &child in other.children(id) {
            let child_copy = self.adopt(other, child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    /// Preorder list of every node below `id`
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Whether `id` sits somewhere below `ancestor`
    pub fn is_within(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// All descendant elements of `id` with the given tag, in document order
    pub fn find_elements(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&n| self.element(n).is_some_and(|el| el.is(name)))
            .collect()
    }

    pub fn find_element(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.descendants(id)
            .into_iter()
            .find(|&n| self.element(n).is_some_and(|el| el.is(name)))
    }

    /// Concatenated text below `id`
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in std::iter::once(id).chain(self.descendants(id)) {
            if let NodeData::Text(text) = self.data(node) {
                out.push_str(text);
            }
        }
        out
    }
}
