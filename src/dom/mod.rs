//! Arena-backed mutable HTML tree.
//!
//! Pages are parsed once into a [`Document`], rewritten in place and then
//! re-serialized fragment by fragment. Nodes live in a single `Vec` and are
//! addressed by [`NodeId`]. Each node records its parent as a plain index;
//! ownership runs strictly top-down through each element's `children` list,
//! so structural edits always go through the owning parent.
//!
//! Detached nodes stay in the arena but are no longer reachable from the
//! root, which is what "removed" means for the rest of the crate.

pub mod parse;
pub mod serialize;

/// Index of a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The synthetic document root (always 0).
    pub const ROOT: NodeId = NodeId(0);
}

/// Payload of a tree node.
#[derive(Debug, Clone)]
pub enum NodeData {
    /// Synthetic root holding the top-level `<html>` element.
    Document,
    /// Tagged element with attributes.
    Element(Element),
    /// Literal character data.
    Text(String),
}

/// An element's tag name and ordered attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercase local tag name.
    pub name: String,
    /// Attributes; new ones are appended, existing ones keep their slot.
    pub attrs: Vec<(String, String)>,
}

impl Element {
    pub fn new(name: &str, attrs: Vec<(String, String)>) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attrs,
        }
    }

    /// Whether the tag name matches `tag`.
    pub fn is(&self, tag: &str) -> bool {
        self.name.eq_ignore_ascii_case(tag)
    }

    /// Look up an attribute value; `None` when the attribute is absent.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    /// Remove an attribute, returning its old value.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|(k, _)| k == name)?;
        Some(self.attrs.remove(pos).1)
    }

    /// Whitespace-separated class tokens.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }
}

/// A node in the arena.
#[derive(Debug, Clone)]
pub struct Node {
    pub data: NodeData,
    /// Non-owning back-reference; `None` for the root and detached nodes.
    pub parent: Option<NodeId>,
    /// Owned children in document order.
    pub children: Vec<NodeId>,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// Mutable HTML document.
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
    /// Create an empty document holding only the root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeData::Document)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(data));
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn create_element(&mut self, name: &str, attrs: Vec<(String, String)>) -> NodeId {
        self.alloc(NodeData::Element(Element::new(name, attrs)))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Text(text.into()))
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.get(id)?.data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(id.0)?.data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.get(id)?.data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Tag name of an element node.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.name.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or_default()
    }

    /// Direct children that are elements.
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.element(c).is_some())
    }

    /// Whether the node is still reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut cursor = id;
        loop {
            if cursor == NodeId::ROOT {
                return true;
            }
            match self.parent(cursor) {
                Some(p) => cursor = p,
                None => return false,
            }
        }
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        if parent.0 >= self.nodes.len() || child.0 >= self.nodes.len() || parent == child {
            return;
        }
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Unlink a node (and with it, its subtree) from its parent.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        self.nodes[parent.0].children.retain(|&c| c != id);
        self.nodes[id.0].parent = None;
    }

    /// Put `new` at the position `old` occupies; `old` ends up detached.
    ///
    /// Returns `false` when `old` has no parent.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> bool {
        if old == new || new.0 >= self.nodes.len() {
            return false;
        }
        let Some(parent) = self.parent(old) else {
            return false;
        };
        self.detach(new);
        let siblings = &mut self.nodes[parent.0].children;
        let Some(pos) = siblings.iter().position(|&c| c == old) else {
            return false;
        };
        siblings[pos] = new;
        self.nodes[old.0].parent = None;
        self.nodes[new.0].parent = Some(parent);
        true
    }

    /// Detach every child of `id`.
    pub fn clear_children(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(id.0) else {
            return;
        };
        let children = std::mem::take(&mut node.children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    /// All descendants of `id` in document (pre-)order, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// First descendant element matching `predicate`, in document order.
    pub fn find_descendant<F>(&self, id: NodeId, predicate: F) -> Option<NodeId>
    where
        F: Fn(&Element) -> bool,
    {
        self.descendants(id)
            .into_iter()
            .find(|&d| self.element(d).is_some_and(&predicate))
    }

    /// Every descendant element matching `predicate`, in document order.
    pub fn find_all<F>(&self, id: NodeId, predicate: F) -> Vec<NodeId>
    where
        F: Fn(&Element) -> bool,
    {
        self.descendants(id)
            .into_iter()
            .filter(|&d| self.element(d).is_some_and(&predicate))
            .collect()
    }

    /// Element siblings that come after `id` in its parent.
    pub fn following_element_siblings(&self, id: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.parent(id) else {
            return Vec::new();
        };
        self.children(parent)
            .iter()
            .copied()
            .skip_while(|&c| c != id)
            .skip(1)
            .filter(|&c| self.element(c).is_some())
            .collect()
    }

    /// Concatenated text of the whole subtree.
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(t) = self.text(id) {
            return t.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|d| self.text(d))
            .collect()
    }

    /// Concatenated text of direct Text children only.
    pub fn direct_text(&self, id: NodeId) -> String {
        self.children(id)
            .iter()
            .filter_map(|&c| self.text(c))
            .collect()
    }
}
