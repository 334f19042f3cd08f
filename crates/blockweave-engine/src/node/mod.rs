//! # Structural node tree
//!
//! The document's source of truth: an immutable, reference-counted tree.
//! Edits never mutate a node; they rebuild the path from the root to the
//! changed node and share every untouched subtree. Node identity
//! ([`NodeKey`]) therefore survives edits elsewhere in the document, which is
//! what the block cache keys on.
//!
//! Shape: `doc > blockGroup > blockContainer+`, where each `blockContainer`
//! holds a block-content node and optionally a nested `blockGroup`.

pub mod tree;

use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use crate::schema::PropValue;

pub const DOC: &str = "doc";
pub const BLOCK_GROUP: &str = "blockGroup";
pub const BLOCK_CONTAINER: &str = "blockContainer";
pub const TEXT: &str = "text";
pub const TABLE_ROW: &str = "tableRow";
pub const TABLE_CELL: &str = "tableCell";
pub const LINK_MARK: &str = "link";

/// Names no block or style spec may use.
pub const RESERVED_NAMES: &[&str] = &[
    DOC,
    BLOCK_GROUP,
    BLOCK_CONTAINER,
    TEXT,
    TABLE_ROW,
    TABLE_CELL,
    LINK_MARK,
];

/// Attribute storage on nodes and marks.
pub type Attrs = BTreeMap<String, PropValue>;

/// An inline mark on a text node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mark {
    pub mark_type: String,
    pub attrs: Attrs,
}

impl Mark {
    pub fn new(mark_type: impl Into<String>) -> Self {
        Self {
            mark_type: mark_type.into(),
            attrs: Attrs::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&PropValue> {
        self.attrs.get(name)
    }
}

#[derive(Debug)]
struct NodeData {
    type_name: String,
    attrs: Attrs,
    content: Vec<Node>,
    text: Option<String>,
    marks: Vec<Mark>,
}

/// A shared handle to an immutable node.
#[derive(Debug, Clone)]
pub struct Node(Rc<NodeData>);

/// Identity of a live node. Only meaningful while the node is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(usize);

/// A non-owning handle, used by caches that must not extend node lifetime.
#[derive(Debug, Clone)]
pub struct WeakNode(Weak<NodeData>);

impl WeakNode {
    pub fn upgrade(&self) -> Option<Node> {
        self.0.upgrade().map(Node)
    }

    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl Node {
    pub fn new(type_name: impl Into<String>, attrs: Attrs, content: Vec<Node>) -> Self {
        Node(Rc::new(NodeData {
            type_name: type_name.into(),
            attrs,
            content,
            text: None,
            marks: Vec::new(),
        }))
    }

    pub fn text(text: impl Into<String>, marks: Vec<Mark>) -> Self {
        Node(Rc::new(NodeData {
            type_name: TEXT.to_string(),
            attrs: Attrs::new(),
            content: Vec::new(),
            text: Some(text.into()),
            marks,
        }))
    }

    pub fn type_name(&self) -> &str {
        &self.0.type_name
    }

    pub fn attrs(&self) -> &Attrs {
        &self.0.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&PropValue> {
        self.0.attrs.get(name)
    }

    pub fn content(&self) -> &[Node] {
        &self.0.content
    }

    pub fn child_count(&self) -> usize {
        self.0.content.len()
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.0.content.get(index)
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.0.content.first()
    }

    pub fn last_child(&self) -> Option<&Node> {
        self.0.content.last()
    }

    pub fn is_text(&self) -> bool {
        self.0.text.is_some()
    }

    pub fn text_value(&self) -> Option<&str> {
        self.0.text.as_deref()
    }

    /// Own text for text nodes, concatenated descendant text otherwise.
    pub fn text_content(&self) -> String {
        match &self.0.text {
            Some(text) => text.clone(),
            None => self.0.content.iter().map(Node::text_content).collect(),
        }
    }

    pub fn marks(&self) -> &[Mark] {
        &self.0.marks
    }

    pub fn key(&self) -> NodeKey {
        NodeKey(Rc::as_ptr(&self.0) as usize)
    }

    pub fn downgrade(&self) -> WeakNode {
        WeakNode(Rc::downgrade(&self.0))
    }

    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// A copy of this node with different children.
    pub fn with_content(&self, content: Vec<Node>) -> Node {
        Node(Rc::new(NodeData {
            type_name: self.0.type_name.clone(),
            attrs: self.0.attrs.clone(),
            content,
            text: self.0.text.clone(),
            marks: self.0.marks.clone(),
        }))
    }

    /// A copy of a text node with different marks.
    pub fn with_marks(&self, marks: Vec<Mark>) -> Node {
        Node(Rc::new(NodeData {
            type_name: self.0.type_name.clone(),
            attrs: self.0.attrs.clone(),
            content: self.0.content.clone(),
            text: self.0.text.clone(),
            marks,
        }))
    }

    /// A copy of a text node holding `text` with the same marks.
    pub fn with_text(&self, text: impl Into<String>) -> Node {
        Node::text(text, self.0.marks.clone())
    }

    pub fn has_mark(&self, mark_type: &str) -> bool {
        self.0.marks.iter().any(|m| m.mark_type == mark_type)
    }

    /// Whether this is a text node whose marks equal `other`'s.
    pub fn same_markup(&self, other: &Node) -> bool {
        self.is_text() && other.is_text() && self.0.marks == other.0.marks
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.0.type_name == other.0.type_name
                && self.0.attrs == other.0.attrs
                && self.0.text == other.0.text
                && self.0.marks == other.0.marks
                && self.0.content == other.0.content)
    }
}

impl Eq for Node {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_content_keeps_unchanged_children_shared() {
        let a = Node::text("a", vec![]);
        let b = Node::text("b", vec![]);
        let parent = Node::new("paragraph", Attrs::new(), vec![a.clone(), b]);

        let rebuilt = parent.with_content(vec![a.clone(), Node::text("c", vec![])]);
        assert!(rebuilt.child(0).unwrap().ptr_eq(&a));
        assert_ne!(rebuilt.key(), parent.key());
        assert_eq!(rebuilt.text_content(), "ac");
    }

    #[test]
    fn test_weak_handle_does_not_keep_node_alive() {
        let node = Node::text("gone", vec![]);
        let weak = node.downgrade();
        assert!(weak.is_alive());
        drop(node);
        assert!(!weak.is_alive());
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_structural_equality() {
        let bold = Mark::new("bold");
        let x = Node::text("x", vec![bold.clone()]);
        let y = Node::text("x", vec![bold]);
        assert_eq!(x, y);
        assert!(x.same_markup(&y));
        assert!(!x.ptr_eq(&y));
    }
}
