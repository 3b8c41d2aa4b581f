//! # Tree Nodes
//!
//! The node is a struct carrying identity (`id`, `name`) plus a [`NodeKind`]
//! payload. `NodeKind` is the discriminant: consumers match on it
//! exhaustively instead of testing for a `children` field.
//!
//! ## Serialized form
//!
//! ```text
//! { "id": "…", "name": "a", "type": "object", "children": [ … ] }
//! { "id": "…", "name": "b", "type": "data", "value": 1 }
//! ```
//!
//! `name` is omitted when absent. An absent name and `""` are different
//! values and survive a serde round trip as such.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::borrow::Borrow;
use std::fmt;

/// Opaque node identifier
///
/// Generated once at construction and never derived from content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Fresh globally unique identifier (UUID v4)
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Primitive stored in a `Data` node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

impl DataValue {
    /// Convert a JSON primitive. Arrays and objects yield `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(DataValue::Null),
            Value::Bool(b) => Some(DataValue::Bool(*b)),
            Value::Number(n) => Some(DataValue::Number(n.clone())),
            Value::String(s) => Some(DataValue::String(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            DataValue::Null => Value::Null,
            DataValue::Bool(b) => Value::Bool(*b),
            DataValue::Number(n) => Value::Number(n.clone()),
            DataValue::String(s) => Value::String(s.clone()),
        }
    }
}

impl From<bool> for DataValue {
    fn from(b: bool) -> Self {
        DataValue::Bool(b)
    }
}

impl From<i64> for DataValue {
    fn from(n: i64) -> Self {
        DataValue::Number(n.into())
    }
}

impl From<u64> for DataValue {
    fn from(n: u64) -> Self {
        DataValue::Number(n.into())
    }
}

impl From<i32> for DataValue {
    fn from(n: i32) -> Self {
        DataValue::Number(n.into())
    }
}

impl From<Number> for DataValue {
    fn from(n: Number) -> Self {
        DataValue::Number(n)
    }
}

impl From<&str> for DataValue {
    fn from(s: &str) -> Self {
        DataValue::String(s.to_string())
    }
}

impl From<String> for DataValue {
    fn from(s: String) -> Self {
        DataValue::String(s)
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// Variant payload of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeKind {
    /// Top of the tree, exactly one per document
    Root {
        children: Vec<Node>,

        #[serde(default, skip_serializing_if = "RootLayout::is_object")]
        layout: RootLayout,
    },

    /// Named members, folded into a JSON object on export
    Object { children: Vec<Node> },

    /// Positional members, names ignored on export
    List { children: Vec<Node> },

    /// Leaf holding a primitive
    Data { value: DataValue },
}

/// JSON container a `Root` exports as
///
/// Documents whose top-level value is an array keep their children
/// positional; every other root folds its children into an object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootLayout {
    #[default]
    Object,
    Array,
}

impl RootLayout {
    pub fn is_object(&self) -> bool {
        matches!(self, RootLayout::Object)
    }
}

/// Payload-free discriminant of [`NodeKind`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Root,
    Object,
    List,
    Data,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeType::Root => "root",
            NodeType::Object => "object",
            NodeType::List => "list",
            NodeType::Data => "data",
        };
        f.write_str(s)
    }
}

/// Tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Fresh id when absent from serialized input
    #[serde(default = "NodeId::generate")]
    pub id: NodeId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(flatten)]
    pub kind: NodeKind,
}

impl Node {
    /// Create a node with a fresh id and no name
    pub fn new(kind: NodeKind) -> Self {
        Self {
            id: NodeId::generate(),
            name: None,
            kind,
        }
    }

    pub fn root(children: Vec<Node>) -> Self {
        Self::new(NodeKind::Root {
            children,
            layout: RootLayout::Object,
        })
    }

    /// Root of a document whose top-level value is an array
    pub fn root_array(children: Vec<Node>) -> Self {
        Self::new(NodeKind::Root {
            children,
            layout: RootLayout::Array,
        })
    }

    pub fn object(children: Vec<Node>) -> Self {
        Self::new(NodeKind::Object { children })
    }

    pub fn list(children: Vec<Node>) -> Self {
        Self::new(NodeKind::List { children })
    }

    pub fn data(value: impl Into<DataValue>) -> Self {
        Self::new(NodeKind::Data {
            value: value.into(),
        })
    }

    /// Default child synthesized by "add child": `Data` named `new` holding `""`
    pub fn placeholder() -> Self {
        Self::data("").named("new")
    }

    /// Builder-style name assignment
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builder-style id override (fixtures, deserialized trees)
    pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn node_type(&self) -> NodeType {
        match self.kind {
            NodeKind::Root { .. } => NodeType::Root,
            NodeKind::Object { .. } => NodeType::Object,
            NodeKind::List { .. } => NodeType::List,
            NodeKind::Data { .. } => NodeType::Data,
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self.kind, NodeKind::Root { .. })
    }

    /// Whether this node has a children slot (it may be empty)
    pub fn has_children(&self) -> bool {
        self.children().is_some()
    }

    pub fn children(&self) -> Option<&[Node]> {
        match &self.kind {
            NodeKind::Root { children, .. }
            | NodeKind::Object { children }
            | NodeKind::List { children } => Some(children),
            NodeKind::Data { .. } => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match &mut self.kind {
            NodeKind::Root { children, .. }
            | NodeKind::Object { children }
            | NodeKind::List { children } => Some(children),
            NodeKind::Data { .. } => None,
        }
    }

    pub fn value(&self) -> Option<&DataValue> {
        match &self.kind {
            NodeKind::Data { value } => Some(value),
            NodeKind::Root { .. } | NodeKind::Object { .. } | NodeKind::List { .. } => None,
        }
    }

    /// Pre-order traversal including `self`
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }

    /// Ids of this node and all descendants, pre-order
    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.iter().map(|n| &n.id)
    }

    pub fn find(&self, id: &str) -> Option<&Node> {
        self.iter().find(|n| n.id.as_str() == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Node> {
        let path = self.path_to(id)?;
        self.at_path_mut(&path)
    }

    /// Child positions leading from this node to `id`, empty for `self`
    pub fn path_to(&self, id: &str) -> Option<Vec<usize>> {
        let mut stack = vec![(self, Vec::new())];
        while let Some((node, path)) = stack.pop() {
            if node.id.as_str() == id {
                return Some(path);
            }
            for (index, child) in node.children().unwrap_or_default().iter().enumerate().rev() {
                let mut child_path = path.clone();
                child_path.push(index);
                stack.push((child, child_path));
            }
        }
        None
    }

    pub fn at_path_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        path.iter()
            .try_fold(self, |node, &index| node.children_mut()?.get_mut(index))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Container directly holding the node with `id`
    pub fn parent_of(&self, id: &str) -> Option<&Node> {
        self.iter().find(|n| {
            n.children()
                .map(|children| children.iter().any(|c| c.id.as_str() == id))
                .unwrap_or(false)
        })
    }

    /// Resolve a slash-separated path of child names (list positions for
    /// arrays) starting at this node. `/` alone is this node.
    ///
    /// When siblings share a name the last one wins, matching export.
    pub fn resolve_path(&self, path: &str) -> Option<&Node> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |node, segment| node.child_at(segment))
    }

    fn child_at(&self, segment: &str) -> Option<&Node> {
        match &self.kind {
            NodeKind::Root {
                children,
                layout: RootLayout::Array,
            }
            | NodeKind::List { children } => children.get(segment.parse::<usize>().ok()?),
            NodeKind::Root {
                children,
                layout: RootLayout::Object,
            }
            | NodeKind::Object { children } => children
                .iter()
                .rev()
                .find(|c| c.name.as_deref() == Some(segment)),
            NodeKind::Data { .. } => None,
        }
    }

    /// Number of nodes in this subtree
    pub fn size(&self) -> usize {
        self.iter().count()
    }
}

/// Pre-order iterator over a subtree
pub struct Iter<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        if let Some(children) = node.children() {
            self.stack.extend(children.iter().rev());
        }
        Some(node)
    }
}
