//! # JSON ⇄ Tree Conversion
//!
//! `from_json` classifies every value: arrays become `List`, objects become
//! `Object` (`Root` at the top), primitives become `Data`. Object keys become
//! child names in the order they were encountered.
//!
//! `to_json` folds `Root`/`Object` children back into an object keyed by
//! name. When two children share a name the later one overwrites the
//! earlier one's value, keeping the key where it first appeared.
//!
//! Both directions walk with an explicit stack, so nesting depth is bounded
//! by memory rather than by the call stack.
//!
//! ## Cycles
//!
//! `serde_json::Value` cannot be cyclic, but [`SharedValue`] can: its
//! containers are reference counted so embedders can build graphs where an
//! object is reachable from itself. Conversion tracks the containers on the
//! active path and fails with [`ConvertError::CircularReference`] on
//! re-entry. A container shared by two siblings is not a cycle and is
//! converted twice.

use jsontree_model::{DataValue, Node, NodeId, NodeKind, RootLayout};
use serde_json::{Map, Number, Value};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::{slice, vec};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    #[error("Input is not a valid JSON object")]
    InvalidInput,

    #[error("Circular reference detected")]
    CircularReference,

    #[error("Node name cannot be an empty string (node {0})")]
    InvalidName(NodeId),
}

/// One level of a JSON value as seen by the converter
pub enum JsonShape<C> {
    Scalar(DataValue),
    Array(Vec<C>),
    Object(Vec<(String, C)>),
}

/// Source of JSON values the converter can walk
pub trait JsonInput {
    /// Handle to a member of this value
    type Child: JsonInput<Child = Self::Child>;

    /// Identity of a container, `None` for primitives
    fn container_key(&self) -> Option<usize>;

    fn shape(&self) -> JsonShape<Self::Child>;
}

impl<'a> JsonInput for &'a Value {
    type Child = &'a Value;

    fn container_key(&self) -> Option<usize> {
        match *self {
            Value::Array(items) => Some(items as *const Vec<Value> as usize),
            Value::Object(map) => Some(map as *const Map<String, Value> as usize),
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => None,
        }
    }

    fn shape(&self) -> JsonShape<&'a Value> {
        match *self {
            Value::Null => JsonShape::Scalar(DataValue::Null),
            Value::Bool(b) => JsonShape::Scalar(DataValue::Bool(*b)),
            Value::Number(n) => JsonShape::Scalar(DataValue::Number(n.clone())),
            Value::String(s) => JsonShape::Scalar(DataValue::String(s.clone())),
            Value::Array(items) => JsonShape::Array(items.iter().collect()),
            Value::Object(map) => {
                JsonShape::Object(map.iter().map(|(k, v)| (k.clone(), v)).collect())
            }
        }
    }
}

/// Reference-counted JSON graph
///
/// Containers are shared handles: cloning a `SharedValue` array or object
/// aliases it, so a value can be inserted into itself.
#[derive(Debug, Clone)]
pub enum SharedValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Rc<RefCell<Vec<SharedValue>>>),
    Object(Rc<RefCell<Vec<(String, SharedValue)>>>),
}

impl SharedValue {
    pub fn array() -> Self {
        SharedValue::Array(Rc::new(RefCell::new(Vec::new())))
    }

    pub fn object() -> Self {
        SharedValue::Object(Rc::new(RefCell::new(Vec::new())))
    }

    /// Append to an array. No effect on other values.
    pub fn push(&self, value: SharedValue) {
        if let SharedValue::Array(items) = self {
            items.borrow_mut().push(value);
        }
    }

    /// Set a key on an object, replacing an existing entry in place.
    /// No effect on other values.
    pub fn insert(&self, key: impl Into<String>, value: SharedValue) {
        if let SharedValue::Object(entries) = self {
            let key = key.into();
            let mut entries = entries.borrow_mut();
            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some(entry) => entry.1 = value,
                None => entries.push((key, value)),
            }
        }
    }
}

impl From<&Value> for SharedValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => SharedValue::Null,
            Value::Bool(b) => SharedValue::Bool(*b),
            Value::Number(n) => SharedValue::Number(n.clone()),
            Value::String(s) => SharedValue::String(s.clone()),
            Value::Array(items) => SharedValue::Array(Rc::new(RefCell::new(
                items.iter().map(SharedValue::from).collect(),
            ))),
            Value::Object(map) => SharedValue::Object(Rc::new(RefCell::new(
                map.iter()
                    .map(|(k, v)| (k.clone(), SharedValue::from(v)))
                    .collect(),
            ))),
        }
    }
}

impl JsonInput for SharedValue {
    type Child = SharedValue;

    fn container_key(&self) -> Option<usize> {
        match self {
            SharedValue::Array(items) => Some(Rc::as_ptr(items) as *const () as usize),
            SharedValue::Object(entries) => Some(Rc::as_ptr(entries) as *const () as usize),
            SharedValue::Null
            | SharedValue::Bool(_)
            | SharedValue::Number(_)
            | SharedValue::String(_) => None,
        }
    }

    // Members are cloned handles, the borrow ends before the walk descends
    fn shape(&self) -> JsonShape<SharedValue> {
        match self {
            SharedValue::Null => JsonShape::Scalar(DataValue::Null),
            SharedValue::Bool(b) => JsonShape::Scalar(DataValue::Bool(*b)),
            SharedValue::Number(n) => JsonShape::Scalar(DataValue::Number(n.clone())),
            SharedValue::String(s) => JsonShape::Scalar(DataValue::String(s.clone())),
            SharedValue::Array(items) => JsonShape::Array(items.borrow().clone()),
            SharedValue::Object(entries) => JsonShape::Object(entries.borrow().clone()),
        }
    }
}

impl JsonInput for &SharedValue {
    type Child = SharedValue;

    fn container_key(&self) -> Option<usize> {
        (**self).container_key()
    }

    fn shape(&self) -> JsonShape<SharedValue> {
        (**self).shape()
    }
}

#[derive(Clone, Copy)]
enum Container {
    Array,
    Object,
}

/// Container being built: its members still to visit and the nodes done so far
struct ImportFrame<C> {
    key: Option<usize>,
    name: Option<String>,
    top: bool,
    container: Container,
    pending: vec::IntoIter<(Option<String>, C)>,
    children: Vec<Node>,
}

enum Opened<C> {
    Leaf(Node),
    Frame(ImportFrame<C>),
}

impl<C> ImportFrame<C> {
    fn close(self, ancestors: &mut HashSet<usize>) -> Node {
        if let Some(key) = self.key {
            ancestors.remove(&key);
        }

        let children = self.children;
        let kind = match (self.container, self.top) {
            (Container::Array, true) => NodeKind::Root {
                children,
                layout: RootLayout::Array,
            },
            (Container::Object, true) => NodeKind::Root {
                children,
                layout: RootLayout::Object,
            },
            (Container::Array, false) => NodeKind::List { children },
            (Container::Object, false) => NodeKind::Object { children },
        };

        Node {
            id: NodeId::generate(),
            name: self.name,
            kind,
        }
    }
}

fn open<V: JsonInput>(
    value: V,
    name: Option<String>,
    top: bool,
    ancestors: &mut HashSet<usize>,
) -> Result<Opened<V::Child>, ConvertError> {
    let key = value.container_key();
    if let Some(key) = key {
        if !ancestors.insert(key) {
            return Err(ConvertError::CircularReference);
        }
    }

    let (container, pending): (_, Vec<_>) = match value.shape() {
        JsonShape::Scalar(scalar) => {
            return Ok(Opened::Leaf(Node {
                id: NodeId::generate(),
                name,
                kind: NodeKind::Data { value: scalar },
            }))
        }
        JsonShape::Array(items) => (
            Container::Array,
            items.into_iter().map(|item| (None, item)).collect(),
        ),
        JsonShape::Object(entries) => (
            Container::Object,
            entries.into_iter().map(|(k, v)| (Some(k), v)).collect(),
        ),
    };

    Ok(Opened::Frame(ImportFrame {
        key,
        name,
        top,
        container,
        pending: pending.into_iter(),
        children: Vec::new(),
    }))
}

/// Build a tree from a JSON object or array
pub fn from_json<T: JsonInput>(input: T) -> Result<Node, ConvertError> {
    if input.container_key().is_none() {
        return Err(ConvertError::InvalidInput);
    }

    let mut ancestors = HashSet::new();
    let mut current = match open(input, None, true, &mut ancestors)? {
        Opened::Frame(frame) => frame,
        Opened::Leaf(_) => return Err(ConvertError::InvalidInput),
    };
    let mut parents = Vec::new();

    loop {
        match current.pending.next() {
            Some((name, member)) => match open(member, name, false, &mut ancestors)? {
                Opened::Leaf(node) => current.children.push(node),
                Opened::Frame(inner) => parents.push(std::mem::replace(&mut current, inner)),
            },
            None => match parents.pop() {
                Some(parent) => {
                    let done = std::mem::replace(&mut current, parent);
                    current.children.push(done.close(&mut ancestors));
                }
                None => return Ok(current.close(&mut ancestors)),
            },
        }
    }
}

enum Folded {
    Object(Map<String, Value>),
    Array(Vec<Value>),
}

impl Folded {
    fn push(&mut self, key: Option<&str>, value: Value) {
        match self {
            Folded::Object(map) => {
                // Later duplicates overwrite earlier ones
                if let Some(key) = key {
                    map.insert(key.to_string(), value);
                }
            }
            Folded::Array(items) => items.push(value),
        }
    }

    fn into_value(self) -> Value {
        match self {
            Folded::Object(map) => Value::Object(map),
            Folded::Array(items) => Value::Array(items),
        }
    }
}

/// Container being exported, `key` is its name in the parent object
struct ExportFrame<'a> {
    key: Option<&'a str>,
    children: slice::Iter<'a, Node>,
    folded: Folded,
}

enum Exported<'a> {
    Leaf(Value),
    Frame(ExportFrame<'a>),
}

fn export<'a>(node: &'a Node, key: Option<&'a str>) -> Exported<'a> {
    let (children, folded) = match &node.kind {
        NodeKind::Root {
            children,
            layout: RootLayout::Object,
        }
        | NodeKind::Object { children } => (children, Folded::Object(Map::new())),
        NodeKind::Root {
            children,
            layout: RootLayout::Array,
        }
        | NodeKind::List { children } => {
            (children, Folded::Array(Vec::with_capacity(children.len())))
        }
        NodeKind::Data { value } => return Exported::Leaf(value.to_json()),
    };

    Exported::Frame(ExportFrame {
        key,
        children: children.iter(),
        folded,
    })
}

/// Export a tree (or any subtree) as JSON
pub fn to_json(node: &Node) -> Result<Value, ConvertError> {
    let mut current = match export(node, None) {
        Exported::Leaf(value) => return Ok(value),
        Exported::Frame(frame) => frame,
    };
    let mut parents = Vec::new();

    loop {
        match current.children.next() {
            Some(child) => {
                let key = match current.folded {
                    Folded::Object(_) => match child.name.as_deref() {
                        Some(name) if !name.is_empty() => Some(name),
                        _ => return Err(ConvertError::InvalidName(child.id.clone())),
                    },
                    Folded::Array(_) => None,
                };
                match export(child, key) {
                    Exported::Leaf(value) => current.folded.push(key, value),
                    Exported::Frame(inner) => parents.push(std::mem::replace(&mut current, inner)),
                }
            }
            None => match parents.pop() {
                Some(parent) => {
                    let done = std::mem::replace(&mut current, parent);
                    current.folded.push(done.key, done.folded.into_value());
                }
                None => return Ok(current.folded.into_value()),
            },
        }
    }
}
