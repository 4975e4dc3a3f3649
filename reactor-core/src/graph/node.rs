//! Graph Nodes
//!
//! This module defines the composite nodes that live in the state arena and
//! the slots that hold their field and element values.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

/// Identity of a composite node in the state arena.
///
/// Ids are arena indices: stable for the lifetime of the store and never
/// reused, which makes them usable as dependency keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Get the arena index.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The kind of composite node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Keyed fields, in insertion order.
    Object,

    /// Indexed elements.
    Array,
}

/// A value stored in a field or element.
///
/// Composite values are always stored as a reference to another node, so
/// every composite reachable from the root is wrapped.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Slot {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Node(NodeId),
    /// Non-reactive data, stored and returned as is.
    Frozen(Rc<serde_json::Value>),
}

/// A composite node.
#[derive(Debug)]
pub(crate) enum Node {
    Object(IndexMap<String, Slot>),
    Array(Vec<Slot>),
}

impl Node {
    pub(crate) fn kind(&self) -> NodeKind {
        match self {
            Node::Object(_) => NodeKind::Object,
            Node::Array(_) => NodeKind::Array,
        }
    }
}
