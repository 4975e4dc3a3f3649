//! Dependency Registry
//!
//! Each getter owns one registry. It records which (target, field) pairs the
//! getter's last computation actually read, so a write can be matched
//! against it in O(1).
//!
//! # Layout
//!
//! The registry maps a [`Field`] to the set of [`Target`]s read through that
//! field. Membership is by identity: two structurally equal objects are two
//! different targets.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;

use crate::graph::NodeId;
use super::getter::GetterId;

/// Something a getter can depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// A composite node of the state tree.
    Node(NodeId),

    /// Another getter; its cached value is read through [`Field::Value`].
    Getter(GetterId),
}

/// The field of a [`Target`] that was read or written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    /// A named object field.
    Named(String),

    /// An array element.
    Index(usize),

    /// The element count of an array.
    Length,

    /// The set of keys of an object or the arrangement of an array.
    ///
    /// Written when keys are added or when a bulk array mutation runs;
    /// read by membership tests and enumeration.
    Shape,

    /// The cached value of a getter.
    Value,
}

impl Field {
    /// Shorthand for [`Field::Named`].
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Named(name) => f.write_str(name),
            Field::Index(index) => write!(f, "{index}"),
            Field::Length => f.write_str("length"),
            Field::Shape => f.write_str("<shape>"),
            Field::Value => f.write_str("value"),
        }
    }
}

/// Per-getter set of (target, field) pairs.
#[derive(Debug, Default, Clone)]
pub struct DependencyRegistry {
    fields: IndexMap<Field, HashSet<Target>>,
}

impl DependencyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `target.field` was read. Idempotent.
    pub fn add(&mut self, target: Target, field: Field) {
        self.fields.entry(field).or_default().insert(target);
    }

    /// Check whether `target.field` was read.
    pub fn has(&self, target: Target, field: &Field) -> bool {
        self.fields
            .get(field)
            .is_some_and(|targets| targets.contains(&target))
    }

    /// Drop every entry.
    pub fn reset(&mut self) {
        self.fields.clear();
    }

    /// Fields with at least one recorded target.
    pub fn keys(&self) -> impl Iterator<Item = &Field> {
        self.fields.keys()
    }

    /// Number of recorded (target, field) pairs.
    pub fn len(&self) -> usize {
        self.fields.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
