//! State Arena
//!
//! All composite nodes of one store live in a single arena, indexed by
//! [`NodeId`]. Nodes are never removed: a node detached from the tree simply
//! becomes unreachable and stays allocated until the store is dropped.

use indexmap::IndexMap;

use super::node::{Node, NodeId, NodeKind, Slot};

/// Owner of every composite node of a store.
#[derive(Debug, Default)]
pub(crate) struct Arena {
    nodes: Vec<Node>,
}

impl Arena {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its identity.
    pub(crate) fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id.index()].kind()
    }

    pub(crate) fn object(&self, id: NodeId) -> &IndexMap<String, Slot> {
        match &self.nodes[id.index()] {
            Node::Object(fields) => fields,
            Node::Array(_) => unreachable!("node {id} is an array"),
        }
    }

    pub(crate) fn object_mut(&mut self, id: NodeId) -> &mut IndexMap<String, Slot> {
        match &mut self.nodes[id.index()] {
            Node::Object(fields) => fields,
            Node::Array(_) => unreachable!("node {id} is an array"),
        }
    }

    pub(crate) fn array(&self, id: NodeId) -> &Vec<Slot> {
        match &self.nodes[id.index()] {
            Node::Array(elements) => elements,
            Node::Object(_) => unreachable!("node {id} is an object"),
        }
    }

    pub(crate) fn array_mut(&mut self, id: NodeId) -> &mut Vec<Slot> {
        match &mut self.nodes[id.index()] {
            Node::Array(elements) => elements,
            Node::Object(_) => unreachable!("node {id} is an object"),
        }
    }

    /// Plain snapshot of a slot and everything below it.
    pub(crate) fn to_json(&self, slot: &Slot) -> serde_json::Value {
        use serde_json::Value as Json;

        match slot {
            Slot::Undefined | Slot::Null => Json::Null,
            Slot::Bool(b) => Json::Bool(*b),
            Slot::Number(n) => serde_json::Number::from_f64(*n).map_or(Json::Null, Json::Number),
            Slot::String(s) => Json::String(s.clone()),
            Slot::Frozen(json) => (**json).clone(),
            Slot::Node(id) => match &self.nodes[id.index()] {
                Node::Object(fields) => Json::Object(
                    fields
                        .iter()
                        .map(|(key, slot)| (key.clone(), self.to_json(slot)))
                        .collect(),
                ),
                Node::Array(elements) => {
                    Json::Array(elements.iter().map(|slot| self.to_json(slot)).collect())
                }
            },
        }
    }
}
