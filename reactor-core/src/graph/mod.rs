//! State Graph
//!
//! This module stores the state tree of a store as an arena of composite
//! nodes.
//!
//! # Overview
//!
//! - Objects and arrays are nodes; scalars live inline in their parent's
//!   slots.
//! - A field holding a composite holds its [`NodeId`], so shared references
//!   reconverge on one node and identity is an integer.
//! - Nodes are wrapped once, when first attached, and never unwrapped.

mod arena;
mod node;

pub use node::{NodeId, NodeKind};
pub(crate) use arena::Arena;
pub(crate) use node::{Node, Slot};
