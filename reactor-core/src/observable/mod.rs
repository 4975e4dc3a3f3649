//! Observable Wrapper
//!
//! Turns plain data into arena nodes and hands out the [`Object`] and
//! [`Array`] handles through which every read and write is intercepted.
//!
//! # Wrapping
//!
//! Wrapping is eager and bottom-up: when a plain value is attached (at store
//! creation or on assignment) every nested composite is allocated before its
//! parent, so reads never have to wrap anything lazily. Wrapped handles and
//! frozen data pass through unchanged, which makes wrapping idempotent.

mod array;
mod object;

use std::rc::Rc;

use crate::error::{Result, StoreError};
use crate::graph::{Arena, Node, NodeId, NodeKind, Slot};
use crate::reactive::Runtime;
use crate::value::Value;

pub use array::Array;
pub use object::Object;

/// Attach `value` to the arena of `runtime`.
///
/// Handles owned by another store are rejected before anything is
/// allocated.
pub(crate) fn wrap(runtime: &Rc<Runtime>, value: Value) -> Result<Slot> {
    ensure_owned(runtime, &value)?;
    let mut arena = runtime.arena_mut();
    Ok(attach(&mut arena, value))
}

/// Attach several values at once; all or nothing.
pub(crate) fn wrap_all(runtime: &Rc<Runtime>, values: Vec<Value>) -> Result<Vec<Slot>> {
    values
        .iter()
        .try_for_each(|value| ensure_owned(runtime, value))?;
    let mut arena = runtime.arena_mut();
    Ok(values
        .into_iter()
        .map(|value| attach(&mut arena, value))
        .collect())
}

fn ensure_owned(runtime: &Rc<Runtime>, value: &Value) -> Result<()> {
    match value {
        Value::Object(object) if !object.belongs_to(runtime) => Err(StoreError::ForeignNode),
        Value::Array(array) if !array.belongs_to(runtime) => Err(StoreError::ForeignNode),
        Value::List(items) => items
            .iter()
            .try_for_each(|item| ensure_owned(runtime, item)),
        Value::Map(fields) => fields
            .values()
            .try_for_each(|field| ensure_owned(runtime, field)),
        _ => Ok(()),
    }
}

fn attach(arena: &mut Arena, value: Value) -> Slot {
    match value {
        Value::Undefined => Slot::Undefined,
        Value::Null => Slot::Null,
        Value::Bool(b) => Slot::Bool(b),
        Value::Number(n) => Slot::Number(n),
        Value::String(s) => Slot::String(s),
        Value::List(items) => {
            let elements = items.into_iter().map(|item| attach(arena, item)).collect();
            Slot::Node(arena.alloc(Node::Array(elements)))
        }
        Value::Map(fields) => {
            let fields = fields
                .into_iter()
                .map(|(key, field)| (key, attach(arena, field)))
                .collect();
            Slot::Node(arena.alloc(Node::Object(fields)))
        }
        Value::Object(object) => Slot::Node(object.id()),
        Value::Array(array) => Slot::Node(array.id()),
        Value::Frozen(json) => Slot::Frozen(json),
    }
}

/// Value of a stored slot. Composite slots become handles.
pub(crate) fn slot_value(runtime: &Rc<Runtime>, arena: &Arena, slot: &Slot) -> Value {
    match slot {
        Slot::Undefined => Value::Undefined,
        Slot::Null => Value::Null,
        Slot::Bool(b) => Value::Bool(*b),
        Slot::Number(n) => Value::Number(*n),
        Slot::String(s) => Value::String(s.clone()),
        Slot::Node(id) => node_value(runtime, arena, *id),
        Slot::Frozen(json) => Value::Frozen(Rc::clone(json)),
    }
}

pub(crate) fn node_value(runtime: &Rc<Runtime>, arena: &Arena, id: NodeId) -> Value {
    match arena.kind(id) {
        NodeKind::Object => Value::Object(Object::new(Rc::clone(runtime), id)),
        NodeKind::Array => Value::Array(Array::new(Rc::clone(runtime), id)),
    }
}
