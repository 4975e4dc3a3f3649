//! Object handles.

use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::error::{Result, StoreError};
use crate::graph::NodeId;
use crate::reactive::{Field, Runtime, Target};
use crate::value::Value;

/// Handle to a wrapped object node.
///
/// Reads are tracked against the running getters; writes invalidate the
/// getters that read the written field. Handles are cheap to clone and
/// compare by identity.
#[derive(Clone)]
pub struct Object {
    runtime: Rc<Runtime>,
    id: NodeId,
}

impl Object {
    pub(crate) fn new(runtime: Rc<Runtime>, id: NodeId) -> Self {
        Self { runtime, id }
    }

    /// Identity of the underlying node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Dependency target for this node.
    pub fn target(&self) -> Target {
        Target::Node(self.id)
    }

    pub(crate) fn belongs_to(&self, runtime: &Rc<Runtime>) -> bool {
        self.runtime.is_same(runtime)
    }

    /// Read a field; [`Value::Undefined`] if absent.
    pub fn get(&self, key: &str) -> Value {
        let value = {
            let arena = self.runtime.arena();
            arena
                .object(self.id)
                .get(key)
                .map_or(Value::Undefined, |slot| {
                    super::slot_value(&self.runtime, &arena, slot)
                })
        };
        self.runtime.track(self.target(), Field::named(key));
        value
    }

    /// Whether the field exists. Depends on the key set, not on values.
    pub fn has(&self, key: &str) -> bool {
        let present = self.runtime.arena().object(self.id).contains_key(key);
        self.runtime.track(self.target(), Field::Shape);
        present
    }

    /// Field names in insertion order.
    pub fn keys(&self) -> Vec<String> {
        let keys = self.runtime.arena().object(self.id).keys().cloned().collect();
        self.runtime.track(self.target(), Field::Shape);
        keys
    }

    /// Every field with its value; depends on the key set and on each field.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.keys()
            .into_iter()
            .map(|key| {
                let value = self.get(&key);
                (key, value)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        let len = self.runtime.arena().object(self.id).len();
        self.runtime.track(self.target(), Field::Shape);
        len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Assign a field, wrapping composite values first.
    ///
    /// Adding a key also writes the key set, so getters that enumerate keys
    /// see the new field.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let key = key.into();
        let slot = super::wrap(&self.runtime, value.into())?;
        let added = self
            .runtime
            .arena_mut()
            .object_mut(self.id)
            .insert(key.clone(), slot)
            .is_none();

        self.runtime.trigger(self.target(), &Field::Named(key));
        if added {
            self.runtime.trigger(self.target(), &Field::Shape);
        }
        self.runtime.notify();
        Ok(())
    }

    /// Field removal is not supported: no getter could be told about it.
    pub fn remove(&self, key: &str) -> Result<()> {
        debug!(node = %self.id, key, "rejected field removal");
        Err(StoreError::unsupported(format!("remove field '{key}'")))
    }

    /// Untracked plain snapshot of this node.
    pub fn to_json(&self) -> serde_json::Value {
        self.runtime.arena().to_json(&crate::graph::Slot::Node(self.id))
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.runtime.is_same(&other.runtime)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Object").field(&self.id).finish()
    }
}
