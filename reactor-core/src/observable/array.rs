//! Array handles.
//!
//! Element reads depend on the element and on the array's arrangement.
//! Bulk mutators (`push`, `splice`, `sort_by`, ...) run directly on the
//! stored elements and then write the arrangement once, plus the length
//! once if it changed, instead of one write per element touched. That keeps
//! an O(n) `shift` at O(1) trigger scans.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Bound, Range, RangeBounds};
use std::rc::Rc;

use tracing::debug;

use crate::error::{Result, StoreError};
use crate::graph::{NodeId, Slot};
use crate::reactive::{Field, Runtime, Target};
use crate::value::Value;

/// Handle to a wrapped array node.
#[derive(Clone)]
pub struct Array {
    runtime: Rc<Runtime>,
    id: NodeId,
}

impl Array {
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

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Read an element; [`Value::Undefined`] past the end.
    pub fn get(&self, index: usize) -> Value {
        let value = {
            let arena = self.runtime.arena();
            arena
                .array(self.id)
                .get(index)
                .map_or(Value::Undefined, |slot| {
                    super::slot_value(&self.runtime, &arena, slot)
                })
        };
        self.runtime.track(self.target(), Field::Index(index));
        self.runtime.track(self.target(), Field::Shape);
        value
    }

    pub fn len(&self) -> usize {
        let len = self.runtime.arena().array(self.id).len();
        self.runtime.track(self.target(), Field::Length);
        len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every element, in order.
    pub fn to_vec(&self) -> Vec<Value> {
        (0..self.len()).map(|index| self.get(index)).collect()
    }

    pub fn iter(&self) -> std::vec::IntoIter<Value> {
        self.to_vec().into_iter()
    }

    /// Untracked plain snapshot of this node.
    pub fn to_json(&self) -> serde_json::Value {
        self.runtime.arena().to_json(&Slot::Node(self.id))
    }

    // ------------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------------

    /// Assign an element. Assigning past the end fills the gap with
    /// [`Value::Undefined`] and writes the length.
    pub fn set(&self, index: usize, value: impl Into<Value>) -> Result<()> {
        let required = index
            .checked_add(1)
            .ok_or_else(|| StoreError::unsupported(format!("assign element {index}")))?;
        self.check_len(required)?;

        let slot = super::wrap(&self.runtime, value.into())?;
        let (before, after) = {
            let mut arena = self.runtime.arena_mut();
            let elements = arena.array_mut(self.id);
            let before = elements.len();
            if required > before {
                elements.resize(required, Slot::Undefined);
            }
            elements[index] = slot;
            (before, elements.len())
        };

        self.runtime.trigger(self.target(), &Field::Index(index));
        if before != after {
            self.runtime.trigger(self.target(), &Field::Length);
            self.runtime.trigger(self.target(), &Field::Shape);
        }
        self.runtime.notify();
        Ok(())
    }

    /// Append one element; returns the new length.
    pub fn push(&self, value: impl Into<Value>) -> Result<usize> {
        self.extend([value])
    }

    /// Append any number of elements as a single write; returns the new length.
    pub fn extend<I, V>(&self, values: I) -> Result<usize>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let slots = self.wrap_all(values)?;
        Ok(self.mutate(|elements| {
            elements.extend(slots);
            elements.len()
        }))
    }

    /// Remove the last element; [`Value::Undefined`] when empty.
    ///
    /// Popping an empty array is not a write.
    pub fn pop(&self) -> Value {
        if self.is_vacant() {
            return Value::Undefined;
        }
        let slot = self.mutate(|elements| elements.pop());
        self.detached(slot)
    }

    /// Remove the first element; [`Value::Undefined`] when empty.
    pub fn shift(&self) -> Value {
        if self.is_vacant() {
            return Value::Undefined;
        }
        let slot = self.mutate(|elements| (!elements.is_empty()).then(|| elements.remove(0)));
        self.detached(slot)
    }

    /// Prepend one element; returns the new length.
    pub fn unshift(&self, value: impl Into<Value>) -> Result<usize> {
        let slot = super::wrap(&self.runtime, value.into())?;
        Ok(self.mutate(|elements| {
            elements.insert(0, slot);
            elements.len()
        }))
    }

    /// Remove `delete_count` elements starting at `start` and insert `items`
    /// in their place. Out-of-range arguments are clamped. Returns the
    /// removed elements.
    pub fn splice<I, V>(&self, start: usize, delete_count: usize, items: I) -> Result<Vec<Value>>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let slots = self.wrap_all(items)?;
        let removed: Vec<Slot> = self.mutate(|elements| {
            let start = start.min(elements.len());
            let end = start.saturating_add(delete_count).min(elements.len());
            elements.splice(start..end, slots).collect()
        });

        let arena = self.runtime.arena();
        Ok(removed
            .iter()
            .map(|slot| super::slot_value(&self.runtime, &arena, slot))
            .collect())
    }

    /// Sort in place with a comparator over element values.
    pub fn sort_by<F>(&self, mut compare: F)
    where
        F: FnMut(&Value, &Value) -> Ordering,
    {
        // Comparators may read the elements, so no arena borrow is held
        // while they run.
        let mut pairs: Vec<(Value, Slot)> = {
            let arena = self.runtime.arena();
            arena
                .array(self.id)
                .iter()
                .map(|slot| (super::slot_value(&self.runtime, &arena, slot), slot.clone()))
                .collect()
        };
        pairs.sort_by(|(a, _), (b, _)| compare(a, b));

        self.mutate(|elements| {
            *elements = pairs.into_iter().map(|(_, slot)| slot).collect();
        });
    }

    pub fn reverse(&self) {
        self.mutate(|elements| elements.reverse());
    }

    /// Overwrite the elements in `range` with `value`. A composite value is
    /// wrapped once and shared by every filled element.
    pub fn fill<R>(&self, value: impl Into<Value>, range: R) -> Result<()>
    where
        R: RangeBounds<usize>,
    {
        let slot = super::wrap(&self.runtime, value.into())?;
        self.mutate(|elements| {
            let range = clamp(&range, elements.len());
            elements[range].fill(slot);
        });
        Ok(())
    }

    /// Copy the elements in `source` to the positions starting at `dest`,
    /// without changing the length.
    pub fn copy_within<R>(&self, source: R, dest: usize)
    where
        R: RangeBounds<usize>,
    {
        self.mutate(|elements| {
            let len = elements.len();
            let source = clamp(&source, len);
            let count = source.len().min(len.saturating_sub(dest));
            let copied = elements[source.start..source.start + count].to_vec();
            elements[dest.min(len)..dest.min(len) + count].clone_from_slice(&copied);
        });
    }

    /// Truncate, or extend with [`Value::Undefined`].
    pub fn set_len(&self, len: usize) -> Result<()> {
        self.check_len(len)?;
        self.mutate(|elements| elements.resize(len, Slot::Undefined));
        Ok(())
    }

    /// Element removal is not supported: it would leave a hole no getter
    /// could be told about. Use [`splice`](Self::splice) instead.
    pub fn remove(&self, index: usize) -> Result<()> {
        debug!(node = %self.id, index, "rejected element removal");
        Err(StoreError::unsupported(format!("remove element {index}")))
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    /// Untracked emptiness check.
    fn is_vacant(&self) -> bool {
        self.runtime.arena().array(self.id).is_empty()
    }

    /// Reject growth past the configured limit. Shrinking is always allowed.
    fn check_len(&self, len: usize) -> Result<()> {
        let max = self.runtime.config().max_array_len;
        let current = self.runtime.arena().array(self.id).len();
        if len > current && len > max {
            debug!(node = %self.id, len, max, "rejected array growth");
            return Err(StoreError::unsupported(format!(
                "grow array to {len} elements (limit {max})"
            )));
        }
        Ok(())
    }

    fn wrap_all<I, V>(&self, values: I) -> Result<Vec<Slot>>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        super::wrap_all(&self.runtime, values.into_iter().map(Into::into).collect())
    }

    /// Run a bulk mutation, then write the arrangement once and the length
    /// once if it changed.
    fn mutate<R>(&self, apply: impl FnOnce(&mut Vec<Slot>) -> R) -> R {
        let (before, after, result) = {
            let mut arena = self.runtime.arena_mut();
            let elements = arena.array_mut(self.id);
            let before = elements.len();
            let result = apply(elements);
            (before, elements.len(), result)
        };

        self.runtime.trigger(self.target(), &Field::Shape);
        if before != after {
            self.runtime.trigger(self.target(), &Field::Length);
        }
        self.runtime.notify();
        result
    }

    fn detached(&self, slot: Option<Slot>) -> Value {
        slot.map_or(Value::Undefined, |slot| {
            super::slot_value(&self.runtime, &self.runtime.arena(), &slot)
        })
    }
}

fn clamp<R: RangeBounds<usize>>(range: &R, len: usize) -> Range<usize> {
    let start = match range.start_bound() {
        Bound::Included(&start) => start,
        Bound::Excluded(&start) => start.saturating_add(1),
        Bound::Unbounded => 0,
    }
    .min(len);
    let end = match range.end_bound() {
        Bound::Included(&end) => end.saturating_add(1),
        Bound::Excluded(&end) => end,
        Bound::Unbounded => len,
    }
    .min(len)
    .max(start);
    start..end
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.runtime.is_same(&other.runtime)
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Array").field(&self.id).finish()
    }
}
