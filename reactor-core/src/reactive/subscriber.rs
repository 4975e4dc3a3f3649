//! Subscriber types for the reactive store.
//!
//! A Subscriber is an external listener told about every top-level state
//! write. Subscribers sit outside dependency tracking: they are not frames
//! and never invalidate anything.

use std::rc::Weak;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::value::Value;
use super::runtime::Runtime;

/// Unique identifier for a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// A listener invoked with the root state after each write.
pub(crate) struct Subscriber {
    id: SubscriberId,
    notify: Box<dyn Fn(&Value)>,
}

impl Subscriber {
    pub(crate) fn new<F>(notify: F) -> Self
    where
        F: Fn(&Value) + 'static,
    {
        Self {
            id: SubscriberId::new(),
            notify: Box::new(notify),
        }
    }

    pub(crate) fn id(&self) -> SubscriberId {
        self.id
    }

    pub(crate) fn notify(&self, state: &Value) {
        (self.notify)(state);
    }
}

/// Handle to a registered subscriber.
///
/// Dropping this handle unsubscribes the listener, so keep it alive for as
/// long as notifications are wanted.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    runtime: Weak<Runtime>,
    id: SubscriberId,
}

impl Subscription {
    pub(crate) fn new(runtime: Weak<Runtime>, id: SubscriberId) -> Self {
        Self { runtime, id }
    }

    /// Get the subscriber's unique ID.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Stop receiving notifications.
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.unsubscribe(self.id);
        }
    }
}
