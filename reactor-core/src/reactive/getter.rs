//! Getter Implementation
//!
//! A Getter is a named, memoized computation over the state tree and the
//! other getters of its store.
//!
//! # How Getters Work
//!
//! 1. A getter starts invalid. Nothing runs at definition time.
//!
//! 2. On the first read, the getter resets its registry, pushes a frame on
//!    the running-computation stack and calls its function. Every tracked
//!    read made during the call lands in the registry of every frame on the
//!    stack, so callers also depend on what their callees touched.
//!
//! 3. The result is cached and the getter becomes valid. Further reads
//!    return the cache without calling the function.
//!
//! 4. A write to any recorded (target, field) pair invalidates the getter.
//!    Invalidation is a flag flip: the stale cache stays in place until the
//!    next successful run overwrites it, but it is never handed out.
//!
//! 5. A failed run leaves the getter invalid and marks it failed. Callers
//!    that recovered from the failure still depend on the getter, so its
//!    next successful run, or any invalidation while failed, is written to
//!    them as a change.

use std::cell::{Cell, Ref, RefCell};
use std::fmt::{self, Debug};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::error::{Result, StoreError};
use crate::store::Getters;
use crate::value::Value;
use super::registry::{DependencyRegistry, Field, Target};
use super::runtime::Runtime;

/// Signature of a getter function: the root state and an accessor for the
/// other getters of the store.
pub type GetterFn = Rc<dyn Fn(&Value, &Getters) -> Result<Value>>;

/// Box a closure as a [`GetterFn`], for [`Store::define_getters`](crate::Store::define_getters).
pub fn getter_fn<F>(compute: F) -> GetterFn
where
    F: Fn(&Value, &Getters) -> Result<Value> + 'static,
{
    Rc::new(compute)
}

/// Unique identifier for a getter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GetterId(u64);

impl GetterId {
    /// Generate a new unique getter ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for GetterId {
    fn default() -> Self {
        Self::new()
    }
}

/// Validity of a getter's cached value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetterState {
    /// The cached value reflects the current state.
    Valid,

    /// Never computed, or a dependency changed since the last computation.
    Invalid,
}

pub(crate) struct Getter {
    id: GetterId,
    name: String,
    compute: GetterFn,
    cache: RefCell<Option<Value>>,
    state: Cell<GetterState>,
    failed: Cell<bool>,
    registry: RefCell<DependencyRegistry>,
}

impl Getter {
    pub(crate) fn new(name: impl Into<String>, compute: GetterFn) -> Self {
        Self {
            id: GetterId::new(),
            name: name.into(),
            compute,
            cache: RefCell::new(None),
            state: Cell::new(GetterState::Invalid),
            failed: Cell::new(false),
            registry: RefCell::new(DependencyRegistry::new()),
        }
    }

    pub(crate) fn id(&self) -> GetterId {
        self.id
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn state(&self) -> GetterState {
        self.state.get()
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.state.get() == GetterState::Valid
    }

    /// Mark the cached value stale. Returns whether dependents may hold a
    /// view of this getter that is now stale: it was valid, or its last run
    /// failed.
    pub(crate) fn invalidate(&self) -> bool {
        let was_valid = self.state.replace(GetterState::Invalid) == GetterState::Valid;
        was_valid || self.failed.get()
    }

    /// The cached value, only while valid.
    pub(crate) fn value(&self) -> Result<Value> {
        match (self.state.get(), self.cache.borrow().as_ref()) {
            (GetterState::Valid, Some(value)) => Ok(value.clone()),
            _ => Err(StoreError::NotComputed {
                name: self.name.clone(),
            }),
        }
    }

    pub(crate) fn registry(&self) -> Ref<'_, DependencyRegistry> {
        self.registry.borrow()
    }

    pub(crate) fn record(&self, target: Target, field: Field) {
        self.registry.borrow_mut().add(target, field);
    }

    pub(crate) fn depends_on(&self, target: Target, field: &Field) -> bool {
        self.registry.borrow().has(target, field)
    }

    /// Return the cached value, recomputing first if invalid.
    pub(crate) fn run(self: &Rc<Self>, runtime: &Rc<Runtime>) -> Result<Value> {
        if self.is_valid() {
            return self.value();
        }

        let value = self.evaluate(runtime).inspect_err(|err| {
            self.failed.set(true);
            debug!(getter = %self.name, error = %err, "getter run failed");
        })?;

        if self.failed.replace(false) {
            // Runs before the getter turns valid, so its own frame's record
            // of this slot cannot invalidate it.
            runtime.trigger(Target::Getter(self.id), &Field::Value);
        }

        *self.cache.borrow_mut() = Some(value.clone());
        self.state.set(GetterState::Valid);
        Ok(value)
    }

    fn evaluate(self: &Rc<Self>, runtime: &Rc<Runtime>) -> Result<Value> {
        let context = runtime.context();
        if context.contains(self.id) {
            let mut chain = context.chain_from(self.id);
            chain.push(self.name.clone());
            warn!(getter = %self.name, "cyclic getter dependency");
            return Err(StoreError::CyclicDependency { chain });
        }

        let max_depth = runtime.config().max_depth;
        if context.depth() >= max_depth {
            warn!(getter = %self.name, max_depth, "computation depth exceeded");
            return Err(StoreError::DepthExceeded {
                name: self.name.clone(),
                max_depth,
            });
        }

        self.registry.borrow_mut().reset();
        debug!(getter = %self.name, depth = context.depth(), "computing getter");

        let _frame = context.enter(Rc::clone(self));
        let getters = Getters::new(Rc::clone(runtime));
        (self.compute)(&runtime.root(), &getters)
    }
}

impl Debug for Getter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Getter")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("failed", &self.failed.get())
            .field("dependencies", &self.registry.borrow().len())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
