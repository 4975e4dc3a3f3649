//! Reactive Runtime
//!
//! The runtime is the per-store coordinator that connects the state arena,
//! the running-computation stack and the getters.
//!
//! # How It Works
//!
//! 1. Every intercepted read calls [`Runtime::track`], which records the
//!    (target, field) pair in the registry of each running getter.
//!
//! 2. Every intercepted write calls [`Runtime::trigger`], which scans the
//!    getters and invalidates those whose registry holds the written pair.
//!
//! 3. Invalidating a getter is itself a write to that getter's value slot,
//!    so the trigger queues `(getter, Field::Value)` and dependents of the
//!    getter are invalidated in the same synchronous pass.
//!
//! 4. Getters are lazy: nothing recomputes until it is read again.
//!
//! # Threading
//!
//! A runtime is confined to one thread. It is shared through `Rc` by the
//! store and every state handle, and holds interior state in `RefCell`s
//! that are never borrowed across a call into user code.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::HashSet;
use std::rc::Rc;

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::graph::{Arena, NodeId, Slot};
use crate::observable;
use crate::value::Value;
use super::context::ContextStack;
use super::getter::{Getter, GetterFn};
use super::registry::{Field, Target};
use super::subscriber::{Subscriber, SubscriberId, Subscription};

pub(crate) struct Runtime {
    config: StoreConfig,
    arena: RefCell<Arena>,
    root: Cell<Option<NodeId>>,
    context: ContextStack,
    getters: RefCell<IndexMap<String, Rc<Getter>>>,
    subscribers: RefCell<Vec<Rc<Subscriber>>>,
}

impl Runtime {
    /// Create a runtime and attach `initial` as its root.
    ///
    /// The root must be composite.
    pub(crate) fn with_root(config: StoreConfig, initial: Value) -> Result<Rc<Self>> {
        if !initial.is_composite() {
            return Err(StoreError::InvalidRoot {
                kind: initial.kind(),
            });
        }

        let runtime = Rc::new(Self {
            config,
            arena: RefCell::new(Arena::new()),
            root: Cell::new(None),
            context: ContextStack::new(),
            getters: RefCell::new(IndexMap::new()),
            subscribers: RefCell::new(Vec::new()),
        });

        match observable::wrap(&runtime, initial)? {
            Slot::Node(id) => runtime.root.set(Some(id)),
            _ => unreachable!("composite values wrap to nodes"),
        }
        debug!(nodes = runtime.arena().len(), "store created");
        Ok(runtime)
    }

    pub(crate) fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub(crate) fn context(&self) -> &ContextStack {
        &self.context
    }

    pub(crate) fn arena(&self) -> Ref<'_, Arena> {
        self.arena.borrow()
    }

    pub(crate) fn arena_mut(&self) -> RefMut<'_, Arena> {
        self.arena.borrow_mut()
    }

    /// Handle to the root node.
    pub(crate) fn root(self: &Rc<Self>) -> Value {
        match self.root.get() {
            Some(id) => observable::node_value(self, &self.arena(), id),
            None => Value::Undefined,
        }
    }

    // ------------------------------------------------------------------------
    // Tracking
    // ------------------------------------------------------------------------

    /// Attribute a read of `target.field` to every running computation.
    pub(crate) fn track(&self, target: Target, field: Field) {
        if !self.context.is_active() {
            return;
        }
        if self.config.trace_reads {
            trace!(?target, %field, current = ?self.context.current(), "tracked read");
        }
        self.context.track(target, field);
    }

    /// Invalidate every getter that read `target.field`, then cascade to
    /// the dependents of each getter that was valid.
    ///
    /// The cascade runs off a worklist, so chain length never grows the
    /// native stack.
    pub(crate) fn trigger(&self, target: Target, field: &Field) {
        // Snapshot: no user code runs during a trigger, so the set of
        // getters cannot change under it.
        let getters: SmallVec<[Rc<Getter>; 8]> =
            self.getters.borrow().values().cloned().collect();

        // Failed getters cascade even when already invalid, so each getter
        // cascades at most once per pass or a failed cycle would never drain.
        let mut cascaded = HashSet::new();
        let mut pending = vec![(target, field.clone())];
        while let Some((target, field)) = pending.pop() {
            trace!(?target, %field, "trigger");
            for getter in &getters {
                if getter.depends_on(target, &field)
                    && getter.invalidate()
                    && cascaded.insert(getter.id())
                {
                    debug!(getter = getter.name(), %field, "getter invalidated");
                    pending.push((Target::Getter(getter.id()), Field::Value));
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Getters
    // ------------------------------------------------------------------------

    pub(crate) fn define_getter(&self, name: String, compute: GetterFn) -> Result<()> {
        self.define_getters(vec![(name, compute)])
    }

    /// Register a batch of getters. Nothing is registered if any name clashes.
    pub(crate) fn define_getters(&self, batch: Vec<(String, GetterFn)>) -> Result<()> {
        let mut getters = self.getters.borrow_mut();

        for (index, (name, _)) in batch.iter().enumerate() {
            let repeated = batch[..index].iter().any(|(other, _)| other == name);
            if repeated || getters.contains_key(name) {
                return Err(StoreError::DuplicateName { name: name.clone() });
            }
        }

        for (name, compute) in batch {
            debug!(getter = %name, "getter defined");
            getters.insert(name.clone(), Rc::new(Getter::new(name, compute)));
        }
        Ok(())
    }

    pub(crate) fn lookup(&self, name: &str) -> Result<Rc<Getter>> {
        self.getters
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                name: name.to_string(),
            })
    }

    pub(crate) fn getter_names(&self) -> Vec<String> {
        self.getters.borrow().keys().cloned().collect()
    }

    /// Read a getter's value, recomputing it if needed.
    ///
    /// The read is tracked as `(getter, Field::Value)`, so a getter reading
    /// another getter is invalidated along with it.
    pub(crate) fn run_getter(self: &Rc<Self>, name: &str) -> Result<Value> {
        let getter = self.lookup(name)?;
        let result = getter.run(self);
        self.track(Target::Getter(getter.id()), Field::Value);
        result
    }

    /// Invalidate a getter explicitly and cascade to its dependents.
    pub(crate) fn invalidate_getter(&self, getter: &Getter) {
        if getter.invalidate() {
            debug!(getter = getter.name(), "getter invalidated explicitly");
            self.trigger(Target::Getter(getter.id()), &Field::Value);
        }
    }

    // ------------------------------------------------------------------------
    // Subscribers
    // ------------------------------------------------------------------------

    pub(crate) fn subscribe(self: &Rc<Self>, subscriber: Subscriber) -> Subscription {
        let id = subscriber.id();
        self.subscribers.borrow_mut().push(Rc::new(subscriber));
        Subscription::new(Rc::downgrade(self), id)
    }

    pub(crate) fn unsubscribe(&self, id: SubscriberId) {
        self.subscribers
            .borrow_mut()
            .retain(|subscriber| subscriber.id() != id);
    }

    /// Tell every subscriber that a top-level write completed.
    pub(crate) fn notify(self: &Rc<Self>) {
        let subscribers: SmallVec<[Rc<Subscriber>; 4]> =
            self.subscribers.borrow().iter().cloned().collect();
        if subscribers.is_empty() {
            return;
        }

        let root = self.root();
        for subscriber in subscribers {
            subscriber.notify(&root);
        }
    }

    /// Drop getters and subscribers.
    ///
    /// Cached values and closures may hold handles to this runtime; clearing
    /// them breaks the resulting reference cycles.
    pub(crate) fn teardown(&self) {
        let getters = std::mem::take(&mut *self.getters.borrow_mut());
        let subscribers = std::mem::take(&mut *self.subscribers.borrow_mut());
        drop(getters);
        drop(subscribers);
    }

    pub(crate) fn is_same(self: &Rc<Self>, other: &Rc<Runtime>) -> bool {
        Rc::ptr_eq(self, other)
    }
}
