//! Reactive Core
//!
//! This module implements dependency tracking and invalidation: the
//! per-getter registries, the running-computation stack, the getters
//! themselves and the runtime that ties them to the state arena.
//!
//! # Concepts
//!
//! ## Track
//!
//! Every read of a state field made while a getter computes is recorded as a
//! (target, field) pair in the registry of each getter on the stack.
//!
//! ## Trigger
//!
//! Every write scans the getters and invalidates those whose registry holds
//! the written pair. A getter's value slot is itself a trackable field, so
//! invalidation cascades to getters that read it.
//!
//! ## Getters
//!
//! Getters are lazy and memoized: they recompute once on the next read after
//! an invalidation, and never otherwise.
//!
//! # Implementation Notes
//!
//! Dependencies are discovered by observation, not declared. A getter that
//! takes a different branch on its next run ends up with a different
//! registry, because the registry is reset before every computation.

mod context;
mod getter;
mod registry;
pub(crate) mod runtime;
mod subscriber;

pub use getter::{getter_fn, GetterFn, GetterId, GetterState};
pub use registry::{DependencyRegistry, Field, Target};
pub use subscriber::{SubscriberId, Subscription};

pub(crate) use getter::Getter;
pub(crate) use runtime::Runtime;
pub(crate) use subscriber::Subscriber;
