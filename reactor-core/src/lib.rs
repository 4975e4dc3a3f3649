//! Reactor Core
//!
//! This crate provides a reactive state container: a store wraps plain
//! nested data so that every read and write of its fields is observed, and
//! lets callers define named getters that are memoized and invalidated
//! precisely when the fields they actually read change.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `graph`: Arena of composite state nodes, identified by [`NodeId`]
//! - `observable`: [`Object`] and [`Array`] handles intercepting reads and writes
//! - `reactive`: Dependency registries, the running-computation stack,
//!   getters and the track/trigger engine
//! - `store`: The [`Store`] façade
//!
//! # Example
//!
//! ```rust
//! use reactor_core::Store;
//! use serde_json::json;
//!
//! let store = Store::new(json!({ "entities": [] })).unwrap();
//! store.define_getter("sum", |state, _| {
//!     let total: f64 = state
//!         .get("entities")
//!         .as_array()
//!         .map(|entities| entities.iter().filter_map(|e| e.get("value").as_f64()).sum())
//!         .unwrap_or_default();
//!     Ok(total.into())
//! }).unwrap();
//!
//! let entities = store.state().get("entities");
//! let entities = entities.as_array().unwrap();
//! entities.push(json!({ "value": 10 })).unwrap();
//! entities.push(json!({ "value": 6 })).unwrap();
//!
//! assert_eq!(store.value("sum").unwrap().as_f64(), Some(16.0));
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod observable;
pub mod reactive;
mod store;
mod value;

pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use graph::{NodeId, NodeKind};
pub use observable::{Array, Object};
pub use reactive::{
    getter_fn, DependencyRegistry, Field, GetterFn, GetterId, GetterState, SubscriberId,
    Subscription, Target,
};
pub use store::{GetterRef, Getters, Store};
pub use value::Value;
