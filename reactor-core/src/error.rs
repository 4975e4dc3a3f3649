//! Error types for the reactive store.
//!
//! Every fallible operation in the crate returns [`Result`], and every
//! failure is synchronous: an operation either completes or leaves the
//! state tree untouched.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// Errors raised by the store, its getters, and its state handles.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    /// A getter was read before being registered.
    #[error("getter '{name}' not found")]
    NotFound {
        /// Name that was looked up
        name: String,
    },

    /// A getter name was registered twice.
    #[error("getter '{name}' is already defined")]
    DuplicateName {
        /// Name that was already taken
        name: String,
    },

    /// A mutation the dependency cache cannot represent, such as removing a field.
    #[error("unsupported operation: {operation}")]
    UnsupportedOperation {
        /// Short description of the rejected mutation
        operation: String,
    },

    /// A getter asked (transitively) for its own value while computing it.
    #[error("cyclic getter dependency: {}", chain.join(" -> "))]
    CyclicDependency {
        /// Getter names from the outermost running computation to the repeated one
        chain: Vec<String>,
    },

    /// A getter's cached value was read while invalid.
    #[error("getter '{name}' has not been computed or is invalid")]
    NotComputed {
        /// Getter name
        name: String,
    },

    /// The running-computation stack grew past the configured limit.
    #[error("getter '{name}' exceeds the maximum computation depth of {max_depth}")]
    DepthExceeded {
        /// Getter that would have pushed the extra frame
        name: String,
        /// Configured limit
        max_depth: usize,
    },

    /// A state handle owned by another store was assigned into this one.
    #[error("state node belongs to a different store")]
    ForeignNode,

    /// The initial state was a scalar.
    #[error("root state must be an object or an array, got {kind}")]
    InvalidRoot {
        /// Kind of the rejected value
        kind: &'static str,
    },

    /// A getter function reported a failure of its own.
    #[error("getter computation failed: {0}")]
    Computation(String),
}

impl StoreError {
    /// Build a [`StoreError::Computation`] from any displayable message.
    pub fn computation(message: impl std::fmt::Display) -> Self {
        Self::Computation(message.to_string())
    }

    pub(crate) fn unsupported(operation: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            operation: operation.into(),
        }
    }
}
