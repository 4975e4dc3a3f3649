//! Store configuration.

use serde::Deserialize;

/// Tunables for a [`Store`](crate::Store).
///
/// Deserializable so hosts can keep it next to their own settings:
///
/// ```rust
/// use reactor_core::StoreConfig;
///
/// let config: StoreConfig = serde_json::from_str(r#"{ "max_depth": 16 }"#).unwrap();
/// assert_eq!(config.max_depth, 16);
/// assert!(!config.trace_reads);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum number of getters computing at once (nested getter calls).
    pub max_depth: usize,

    /// Emit a `trace!` event for every tracked read.
    pub trace_reads: bool,

    /// Largest length an array may grow to through index assignment or
    /// `set_len`.
    pub max_array_len: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_depth: 128,
            trace_reads: false,
            max_array_len: 1 << 24,
        }
    }
}
