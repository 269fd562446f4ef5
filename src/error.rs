//! Errors reported by removal.
//!
//! Allocation failures are not listed here; they surface as
//! [`allocated::AllocErrorWithLayout`] through [`allocated::AllocResult`].

use thiserror::Error;

/// The reason a key could not be removed from a red-black tree map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum RemoveError {
    /// The map holds entries, but none with the requested key.
    #[error("key not in tree")]
    KeyNotFound,
    /// The map holds no entries at all.
    #[error("tree is empty")]
    EmptyTree,
}
