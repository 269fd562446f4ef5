//! A red-black tree map using the _allocated_ pattern for explicit allocator control.
//!
//! Every entry lives in its own node, allocated through an
//! [`Allocator`](allocator_api2::alloc::Allocator) that the caller chooses.
//! Rotations and recoloring after each insert and removal keep the tree
//! within twice the optimal height, so lookups, inserts and removals are all
//! `O(log n)`.
//!
//! # Quick Start
//!
//! ```
//! use allocated_rbtree::RbTreeMap;
//!
//! let mut map = RbTreeMap::new();
//! map.insert(1, "one")?;
//! map.insert(2, "two")?;
//! map.insert(3, "three")?;
//!
//! assert_eq!(map.get(&2), Some(&"two"));
//! assert_eq!(map.len(), 3);
//! # Ok::<(), allocated::AllocErrorWithLayout>(())
//! ```
//!
//! Removing a key that is not there is an error rather than a silent no-op:
//!
//! ```
//! use allocated_rbtree::{RbTreeMap, RemoveError};
//!
//! let mut map = RbTreeMap::<u32, u32>::new();
//! assert_eq!(map.remove(&6), Err(RemoveError::EmptyTree));
//!
//! map.insert(5, 25).unwrap();
//! assert_eq!(map.remove(&6), Err(RemoveError::KeyNotFound));
//! assert_eq!(map.remove(&5), Ok(25));
//! ```
//!
//! # The Allocated Pattern
//!
//! This crate follows the _allocated_ pattern, providing two types:
//!
//! ## Wrapper Type (Recommended)
//!
//! [`RbTreeMap<K, V, A>`] owns its allocator and provides safe methods:
//!
//! ```
//! use allocated_rbtree::RbTreeMap;
//!
//! let mut map = RbTreeMap::new();
//! map.insert(42, "answer")?;  // No unsafe blocks needed!
//! assert_eq!(map[&42], "answer");
//! # Ok::<(), allocated::AllocErrorWithLayout>(())
//! ```
//!
//! ## Allocated Type (Advanced)
//!
//! [`AllocatedRbTreeMap<K, V>`] is low-level and requires the allocator to be
//! passed to every call that allocates or frees. It is meant for building
//! composite data structures or when you need fine control:
//!
//! ```
//! use allocated_rbtree::AllocatedRbTreeMap;
//! use allocated::CountingAllocator;
//!
//! let alloc = CountingAllocator::default();
//! let mut map = AllocatedRbTreeMap::<u32, String>::new_in(&alloc);
//!
//! unsafe {
//!     map.insert_in(&alloc, 1, "one".to_string())?;
//! }
//!
//! // One allocation per entry
//! assert_eq!(alloc.n_allocations(), 1);
//! # Ok::<(), allocated::AllocErrorWithLayout>(())
//! ```
//!
//! # Features
//!
//! - `std` (default): enables [`RbTreeMap::to_dot`], which renders the tree
//!   as a Graphviz graph with each node in its color.
//!
//! # Logging
//!
//! Rotations and fixup cases are reported at `trace` level through the
//! [`log`] facade; the crate never installs a logger itself.

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]

#[cfg(any(feature = "std", test))]
extern crate std;

extern crate alloc;

pub mod error;
/// Red-black tree map.
///
/// This module provides [`rbtree::AllocatedRbTreeMap`] and its wrapper
/// [`rbtree::RbTreeMap`], together with the entry API and iterators.
pub mod rbtree;

pub use error::RemoveError;
pub use rbtree::AllocatedRbTreeMap;
pub use rbtree::Color;
pub use rbtree::RbTreeMap;
