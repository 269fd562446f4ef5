//! Ergonomic wrapper for the red-black tree.
//!
//! This module provides [`RbTreeMap<K, V, A>`], a wrapper around
//! [`AllocatedRbTreeMap`] that owns an allocator, making it safe and
//! ergonomic to use.

use core::borrow::Borrow;
use core::fmt;
use core::fmt::Debug;
use core::mem::ManuallyDrop;
use core::ops::Index;

#[cfg(feature = "std")]
use alloc::boxed::Box;
#[cfg(feature = "std")]
use alloc::string::String;
#[cfg(feature = "std")]
use std::error::Error;

use allocator_api2::alloc::{Allocator, Global};

use allocated::{AllocResult, AllocResultExt, DropIn};

use super::{
    AllocatedRbTreeMap, Entry, Iter, IterColored, IterMut, Keys, OccupiedEntry, Values, ValuesMut,
};
use crate::error::RemoveError;

/// An ergonomic red-black tree map that owns its allocator.
///
/// This is the recommended type for most use cases. It wraps
/// [`AllocatedRbTreeMap`] and provides safe methods without requiring
/// `unsafe` blocks or passing allocators manually.
///
/// # Example
///
/// ```
/// use allocated_rbtree::{RbTreeMap, RemoveError};
///
/// let mut map = RbTreeMap::new();
/// map.insert(1, "one").unwrap();
/// map.insert(2, "two").unwrap();
///
/// assert_eq!(map.get(&1), Some(&"one"));
/// assert_eq!(map[&2], "two");
/// assert_eq!(map.remove(&3), Err(RemoveError::KeyNotFound));
/// assert_eq!(map.len(), 2);
/// ```
pub struct RbTreeMap<K, V, A: Allocator = Global> {
    alloc: A,
    pub(super) raw: ManuallyDrop<AllocatedRbTreeMap<K, V>>,
}

impl<K, V> RbTreeMap<K, V> {
    /// Create a new empty map using the global allocator.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::new_in(Global)
    }
}

impl<K, V> Default for RbTreeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, A: Allocator> Drop for RbTreeMap<K, V, A> {
    fn drop(&mut self) {
        // SAFETY: `self.raw` was allocated by `self.alloc`
        unsafe {
            self.raw.drop_in(&self.alloc);
        }
    }
}

impl<K, V, A: Allocator> RbTreeMap<K, V, A> {
    /// Create a new empty map using the provided allocator.
    ///
    /// Nothing is allocated until the first insert.
    pub fn new_in(alloc: A) -> Self {
        Self {
            alloc,
            raw: ManuallyDrop::new(AllocatedRbTreeMap::new()),
        }
    }

    /// Returns a reference to the underlying allocator.
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Returns the number of elements in the map.
    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the map contains no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Returns the key stored at the root of the tree, if any.
    pub fn root_key(&self) -> Option<&K> {
        self.raw.root_key()
    }

    /// Returns `true` if the map contains a value for the specified key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.raw.contains_key(key)
    }

    /// Returns a reference to the value corresponding to the key.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.raw.get(key)
    }

    /// Returns the key-value pair corresponding to the supplied key.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.raw.get_key_value(key)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.raw.get_mut(key)
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map did not have this key present, `None` is returned.
    /// If the map did have this key present, the value is updated,
    /// and the old value is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if allocating the new node fails.
    pub fn insert(&mut self, key: K, value: V) -> AllocResult<Option<V>>
    where
        K: Ord,
    {
        // SAFETY: `self.alloc` was used to allocate `self.raw`
        unsafe { self.raw.insert_in(&self.alloc, key, value) }
    }

    /// Removes a key from the map, returning the value at the key.
    ///
    /// # Errors
    ///
    /// Returns [`RemoveError::EmptyTree`] if the map is empty and
    /// [`RemoveError::KeyNotFound`] if it holds no entry for `key`.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<V, RemoveError>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        // SAFETY: `self.alloc` was used to allocate `self.raw`
        unsafe { self.raw.remove_in(&self.alloc, key) }
    }

    /// Removes a key from the map, returning the stored key and value.
    ///
    /// # Errors
    ///
    /// See [`RbTreeMap::remove`].
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Result<(K, V), RemoveError>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        // SAFETY: `self.alloc` was used to allocate `self.raw`
        unsafe { self.raw.remove_entry_in(&self.alloc, key) }
    }

    /// Clears the map, removing all key-value pairs.
    pub fn clear(&mut self) {
        // SAFETY: `self.alloc` was used to allocate `self.raw`
        unsafe { self.raw.clear_in(&self.alloc) }
    }

    /// Gets the given key's corresponding entry in the map for in-place manipulation.
    pub fn entry(&mut self, key: K) -> Entry<'_, '_, A, K, V>
    where
        K: Ord,
    {
        // SAFETY: `self.alloc` was used to allocate `self.raw`
        unsafe { self.raw.entry_in(&self.alloc, key) }
    }

    /// Gets the first entry in the map for in-place manipulation.
    pub fn first_entry(&mut self) -> Option<OccupiedEntry<'_, '_, A, K, V>> {
        // SAFETY: `self.alloc` was used to allocate `self.raw`
        unsafe { self.raw.first_entry_in(&self.alloc) }
    }

    /// Gets the last entry in the map for in-place manipulation.
    pub fn last_entry(&mut self) -> Option<OccupiedEntry<'_, '_, A, K, V>> {
        // SAFETY: `self.alloc` was used to allocate `self.raw`
        unsafe { self.raw.last_entry_in(&self.alloc) }
    }

    /// Removes and returns the first element in the map.
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.first_entry().map(OccupiedEntry::remove_entry)
    }

    /// Removes and returns the last element in the map.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.last_entry().map(OccupiedEntry::remove_entry)
    }

    /// Returns the first key-value pair in the map.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.raw.first_key_value()
    }

    /// Returns the last key-value pair in the map.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.raw.last_key_value()
    }

    /// Gets an iterator over the entries of the map, sorted by key.
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.raw.iter()
    }

    /// Gets a mutable iterator over the entries of the map, sorted by key.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        self.raw.iter_mut()
    }

    /// Gets an iterator over the keys of the map, in sorted order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        self.raw.keys()
    }

    /// Gets an iterator over the values of the map, in order by key.
    pub fn values(&self) -> Values<'_, K, V> {
        self.raw.values()
    }

    /// Gets a mutable iterator over the values of the map, in order by key.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        self.raw.values_mut()
    }

    /// Gets an iterator over the keys of the map and the color of each node.
    pub fn iter_colored(&self) -> IterColored<'_, K, V> {
        self.raw.iter_colored()
    }
}

#[cfg(feature = "std")]
impl<K: Debug, V: Debug, A: Allocator> RbTreeMap<K, V, A> {
    /// Renders the tree as a Graphviz `digraph`.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the rendering could not be produced.
    pub fn to_dot(&self) -> Result<String, Box<dyn Error>> {
        self.raw.to_dot()
    }
}

impl<K, V, A: Allocator, Q> Index<&Q> for RbTreeMap<K, V, A>
where
    K: Borrow<Q>,
    Q: Ord + ?Sized,
{
    type Output = V;

    /// Returns a reference to the value corresponding to the supplied key.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present in the map.
    #[inline]
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<K: Debug, V: Debug, A: Allocator> Debug for RbTreeMap<K, V, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(&*self.raw, f)
    }
}

impl<'s, K, V, A: Allocator> IntoIterator for &'s RbTreeMap<K, V, A> {
    type IntoIter = Iter<'s, K, V>;
    type Item = (&'s K, &'s V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'s, K, V, A: Allocator> IntoIterator for &'s mut RbTreeMap<K, V, A> {
    type IntoIter = IterMut<'s, K, V>;
    type Item = (&'s K, &'s mut V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for RbTreeMap<K, V> {
    /// Creates a map from an iterator of key-value pairs.
    ///
    /// If the iterator yields multiple values for the same key, the last value wins.
    ///
    /// # Panics
    ///
    /// Panics if allocation fails during construction.
    ///
    /// # Examples
    ///
    /// ```
    /// use allocated_rbtree::RbTreeMap;
    ///
    /// let items = vec![(3, "c"), (1, "a"), (2, "b"), (1, "z")];
    /// let map: RbTreeMap<_, _> = items.into_iter().collect();
    ///
    /// assert_eq!(map.len(), 3);
    /// assert_eq!(map.get(&1), Some(&"z"));
    /// ```
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        use allocated::FromIteratorIn;

        let alloc = Global;
        let raw = AllocatedRbTreeMap::from_iter_in(&alloc, iter)
            .handle_alloc_error()
            .into_inner();
        Self { alloc, raw }
    }
}

impl<K: Ord, V, A: Allocator> Extend<(K, V)> for RbTreeMap<K, V, A> {
    /// Extends the map with the contents of an iterator.
    ///
    /// If the iterator yields duplicate keys, the last value wins.
    ///
    /// # Panics
    ///
    /// Panics if allocation fails during insertion.
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            let _ = self.insert(k, v).handle_alloc_error();
        }
    }
}
