use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::fmt::Debug;
use core::marker::PhantomData;
use core::ptr::NonNull;

#[cfg(feature = "std")]
use alloc::boxed::Box;
#[cfg(feature = "std")]
use alloc::string::String;
#[cfg(feature = "std")]
use std::error::Error;
#[cfg(feature = "std")]
use std::io::Write;

extern crate alloc;
#[cfg(feature = "std")]
use alloc::vec::Vec;

use allocator_api2::alloc::Allocator;

use allocated::AllocResult;
use allocated::DropGuard;
use allocated::DropGuardResult;
use allocated::DropIn;
use allocated::FromIteratorIn;
use allocated::IntoIteratorIn;

use crate::error::RemoveError;

mod balance;
mod entry;
mod iters;
mod node;
mod wrapper;

#[cfg(test)]
mod tests;

pub use entry::{Entry, OccupiedEntry, VacantEntry};
pub use iters::{
    IntoIter, IntoKeys, IntoValues, Iter, IterColored, IterMut, Keys, Values, ValuesMut,
};
pub use node::Color;
use node::{IntoIter as NodeIntoIter, Link, NodePtr, Range, Side};
pub use wrapper::RbTreeMap;

/// A red-black tree map implementation using the allocated pattern.
///
/// This is the low-level "allocated" type that requires manual allocator passing.
/// For most use cases, prefer the [`RbTreeMap`] wrapper which owns its allocator
/// and provides a safe, ergonomic API.
///
/// Every entry lives in its own node. Nodes link to their parent as well as
/// their children, and the tree is kept balanced by the usual red-black rules:
/// the root is black, a red node never has a red child, and every path from a
/// node down to a missing child crosses the same number of black nodes. Lookup,
/// insertion and removal are therefore `O(log n)`.
///
/// # Examples
///
/// ```
/// use allocated_rbtree::AllocatedRbTreeMap;
/// use allocated::CountingAllocator;
///
/// let alloc = CountingAllocator::default();
/// let mut map = AllocatedRbTreeMap::<u32, String>::new_in(&alloc);
///
/// unsafe {
///     map.insert_in(&alloc, 1, "one".to_string())?;
///     map.insert_in(&alloc, 2, "two".to_string())?;
/// }
///
/// assert_eq!(map.len(), 2);
/// assert_eq!(alloc.n_allocations(), 2);
/// # Ok::<(), allocated::AllocErrorWithLayout>(())
/// ```
pub struct AllocatedRbTreeMap<K, V> {
    root: Link<K, V>,
    n: usize,
    phantom: PhantomData<(K, V)>,
}

// SAFETY: the map owns its nodes exclusively; all mutation goes through `&mut self`.
unsafe impl<K: Send, V: Send> Send for AllocatedRbTreeMap<K, V> {}
// SAFETY: `&self` methods only read through the node links.
unsafe impl<K: Sync, V: Sync> Sync for AllocatedRbTreeMap<K, V> {}

/// Where a descent for a key ended.
pub(crate) enum Search<K, V> {
    /// A node holds the key.
    Found(NodePtr<K, V>),
    /// The key belongs in the empty `Side` slot of `parent`, or at the root
    /// when `parent` is `None`.
    GoDown(Link<K, V>, Side),
}

impl<K, V> AllocatedRbTreeMap<K, V> {
    /// Creates an empty map. No memory is allocated until the first insert.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            root: None,
            n: 0,
            phantom: PhantomData,
        }
    }

    /// Creates an empty map guarded by `alloc`, so that it is released if the
    /// caller bails out before taking ownership.
    pub fn new_in<A: Allocator>(alloc: &A) -> DropGuard<Self, &A> {
        // SAFETY: an empty map owns no allocations, so any allocator matches.
        unsafe { DropGuard::new(Self::new(), alloc) }
    }

    /// Returns `true` if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Returns the number of elements in the map.
    pub fn len(&self) -> usize {
        self.n
    }

    /// Returns the key stored at the root of the tree, if any.
    ///
    /// Mostly useful for inspecting the shape of small trees.
    pub fn root_key(&self) -> Option<&K> {
        // SAFETY: the node is owned by `self`, which is borrowed for the result's lifetime
        self.root.map(|root| unsafe { root.key() })
    }

    pub(crate) fn search<Q>(&self, key: &Q) -> Search<K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut parent = None;
        let mut side = Side::Left;
        let mut cursor = self.root;

        while let Some(node) = cursor {
            // SAFETY: the node is owned by `self`
            let node_key = unsafe { node.key() };
            side = match key.cmp(node_key.borrow()) {
                Ordering::Equal => return Search::Found(node),
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
            };
            parent = Some(node);
            cursor = node.child(side);
        }

        Search::GoDown(parent, side)
    }

    fn find<Q>(&self, key: &Q) -> Link<K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.search(key) {
            Search::Found(node) => Some(node),
            Search::GoDown(..) => None,
        }
    }

    /// Returns `true` if the map contains a value for the specified key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Returns a reference to the value corresponding to the key.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        // SAFETY: the node is owned by `self`, which is borrowed for the result's lifetime
        self.find(key).map(|node| unsafe { node.value() })
    }

    /// Returns the key-value pair corresponding to the supplied key.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        // SAFETY: the node is owned by `self`, which is borrowed for the result's lifetime
        self.find(key).map(|node| unsafe { node.key_value() })
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        // SAFETY: `self` is mutably borrowed for the result's lifetime
        self.find(key).map(|node| unsafe { node.value_mut() })
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map did not have this key present, `None` is returned.
    /// If the map did have this key present, the value is updated and the old
    /// value is returned; the key itself and the shape of the tree are left
    /// untouched.
    ///
    /// # Safety
    ///
    /// `alloc` MUST be the allocator used to allocate this object.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the allocation fails.
    pub unsafe fn insert_in<A: Allocator>(
        &mut self,
        alloc: &A,
        key: K,
        value: V,
    ) -> AllocResult<Option<V>>
    where
        K: Ord,
    {
        // SAFETY: requirements match function requirements
        let entry = unsafe { self.entry_in(alloc, key) };

        entry.insert(value)
    }

    /// Removes a key from the map, returning the stored key and value.
    ///
    /// # Safety
    ///
    /// `alloc` MUST be the allocator used to allocate this object.
    ///
    /// # Errors
    ///
    /// Returns [`RemoveError::EmptyTree`] if the map is empty and
    /// [`RemoveError::KeyNotFound`] if it holds no entry for `key`.
    pub unsafe fn remove_entry_in<A: Allocator, Q>(
        &mut self,
        alloc: &A,
        key: &Q,
    ) -> Result<(K, V), RemoveError>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        if self.is_empty() {
            return Err(RemoveError::EmptyTree);
        }

        match self.find(key) {
            // SAFETY: requirements match function requirements
            Some(node) => Ok(unsafe { self.remove_node_in(alloc, node) }),
            None => Err(RemoveError::KeyNotFound),
        }
    }

    /// Removes a key from the map, returning the value at the key.
    ///
    /// # Safety
    ///
    /// `alloc` MUST be the allocator used to allocate this object.
    ///
    /// # Errors
    ///
    /// See [`AllocatedRbTreeMap::remove_entry_in`].
    pub unsafe fn remove_in<A: Allocator, Q>(&mut self, alloc: &A, key: &Q) -> Result<V, RemoveError>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        // SAFETY: requirements match function requirements
        unsafe { self.remove_entry_in(alloc, key) }.map(|(_, v)| v)
    }

    /// Clears the map, removing all elements.
    ///
    /// # Safety
    ///
    /// `alloc` MUST be the allocator used to allocate this object.
    pub unsafe fn clear_in<A: Allocator>(&mut self, alloc: &A) {
        log::debug!("clearing red-black tree of {} entries", self.n);
        // SAFETY: requirements match function requirements
        unsafe { self.drop_in(alloc) };
    }

    /// Returns an iterator over the key-value pairs of the map, in sorted order by key.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.range())
    }

    /// Returns a mutable iterator over the entries of the map, in sorted order by key.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(self.range())
    }

    /// Returns an iterator over the keys of the map, in sorted order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys {
            inner: self.iter(),
        }
    }

    /// Returns an iterator over the values of the map, in order by key.
    pub fn values(&self) -> Values<'_, K, V> {
        Values {
            inner: self.iter(),
        }
    }

    /// Returns a mutable iterator over the values of the map, in order by key.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut::new(self.range())
    }

    /// Returns an iterator over the keys of the map and the color of the node
    /// holding each, in sorted order.
    pub fn iter_colored(&self) -> IterColored<'_, K, V> {
        IterColored::new(self.range())
    }

    fn range(&self) -> Range<K, V> {
        Range::new(self.root, self.n)
    }

    fn into_node_iter_in<A: Allocator>(self, alloc: &A) -> NodeIntoIter<'_, K, V, A> {
        // SAFETY: `self` is consumed, so nothing else refers to its nodes
        unsafe { NodeIntoIter::new(alloc, self.root, self.n) }
    }

    /// Converts the map into an iterator over its keys, freeing every node.
    ///
    /// # Safety
    ///
    /// `alloc` MUST be the allocator used to allocate this object.
    pub unsafe fn into_keys_in<A: Allocator>(self, alloc: &A) -> IntoKeys<'_, K, V, A> {
        IntoKeys {
            inner: self.into_node_iter_in(alloc),
        }
    }

    /// Converts the map into an iterator over its values, freeing every node.
    ///
    /// # Safety
    ///
    /// `alloc` MUST be the allocator used to allocate this object.
    pub unsafe fn into_values_in<A: Allocator>(self, alloc: &A) -> IntoValues<'_, K, V, A> {
        IntoValues {
            inner: self.into_node_iter_in(alloc),
        }
    }

    /// Gets the given key's corresponding entry in the map for in-place manipulation.
    ///
    /// # Safety
    ///
    /// `alloc` MUST be the allocator used to allocate this object.
    pub unsafe fn entry_in<'a, 's, A: Allocator>(
        &'s mut self,
        alloc: &'a A,
        key: K,
    ) -> Entry<'a, 's, A, K, V>
    where
        K: Ord,
    {
        let search = self.search(&key);
        let map = NonNull::from(self);
        match search {
            // SAFETY: requirements match function requirements
            Search::Found(node) => Entry::Occupied(unsafe { OccupiedEntry::new(alloc, node, map) }),
            Search::GoDown(parent, side) => {
                // SAFETY: requirements match function requirements
                Entry::Vacant(unsafe { VacantEntry::new(alloc, key, parent, side, map) })
            }
        }
    }

    /// Gets the entry holding the smallest key, for in-place manipulation.
    ///
    /// # Safety
    ///
    /// `alloc` MUST be the allocator used to allocate this object.
    pub unsafe fn first_entry_in<'a, 's, A: Allocator>(
        &'s mut self,
        alloc: &'a A,
    ) -> Option<OccupiedEntry<'a, 's, A, K, V>> {
        let node = self.root?.minimum();
        // SAFETY: requirements match function requirements
        Some(unsafe { OccupiedEntry::new(alloc, node, NonNull::from(self)) })
    }

    /// Gets the entry holding the largest key, for in-place manipulation.
    ///
    /// # Safety
    ///
    /// `alloc` MUST be the allocator used to allocate this object.
    pub unsafe fn last_entry_in<'a, 's, A: Allocator>(
        &'s mut self,
        alloc: &'a A,
    ) -> Option<OccupiedEntry<'a, 's, A, K, V>> {
        let node = self.root?.maximum();
        // SAFETY: requirements match function requirements
        Some(unsafe { OccupiedEntry::new(alloc, node, NonNull::from(self)) })
    }

    /// Returns a reference to the first key-value pair in the map.
    /// The key in this pair is the minimum key in the map.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        let node = self.root?.minimum();
        // SAFETY: the node is owned by `self`, which is borrowed for the result's lifetime
        Some(unsafe { node.key_value() })
    }

    /// Returns a reference to the last key-value pair in the map.
    /// The key in this pair is the maximum key in the map.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        let node = self.root?.maximum();
        // SAFETY: the node is owned by `self`, which is borrowed for the result's lifetime
        Some(unsafe { node.key_value() })
    }
}

impl<K, V> Default for AllocatedRbTreeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Debug, V: Debug> Debug for AllocatedRbTreeMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(feature = "std")]
impl<K: Debug, V: Debug> AllocatedRbTreeMap<K, V> {
    /// Renders the tree as a Graphviz `digraph`, one filled record per node
    /// colored like the node itself.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the rendering could not be produced.
    pub fn to_dot(&self) -> Result<String, Box<dyn Error>> {
        let mut data = Vec::default();

        data.write_all(b"digraph G {\n")?;
        if let Some(root) = self.root {
            root.to_dot(&mut data)?;
        }
        data.write_all(b"}\n")?;

        Ok(String::from_utf8(data)?)
    }
}

impl<'a, K: Ord, V, A: Allocator> FromIteratorIn<'a, (K, V), A> for AllocatedRbTreeMap<K, V> {
    fn from_iter_in<T>(alloc: &'a A, iter: T) -> DropGuardResult<Self, &'a A>
    where
        T: IntoIterator<Item = (K, V)>,
    {
        let mut map: DropGuard<Self, &'a A> = Self::new_in(alloc);

        for (k, v) in iter {
            // Safety: `alloc` was used to create the `map`
            unsafe {
                map.insert_in(alloc, k, v)?;
            }
        }

        Ok(map)
    }
}

impl<K, V> DropIn for AllocatedRbTreeMap<K, V> {
    /// # Safety
    ///
    /// `alloc` must be the allocator used to allocate this object.
    unsafe fn drop_in<A: Allocator>(&mut self, alloc: &A) {
        if let Some(root) = self.root.take() {
            // SAFETY: requirements match function requirements
            unsafe { root.drop_tree_in(alloc) };
        }
        self.n = 0;
    }
}

impl<K, V> allocated::RecursiveDropIn for AllocatedRbTreeMap<K, V>
where
    K: DropIn,
    V: DropIn,
{
    /// # Safety
    ///
    /// `alloc` must be the allocator used to allocate this object.
    unsafe fn recursive_drop_in<A: Allocator>(&mut self, alloc: &A) {
        let n = core::mem::take(&mut self.n);
        // SAFETY: the root is taken out of `self`, so the iterator is its only owner
        let nodes = unsafe { NodeIntoIter::new(alloc, self.root.take(), n) };
        for (mut k, mut v) in nodes {
            // SAFETY: alloc is the same allocator used for the map's contents.
            unsafe { k.drop_in(alloc) };
            // SAFETY: alloc is the same allocator used for the map's contents.
            unsafe { v.drop_in(alloc) };
        }
    }
}

impl<'a, K, V, A: Allocator + 'a> IntoIteratorIn<'a, A> for AllocatedRbTreeMap<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<'a, K, V, A>;

    unsafe fn into_iter_in(self, alloc: &'a A) -> Self::IntoIter {
        IntoIter {
            inner: self.into_node_iter_in(alloc),
        }
    }
}

impl<'s, K, V> IntoIterator for &'s AllocatedRbTreeMap<K, V> {
    type IntoIter = Iter<'s, K, V>;
    type Item = (&'s K, &'s V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'s, K, V> IntoIterator for &'s mut AllocatedRbTreeMap<K, V> {
    type IntoIter = IterMut<'s, K, V>;
    type Item = (&'s K, &'s mut V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
