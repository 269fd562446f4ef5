use core::marker::PhantomData;
use core::ptr::NonNull;

use allocated::AllocResult;
use allocator_api2::alloc::Allocator;

use super::node::{Link, NodePtr, Side};
use super::AllocatedRbTreeMap;

/// A view into a single entry in a map, which may either be vacant or occupied.
///
/// This enum is constructed from the [`entry`](super::wrapper::RbTreeMap::entry) method on
/// [`RbTreeMap`](super::wrapper::RbTreeMap).
#[allow(clippy::module_name_repetitions)]
pub enum Entry<'a, 's, A: Allocator, K, V> {
    /// A vacant entry.
    Vacant(VacantEntry<'a, 's, A, K, V>),
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, 's, A, K, V>),
}

/// A view into a vacant entry in an `RbTreeMap`.
/// It is part of the [`Entry`] enum.
///
/// The entry remembers the empty child slot the search for its key ended in,
/// so inserting through it does not search again.
#[allow(clippy::module_name_repetitions)]
pub struct VacantEntry<'a, 's, A: Allocator, K, V> {
    alloc: &'a A,
    key: K,
    /// Parent of the empty slot, `None` when the map is empty.
    parent: Link<K, V>,
    side: Side,
    map: NonNull<AllocatedRbTreeMap<K, V>>,
    phantom: PhantomData<&'s mut AllocatedRbTreeMap<K, V>>,
}

/// A view into an occupied entry in an `RbTreeMap`.
/// It is part of the [`Entry`] enum.
#[allow(clippy::module_name_repetitions)]
pub struct OccupiedEntry<'a, 's, A: Allocator, K, V> {
    alloc: &'a A,
    node: NodePtr<K, V>,
    map: NonNull<AllocatedRbTreeMap<K, V>>,
    phantom: PhantomData<&'s mut AllocatedRbTreeMap<K, V>>,
}

impl<'a, 's, A: Allocator, K, V> VacantEntry<'a, 's, A, K, V> {
    /// # Safety
    ///
    /// `alloc` MUST be the allocator that allocated `map`, and `parent`/`side`
    /// must name an empty slot of `map` where `key` belongs.
    pub(super) unsafe fn new(
        alloc: &'a A,
        key: K,
        parent: Link<K, V>,
        side: Side,
        map: NonNull<AllocatedRbTreeMap<K, V>>,
    ) -> Self {
        Self {
            alloc,
            key,
            parent,
            side,
            map,
            phantom: PhantomData,
        }
    }

    /// Gets a reference to the key that would be used when inserting a value through the `VacantEntry`.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Takes ownership of the key.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Returns a reference to the key that would be immediately below (predecessor of)
    /// the vacant entry's key in the map's sorted order.
    /// Returns `None` if the vacant entry would be the minimum key.
    pub fn key_below(&self) -> Option<&K> {
        let parent = self.parent?;
        let below = match self.side {
            Side::Right => Some(parent),
            Side::Left => parent.predecessor(),
        };
        // SAFETY: the map is borrowed for as long as this entry lives
        below.map(|node| unsafe { node.key() })
    }

    /// Returns a reference to the key that would be immediately above (successor of)
    /// the vacant entry's key in the map's sorted order.
    /// Returns `None` if the vacant entry would be the maximum key.
    pub fn key_above(&self) -> Option<&K> {
        let parent = self.parent?;
        let above = match self.side {
            Side::Left => Some(parent),
            Side::Right => parent.successor(),
        };
        // SAFETY: the map is borrowed for as long as this entry lives
        above.map(|node| unsafe { node.key() })
    }

    /// Sets the value of the entry with the `VacantEntry`'s key, and returns a
    /// mutable reference to it.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the allocation fails; the map is left unchanged.
    pub fn insert(mut self, value: V) -> AllocResult<&'s mut V> {
        // SAFETY: the entry holds the map's unique borrow for 's
        let map = unsafe { self.map.as_mut() };
        let node = map.attach_in(self.alloc, self.parent, self.side, self.key, value)?;
        // SAFETY: the node now belongs to the map, which is borrowed for 's
        Ok(unsafe { node.value_mut() })
    }
}

impl<'a, 's, A: Allocator, K, V> OccupiedEntry<'a, 's, A, K, V> {
    /// # Safety
    ///
    /// `alloc` MUST be the allocator that allocated `map`, and `node` must be
    /// one of its nodes.
    pub(crate) unsafe fn new(
        alloc: &'a A,
        node: NodePtr<K, V>,
        map: NonNull<AllocatedRbTreeMap<K, V>>,
    ) -> Self {
        OccupiedEntry {
            alloc,
            node,
            map,
            phantom: PhantomData,
        }
    }

    /// Gets a reference to the key in the entry.
    #[must_use]
    pub fn key(&self) -> &K {
        // SAFETY: the node is live while the entry borrows the map
        unsafe { self.node.key() }
    }

    /// Gets a reference to the value in the entry.
    #[must_use]
    pub fn get(&self) -> &V {
        // SAFETY: the node is live while the entry borrows the map
        unsafe { self.node.value() }
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        // SAFETY: the entry holds the map's unique borrow
        unsafe { self.node.value_mut() }
    }

    /// Converts the entry into a mutable reference to its value.
    #[must_use]
    pub fn into_mut(self) -> &'s mut V {
        // SAFETY: the entry holds the map's unique borrow for 's
        unsafe { self.node.value_mut() }
    }

    /// Sets the value of the entry with the `OccupiedEntry`'s key, and returns the entry's old value.
    pub fn insert(&mut self, value: V) -> V {
        self.node.replace_value(value)
    }

    /// Takes the value of the entry out of the map, and returns it.
    #[must_use]
    pub fn remove(self) -> V {
        self.remove_entry().1
    }

    /// Takes the key-value pair out of the map, and returns it.
    #[must_use]
    pub fn remove_entry(mut self) -> (K, V) {
        // SAFETY: the entry holds the map's unique borrow
        let map = unsafe { self.map.as_mut() };
        // SAFETY: `self.alloc` allocated the map and `self.node` is one of its nodes
        unsafe { map.remove_node_in(self.alloc, self.node) }
    }
}

impl<'a, 's, A: Allocator, K, V> Entry<'a, 's, A, K, V> {
    /// Provides in-place mutable access to an occupied entry before any potential inserts into the map.
    #[must_use]
    pub fn and_modify<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        match self {
            Self::Occupied(mut o) => {
                f(o.get_mut());
                Self::Occupied(o)
            }
            Self::Vacant(v) => Self::Vacant(v),
        }
    }

    /// Returns a reference to this entry's key.
    #[inline]
    pub fn key(&self) -> &K {
        match self {
            Self::Occupied(o) => o.key(),
            Self::Vacant(v) => v.key(),
        }
    }

    /// Ensures a value is in the entry by inserting the provided value if empty,
    /// and returns the old value if the entry was occupied.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the allocation fails.
    pub fn insert(self, v: V) -> AllocResult<Option<V>> {
        match self {
            Self::Occupied(mut o) => Ok(Some(o.insert(v))),
            Self::Vacant(o) => {
                o.insert(v)?;
                Ok(None)
            }
        }
    }

    /// Ensures a value is in the entry by inserting `default` if empty, and
    /// returns a mutable reference to the value in the entry.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the allocation fails.
    pub fn or_insert(self, default: V) -> AllocResult<&'s mut V> {
        match self {
            Self::Occupied(o) => Ok(o.into_mut()),
            Self::Vacant(v) => v.insert(default),
        }
    }

    /// Ensures a value is in the entry by inserting the result of `default`
    /// if empty, and returns a mutable reference to the value in the entry.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the allocation fails.
    pub fn or_insert_with<F>(self, default: F) -> AllocResult<&'s mut V>
    where
        F: FnOnce() -> V,
    {
        match self {
            Self::Occupied(o) => Ok(o.into_mut()),
            Self::Vacant(v) => v.insert(default()),
        }
    }

    /// Like [`Entry::or_insert_with`], but `default` is handed the key.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the allocation fails.
    pub fn or_insert_with_key<F>(self, default: F) -> AllocResult<&'s mut V>
    where
        F: FnOnce(&K) -> V,
    {
        match self {
            Self::Occupied(o) => Ok(o.into_mut()),
            Self::Vacant(v) => {
                let value = default(v.key());
                v.insert(value)
            }
        }
    }

    /// Ensures a value is in the entry by inserting `V::default()` if empty.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the allocation fails.
    pub fn or_default(self) -> AllocResult<&'s mut V>
    where
        V: Default,
    {
        self.or_insert_with(V::default)
    }

    /// Returns the `OccupiedEntry` if this entry is occupied, panics otherwise.
    pub fn unwrap_occupied(self) -> OccupiedEntry<'a, 's, A, K, V> {
        match self {
            Self::Occupied(o) => o,
            Self::Vacant(_) => panic!("Expected Occupied(_)"),
        }
    }
}
