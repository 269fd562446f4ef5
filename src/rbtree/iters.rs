use core::iter::FusedIterator;
use core::marker::PhantomData;

use allocator_api2::alloc::Allocator;

use super::node::{Color, IntoIter as NodeIntoIter, Range};

/// An iterator over the key-value pairs of an `RbTreeMap`, in sorted order by key.
///
/// This struct is created by the [`iter`](super::AllocatedRbTreeMap::iter) method on
/// [`AllocatedRbTreeMap`](super::AllocatedRbTreeMap). See its documentation for more.
pub struct Iter<'a, K, V> {
    range: Range<K, V>,
    phantom: PhantomData<&'a (K, V)>,
}

impl<K, V> Iter<'_, K, V> {
    pub(super) fn new(range: Range<K, V>) -> Self {
        Self {
            range,
            phantom: PhantomData,
        }
    }
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self::new(self.range.clone())
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        // SAFETY: the map is borrowed for 'a
        self.range.next_node().map(|node| unsafe { node.key_value() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.range.len(), Some(self.range.len()))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        // SAFETY: the map is borrowed for 'a
        self.range.next_back_node().map(|node| unsafe { node.key_value() })
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// A mutable iterator over the entries of an `RbTreeMap`, in sorted order by key.
///
/// This struct is created by the [`iter_mut`](super::AllocatedRbTreeMap::iter_mut) method on
/// [`AllocatedRbTreeMap`](super::AllocatedRbTreeMap). See its documentation for more.
pub struct IterMut<'a, K, V> {
    range: Range<K, V>,
    phantom: PhantomData<&'a mut (K, V)>,
}

impl<K, V> IterMut<'_, K, V> {
    pub(super) fn new(range: Range<K, V>) -> Self {
        Self {
            range,
            phantom: PhantomData,
        }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        // SAFETY: the map is mutably borrowed for 'a and each node is yielded once
        self.range.next_node().map(|node| unsafe { node.key_value_mut() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.range.len(), Some(self.range.len()))
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        // SAFETY: the map is mutably borrowed for 'a and each node is yielded once
        self.range.next_back_node().map(|node| unsafe { node.key_value_mut() })
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// An iterator over the keys of an `RbTreeMap`, in sorted order.
///
/// This struct is created by the [`keys`](super::AllocatedRbTreeMap::keys) method on
/// [`AllocatedRbTreeMap`](super::AllocatedRbTreeMap). See its documentation for more.
pub struct Keys<'a, K, V> {
    pub(super) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

/// An iterator over the values of an `RbTreeMap`, in order by key.
///
/// This struct is created by the [`values`](super::AllocatedRbTreeMap::values) method on
/// [`AllocatedRbTreeMap`](super::AllocatedRbTreeMap). See its documentation for more.
pub struct Values<'a, K, V> {
    pub(super) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

/// A mutable iterator over the values of an `RbTreeMap`, in order by key.
///
/// This struct is created by the [`values_mut`](super::AllocatedRbTreeMap::values_mut) method on
/// [`AllocatedRbTreeMap`](super::AllocatedRbTreeMap). See its documentation for more.
pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<K, V> ValuesMut<'_, K, V> {
    pub(super) fn new(range: Range<K, V>) -> Self {
        Self {
            inner: IterMut::new(range),
        }
    }
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for ValuesMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}

/// An iterator over the keys of an `RbTreeMap` paired with the color of the
/// node holding each, in sorted order by key.
///
/// This struct is created by the [`iter_colored`](super::AllocatedRbTreeMap::iter_colored)
/// method on [`AllocatedRbTreeMap`](super::AllocatedRbTreeMap).
pub struct IterColored<'a, K, V> {
    range: Range<K, V>,
    phantom: PhantomData<&'a (K, V)>,
}

impl<K, V> IterColored<'_, K, V> {
    pub(super) fn new(range: Range<K, V>) -> Self {
        Self {
            range,
            phantom: PhantomData,
        }
    }
}

impl<'a, K, V> Iterator for IterColored<'a, K, V> {
    type Item = (&'a K, Color);

    fn next(&mut self) -> Option<Self::Item> {
        self.range
            .next_node()
            // SAFETY: the map is borrowed for 'a
            .map(|node| (unsafe { node.key() }, node.color()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.range.len(), Some(self.range.len()))
    }
}

impl<K, V> DoubleEndedIterator for IterColored<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.range
            .next_back_node()
            // SAFETY: the map is borrowed for 'a
            .map(|node| (unsafe { node.key() }, node.color()))
    }
}

impl<K, V> ExactSizeIterator for IterColored<'_, K, V> {}

/// An owning iterator over the key-value pairs of an `RbTreeMap`, in sorted order by key.
///
/// This struct is created by the [`into_iter_in`](allocated::IntoIteratorIn::into_iter_in)
/// method on [`AllocatedRbTreeMap`](super::AllocatedRbTreeMap). Entries not
/// consumed are freed when the iterator is dropped.
pub struct IntoIter<'a, K, V, A: 'a + Allocator> {
    pub(super) inner: NodeIntoIter<'a, K, V, A>,
}

impl<'a, K, V, A: 'a + Allocator> Iterator for IntoIter<'a, K, V, A> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V, A: 'a + Allocator> ExactSizeIterator for IntoIter<'a, K, V, A> {}

/// An owning iterator over the keys of an `RbTreeMap`, in sorted order.
///
/// This struct is created by the [`into_keys_in`](super::AllocatedRbTreeMap::into_keys_in)
/// method on [`AllocatedRbTreeMap`](super::AllocatedRbTreeMap).
pub struct IntoKeys<'a, K, V, A: 'a + Allocator> {
    pub(super) inner: NodeIntoIter<'a, K, V, A>,
}

impl<'a, K, V, A: 'a + Allocator> Iterator for IntoKeys<'a, K, V, A> {
    type Item = K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// An owning iterator over the values of an `RbTreeMap`, in order by key.
///
/// This struct is created by the [`into_values_in`](super::AllocatedRbTreeMap::into_values_in)
/// method on [`AllocatedRbTreeMap`](super::AllocatedRbTreeMap).
pub struct IntoValues<'a, K, V, A: 'a + Allocator> {
    pub(super) inner: NodeIntoIter<'a, K, V, A>,
}

impl<'a, K, V, A: 'a + Allocator> Iterator for IntoValues<'a, K, V, A> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
