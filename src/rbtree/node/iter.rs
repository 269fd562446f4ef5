use allocator_api2::alloc::Allocator;

use super::{Link, NodePtr};

/// A double-ended walk over a run of nodes in key order.
///
/// `front` and `back` are the next nodes to yield from either end; `remaining`
/// stops the two ends from crossing.
pub struct Range<K, V> {
    front: Link<K, V>,
    back: Link<K, V>,
    remaining: usize,
}

impl<K, V> Range<K, V> {
    pub(crate) fn new(root: Link<K, V>, len: usize) -> Self {
        match root {
            Some(root) if len > 0 => Self {
                front: Some(root.minimum()),
                back: Some(root.maximum()),
                remaining: len,
            },
            _ => Self::empty(),
        }
    }

    pub(crate) fn empty() -> Self {
        Self {
            front: None,
            back: None,
            remaining: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.remaining
    }

    pub(crate) fn next_node(&mut self) -> Option<NodePtr<K, V>> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.front?;
        self.front = node.successor();
        self.remaining -= 1;
        Some(node)
    }

    pub(crate) fn next_back_node(&mut self) -> Option<NodePtr<K, V>> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.back?;
        self.back = node.predecessor();
        self.remaining -= 1;
        Some(node)
    }
}

impl<K, V> Clone for Range<K, V> {
    fn clone(&self) -> Self {
        Self {
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

/// Tears a tree down in key order, handing out each entry and freeing its node.
///
/// The node yielded is always the leftmost one, so it has no left child: its
/// right subtree is hoisted into its slot before it is freed. Dropping the
/// iterator part-way frees everything left.
pub struct IntoIter<'a, K, V, A: Allocator> {
    alloc: &'a A,
    root: Link<K, V>,
    front: Link<K, V>,
    remaining: usize,
}

impl<'a, K, V, A: Allocator> IntoIter<'a, K, V, A> {
    /// # Safety
    ///
    /// `root` must be a detached tree of `len` nodes allocated by `alloc`, and
    /// nothing else may refer to it afterwards.
    pub(crate) unsafe fn new(alloc: &'a A, root: Link<K, V>, len: usize) -> Self {
        Self {
            alloc,
            root,
            front: root.map(NodePtr::minimum),
            remaining: len,
        }
    }
}

impl<K, V, A: Allocator> Iterator for IntoIter<'_, K, V, A> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.front?;
        debug_assert!(node.left().is_none());

        let parent = node.parent();
        let right = node.right();
        match parent {
            Some(parent) => parent.set_child(super::Side::Left, right),
            None => self.root = right,
        }
        if let Some(right) = right {
            right.set_parent(parent);
            self.front = Some(right.minimum());
        } else {
            self.front = parent;
        }
        self.remaining = self.remaining.saturating_sub(1);

        // SAFETY: `node` is unlinked above and was allocated by `self.alloc`
        Some(unsafe { node.into_key_value_in(self.alloc) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, A: Allocator> ExactSizeIterator for IntoIter<'_, K, V, A> {}

impl<K, V, A: Allocator> Drop for IntoIter<'_, K, V, A> {
    fn drop(&mut self) {
        for _ in self.by_ref() {}
        debug_assert!(self.root.is_none());
    }
}
