use core::fmt;
use core::marker::PhantomData;
use core::ptr;
use core::ptr::NonNull;

#[cfg(feature = "std")]
extern crate alloc;
#[cfg(feature = "std")]
use alloc::boxed::Box;
#[cfg(feature = "std")]
use alloc::format;
#[cfg(feature = "std")]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::error::Error;
#[cfg(feature = "std")]
use std::io::Write;

use allocated::AllocResult;
use allocated::AllocatorExt;
use allocated::DropIn;
use allocator_api2::alloc::Allocator;
use allocator_api2::alloc::Layout;

mod iter;

pub use iter::{IntoIter, Range};

/// The color tag carried by every node of a red-black tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    /// A red node. Its children, if any, are black.
    Red,
    /// A black node. The root is always black.
    Black,
}

impl Color {
    /// Returns `true` if the color is [`Red`](Color::Red).
    #[must_use]
    pub fn is_red(self) -> bool {
        matches!(self, Self::Red)
    }

    /// Returns `true` if the color is [`Black`](Color::Black).
    #[must_use]
    pub fn is_black(self) -> bool {
        matches!(self, Self::Black)
    }
}

/// Which child slot of a parent a node occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

pub type Link<K, V> = Option<NodePtr<K, V>>;

pub struct Node<K, V> {
    key: K,
    value: V,
    color: Color,
    parent: Link<K, V>,
    left: Link<K, V>,
    right: Link<K, V>,
}

impl<K, V> fmt::Debug for Node<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("key", &"**UNKNOWN**")
            .field("value", &"**UNKNOWN**")
            .field("color", &self.color)
            .field("parent", &self.parent)
            .field("left", &self.left)
            .field("right", &self.right)
            .finish()
    }
}

impl<K, V> DropIn for Node<K, V> {
    /// Frees both child subtrees. The node's own allocation is released by its owner.
    ///
    /// # Safety
    ///
    /// `alloc` must be the allocator used to allocate the children.
    unsafe fn drop_in<A: Allocator>(&mut self, alloc: &A) {
        for child in [self.left.take(), self.right.take()].into_iter().flatten() {
            // SAFETY: children are owned by this node and were allocated by `alloc`
            unsafe { child.drop_tree_in(alloc) };
        }
    }
}

/// A handle to a heap-allocated [`Node`].
///
/// Handles are only created for nodes owned by an `AllocatedRbTreeMap`, and
/// only used while that map is borrowed; every safe accessor relies on the
/// node being live. Handles do not own anything, so copying one is free;
/// ownership follows the `left`/`right` links from the root.
pub struct NodePtr<K, V> {
    ptr: NonNull<Node<K, V>>,
    phantom: PhantomData<Node<K, V>>,
}

impl<K, V> Clone for NodePtr<K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for NodePtr<K, V> {}

impl<K, V> PartialEq for NodePtr<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl<K, V> Eq for NodePtr<K, V> {}

impl<K, V> fmt::Debug for NodePtr<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodePtr({:p})", self.ptr)
    }
}

/// The color of an optional node; absent children count as black.
pub fn color_of<K, V>(link: Link<K, V>) -> Color {
    link.map_or(Color::Black, NodePtr::color)
}

pub fn is_red<K, V>(link: Link<K, V>) -> bool {
    color_of(link).is_red()
}

impl<K, V> NodePtr<K, V> {
    /// Allocates a detached node with no children.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the allocation fails.
    pub fn allocate_in<A: Allocator>(
        alloc: &A,
        key: K,
        value: V,
        color: Color,
        parent: Link<K, V>,
    ) -> AllocResult<Self> {
        let heap = alloc.allocate_from(Node {
            key,
            value,
            color,
            parent,
            left: None,
            right: None,
        })?;

        Ok(Self {
            ptr: heap.into_inner(),
            phantom: PhantomData,
        })
    }

    /// Moves the key and value out of the node and releases its memory.
    ///
    /// # Safety
    ///
    /// The node must already be unlinked from the tree, must not be used again,
    /// and `alloc` MUST be the allocator used to allocate it.
    pub unsafe fn into_key_value_in<A: Allocator>(self, alloc: &A) -> (K, V) {
        // SAFETY: the node is live and nobody reads it after this point
        let node = unsafe { ptr::read(self.ptr.as_ptr()) };
        // SAFETY: the node was allocated by `alloc` with this layout
        unsafe { alloc.deallocate(self.ptr.cast(), Layout::new::<Node<K, V>>()) };
        (node.key, node.value)
    }

    /// Frees this node and its whole subtree.
    ///
    /// Recursion depth is bounded by the height of the subtree, which the
    /// red-black invariants keep logarithmic.
    ///
    /// # Safety
    ///
    /// The subtree must be unlinked from the tree and `alloc` MUST be the
    /// allocator used to allocate it.
    pub unsafe fn drop_tree_in<A: Allocator>(self, alloc: &A) {
        // SAFETY: the node is live and owned by the caller
        unsafe { (*self.ptr.as_ptr()).drop_in(alloc) };
        // SAFETY: requirements match function requirements
        drop(unsafe { self.into_key_value_in(alloc) });
    }

    #[inline]
    fn raw(self) -> *mut Node<K, V> {
        self.ptr.as_ptr()
    }

    /// # Safety
    ///
    /// The returned reference must not outlive the node, nor overlap a
    /// mutable reference to the same key.
    #[inline]
    pub unsafe fn key<'a>(self) -> &'a K {
        // SAFETY: guaranteed by the caller
        unsafe { &(*self.raw()).key }
    }

    /// # Safety
    ///
    /// See [`NodePtr::key`].
    #[inline]
    pub unsafe fn value<'a>(self) -> &'a V {
        // SAFETY: guaranteed by the caller
        unsafe { &(*self.raw()).value }
    }

    /// # Safety
    ///
    /// The returned reference must not outlive the node and must be the only
    /// live reference to this value.
    #[inline]
    pub unsafe fn value_mut<'a>(self) -> &'a mut V {
        // SAFETY: guaranteed by the caller
        unsafe { &mut (*self.raw()).value }
    }

    /// # Safety
    ///
    /// See [`NodePtr::key`].
    #[inline]
    pub unsafe fn key_value<'a>(self) -> (&'a K, &'a V) {
        // SAFETY: guaranteed by the caller
        unsafe { (self.key(), self.value()) }
    }

    /// # Safety
    ///
    /// See [`NodePtr::value_mut`].
    #[inline]
    pub unsafe fn key_value_mut<'a>(self) -> (&'a K, &'a mut V) {
        // SAFETY: guaranteed by the caller
        unsafe { (self.key(), self.value_mut()) }
    }

    /// Replaces the value stored in the node, returning the old one.
    pub fn replace_value(self, value: V) -> V {
        // SAFETY: the node is live; no reference to its value is held across this call
        unsafe { core::mem::replace(&mut (*self.raw()).value, value) }
    }

    /// Exchanges key and value between two distinct nodes, leaving links and
    /// colors where they are.
    pub fn swap_entries(self, other: Self) {
        debug_assert!(self != other);
        // SAFETY: both nodes are live and distinct, so the fields do not overlap
        unsafe {
            ptr::swap(&mut (*self.raw()).key, &mut (*other.raw()).key);
        }
        // SAFETY: as above
        unsafe {
            ptr::swap(&mut (*self.raw()).value, &mut (*other.raw()).value);
        }
    }

    #[inline]
    pub fn color(self) -> Color {
        // SAFETY: the node is live
        unsafe { (*self.raw()).color }
    }

    #[inline]
    pub fn set_color(self, color: Color) {
        // SAFETY: the node is live
        unsafe { (*self.raw()).color = color }
    }

    #[inline]
    pub fn parent(self) -> Link<K, V> {
        // SAFETY: the node is live
        unsafe { (*self.raw()).parent }
    }

    #[inline]
    pub fn set_parent(self, parent: Link<K, V>) {
        // SAFETY: the node is live
        unsafe { (*self.raw()).parent = parent }
    }

    #[inline]
    pub fn left(self) -> Link<K, V> {
        // SAFETY: the node is live
        unsafe { (*self.raw()).left }
    }

    #[inline]
    pub fn right(self) -> Link<K, V> {
        // SAFETY: the node is live
        unsafe { (*self.raw()).right }
    }

    #[inline]
    pub fn child(self, side: Side) -> Link<K, V> {
        match side {
            Side::Left => self.left(),
            Side::Right => self.right(),
        }
    }

    #[inline]
    pub fn set_child(self, side: Side, child: Link<K, V>) {
        // SAFETY: the node is live
        let node = unsafe { &mut *self.raw() };
        match side {
            Side::Left => node.left = child,
            Side::Right => node.right = child,
        }
    }

    pub fn is_root(self) -> bool {
        self.parent().is_none()
    }

    pub fn is_left_child(self) -> bool {
        self.parent().is_some_and(|p| p.left() == Some(self))
    }

    pub fn is_right_child(self) -> bool {
        self.parent().is_some_and(|p| p.right() == Some(self))
    }

    /// The slot this node occupies in its parent, or `None` for the root.
    pub fn side(self) -> Option<Side> {
        if self.is_left_child() {
            Some(Side::Left)
        } else if self.is_right_child() {
            Some(Side::Right)
        } else {
            None
        }
    }

    pub fn is_leaf(self) -> bool {
        self.left().is_none() && self.right().is_none()
    }

    pub fn has_both_children(self) -> bool {
        self.left().is_some() && self.right().is_some()
    }

    pub fn grandparent(self) -> Link<K, V> {
        self.parent()?.parent()
    }

    pub fn sibling(self) -> Link<K, V> {
        let side = self.side()?;
        self.parent()?.child(side.opposite())
    }

    pub fn uncle(self) -> Link<K, V> {
        self.parent()?.sibling()
    }

    pub fn parent_color(self) -> Option<Color> {
        self.parent().map(Self::color)
    }

    /// The uncle's color, with an absent uncle reading as black.
    pub fn uncle_color(self) -> Color {
        color_of(self.uncle())
    }

    /// The leftmost node of this subtree.
    pub fn minimum(self) -> Self {
        let mut node = self;
        while let Some(left) = node.left() {
            node = left;
        }
        node
    }

    /// The rightmost node of this subtree.
    pub fn maximum(self) -> Self {
        let mut node = self;
        while let Some(right) = node.right() {
            node = right;
        }
        node
    }

    /// The next node in key order.
    pub fn successor(self) -> Link<K, V> {
        if let Some(right) = self.right() {
            return Some(right.minimum());
        }

        let mut node = self;
        while let Some(parent) = node.parent() {
            if parent.left() == Some(node) {
                return Some(parent);
            }
            node = parent;
        }
        None
    }

    /// The previous node in key order.
    pub fn predecessor(self) -> Link<K, V> {
        if let Some(left) = self.left() {
            return Some(left.maximum());
        }

        let mut node = self;
        while let Some(parent) = node.parent() {
            if parent.right() == Some(node) {
                return Some(parent);
            }
            node = parent;
        }
        None
    }
}

#[cfg(feature = "std")]
impl<K: fmt::Debug, V: fmt::Debug> NodePtr<K, V> {
    pub fn to_dot(self, data: &mut Vec<u8>) -> Result<(), Box<dyn Error>> {
        let this = self.ptr;
        let (fill, font) = match self.color() {
            Color::Red => ("red", "black"),
            Color::Black => ("black", "white"),
        };
        // SAFETY: the tree is borrowed for the duration of the rendering
        let (key, value) = unsafe { self.key_value() };
        data.write_all(
            format!(
                "\"p{this:?}\" [shape=\"record\"; style=\"filled\"; fillcolor=\"{fill}\"; fontcolor=\"{font}\"; label=\"{key:?}|{value:?}\"];\n"
            )
            .as_bytes(),
        )?;

        for (side, child) in [(Side::Left, self.left()), (Side::Right, self.right())] {
            if let Some(child) = child {
                let label = match side {
                    Side::Left => "L",
                    Side::Right => "R",
                };
                data.write_all(
                    format!("\"p{this:?}\" -> \"p{:?}\" [label=\"{label}\"];\n", child.ptr)
                        .as_bytes(),
                )?;
                child.to_dot(data)?;
            }
        }

        Ok(())
    }
}
