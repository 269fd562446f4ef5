//! Rotations and the insert/remove fixups that keep the tree balanced.
//!
//! Each routine is written once against a [`Side`] and mirrored by flipping
//! it, so the left- and right-handed cases cannot drift apart.

use allocated::AllocResult;
use allocator_api2::alloc::Allocator;

use super::node::{color_of, is_red, Color, Link, NodePtr, Side};
use super::AllocatedRbTreeMap;

impl<K, V> AllocatedRbTreeMap<K, V> {
    /// Points whatever referred to `old` (its parent, or the root) at `new`.
    fn replace_in_parent(&mut self, old: NodePtr<K, V>, new: Link<K, V>) {
        match old.side() {
            Some(side) => {
                if let Some(parent) = old.parent() {
                    parent.set_child(side, new);
                }
            }
            None => self.root = new,
        }
        if let Some(new) = new {
            new.set_parent(old.parent());
        }
    }

    /// Moves `node` down to its `side`, promoting its child on the opposite
    /// side into its place. Key order is preserved and colors are untouched.
    fn rotate(&mut self, node: NodePtr<K, V>, side: Side) {
        let Some(pivot) = node.child(side.opposite()) else {
            debug_assert!(false, "rotation without a child to promote");
            return;
        };

        let inner = pivot.child(side);
        node.set_child(side.opposite(), inner);
        if let Some(inner) = inner {
            inner.set_parent(Some(node));
        }

        self.replace_in_parent(node, Some(pivot));
        pivot.set_child(side, Some(node));
        node.set_parent(Some(pivot));
    }

    /// Promotes the right child of `node` into its position.
    pub(super) fn rotate_left(&mut self, node: NodePtr<K, V>) {
        log::trace!("rotate left");
        self.rotate(node, Side::Left);
    }

    /// Promotes the left child of `node` into its position.
    pub(super) fn rotate_right(&mut self, node: NodePtr<K, V>) {
        log::trace!("rotate right");
        self.rotate(node, Side::Right);
    }

    fn rotate_toward(&mut self, node: NodePtr<K, V>, side: Side) {
        match side {
            Side::Left => self.rotate_left(node),
            Side::Right => self.rotate_right(node),
        }
    }

    /// Links a freshly allocated node into the empty `side` slot of `parent`
    /// (or makes it the root), then restores the red-black invariants.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the allocation fails; the map is left unchanged.
    pub(super) fn attach_in<A: Allocator>(
        &mut self,
        alloc: &A,
        parent: Link<K, V>,
        side: Side,
        key: K,
        value: V,
    ) -> AllocResult<NodePtr<K, V>> {
        let color = if parent.is_some() {
            Color::Red
        } else {
            Color::Black
        };
        let node = NodePtr::allocate_in(alloc, key, value, color, parent)?;

        match parent {
            Some(parent) => {
                debug_assert!(parent.child(side).is_none());
                parent.set_child(side, Some(node));
            }
            None => {
                debug_assert!(self.root.is_none());
                self.root = Some(node);
            }
        }
        self.n += 1;

        if parent.is_some() {
            self.insert_fixup(node);
        }

        Ok(node)
    }

    fn insert_fixup(&mut self, mut node: NodePtr<K, V>) {
        while node.parent_color().is_some_and(Color::is_red) {
            // A red parent is never the root.
            let (Some(parent), Some(grandparent)) = (node.parent(), node.grandparent()) else {
                break;
            };
            let side = if parent.is_left_child() {
                Side::Left
            } else {
                Side::Right
            };

            if node.uncle_color().is_red() {
                log::trace!("insert fixup: red uncle, recolor and climb");
                parent.set_color(Color::Black);
                if let Some(uncle) = node.uncle() {
                    uncle.set_color(Color::Black);
                }
                grandparent.set_color(Color::Red);
                node = grandparent;
                continue;
            }

            if parent.child(side.opposite()) == Some(node) {
                log::trace!("insert fixup: inner grandchild, straighten");
                self.rotate_toward(parent, side);
                node = parent;
            }
            let Some(parent) = node.parent() else {
                break;
            };

            log::trace!("insert fixup: outer grandchild, rotate grandparent");
            parent.set_color(Color::Black);
            grandparent.set_color(Color::Red);
            self.rotate_toward(grandparent, side.opposite());
            break;
        }

        if let Some(root) = self.root {
            root.set_color(Color::Black);
        }
    }

    /// Unlinks `node` from the tree, frees it and returns its entry.
    ///
    /// # Safety
    ///
    /// `node` must belong to this map, and `alloc` MUST be the allocator used
    /// to allocate this object.
    pub(super) unsafe fn remove_node_in<A: Allocator>(
        &mut self,
        alloc: &A,
        node: NodePtr<K, V>,
    ) -> (K, V) {
        // With two children, trade places with the in-order successor, which
        // has no left child; the successor's node is the one that goes.
        let target = match node.right() {
            Some(right) if node.has_both_children() => {
                let successor = right.minimum();
                node.swap_entries(successor);
                successor
            }
            _ => node,
        };

        let child = target.left().or(target.right());
        let Some(parent) = target.parent() else {
            return match child {
                // SAFETY: requirements match function requirements
                None => unsafe { self.remove_last_in(alloc, target) },
                // SAFETY: requirements match function requirements
                Some(child) => unsafe { self.absorb_only_child_in(alloc, target, child) },
            };
        };

        let side = target.side().unwrap_or(Side::Left);
        parent.set_child(side, child);
        if let Some(child) = child {
            child.set_parent(Some(parent));
        }
        self.n -= 1;

        if target.color().is_black() {
            self.remove_fixup(child, parent);
        }

        // SAFETY: `target` is unlinked above; `alloc` allocated it
        unsafe { target.into_key_value_in(alloc) }
    }

    /// Removes the root when it is the only node.
    ///
    /// # Safety
    ///
    /// See [`AllocatedRbTreeMap::remove_node_in`].
    unsafe fn remove_last_in<A: Allocator>(&mut self, alloc: &A, root: NodePtr<K, V>) -> (K, V) {
        debug_assert!(root.is_root() && root.is_leaf());
        debug_assert_eq!(self.n, 1);
        self.root = None;
        self.n = 0;
        // SAFETY: the root is unlinked above; `alloc` allocated it
        unsafe { root.into_key_value_in(alloc) }
    }

    /// Removes the root when it has a single child: the child's entry moves up
    /// into the root node, which keeps its identity and stays black.
    ///
    /// # Safety
    ///
    /// See [`AllocatedRbTreeMap::remove_node_in`].
    unsafe fn absorb_only_child_in<A: Allocator>(
        &mut self,
        alloc: &A,
        root: NodePtr<K, V>,
        child: NodePtr<K, V>,
    ) -> (K, V) {
        // A black root with one child can only have a red leaf below it.
        debug_assert!(root.is_root());
        debug_assert!(child.is_leaf() && child.color().is_red());
        root.swap_entries(child);
        let side = child.side().unwrap_or(Side::Left);
        root.set_child(side, None);
        root.set_color(Color::Black);
        self.n -= 1;
        // SAFETY: `child` is unlinked above; `alloc` allocated it
        unsafe { child.into_key_value_in(alloc) }
    }

    /// Restores the black-height after a black node was spliced out.
    ///
    /// `node` is what took the removed node's place (possibly nothing) and
    /// `parent` is its parent. The position carries one black too few.
    fn remove_fixup(&mut self, mut node: Link<K, V>, parent: NodePtr<K, V>) {
        let mut parent = Some(parent);

        while let Some(p) = parent {
            if is_red(node) {
                break;
            }

            let side = if p.left() == node {
                Side::Left
            } else {
                Side::Right
            };
            // A position short of one black always has a sibling.
            let Some(mut sibling) = p.child(side.opposite()) else {
                debug_assert!(false, "black-height deficit without a sibling");
                break;
            };

            if sibling.color().is_red() {
                log::trace!("remove fixup: red sibling, rotate parent");
                sibling.set_color(Color::Black);
                p.set_color(Color::Red);
                self.rotate_toward(p, side);
                let Some(s) = p.child(side.opposite()) else {
                    break;
                };
                sibling = s;
            }

            let near = sibling.child(side);
            let far = sibling.child(side.opposite());

            if color_of(near).is_black() && color_of(far).is_black() {
                log::trace!("remove fixup: black nephews, push deficit up");
                sibling.set_color(Color::Red);
                node = Some(p);
                parent = p.parent();
                continue;
            }

            if color_of(far).is_black() {
                log::trace!("remove fixup: red near nephew, rotate sibling");
                if let Some(near) = near {
                    near.set_color(Color::Black);
                }
                sibling.set_color(Color::Red);
                self.rotate_toward(sibling, side.opposite());
                let Some(s) = p.child(side.opposite()) else {
                    break;
                };
                sibling = s;
            }

            log::trace!("remove fixup: red far nephew, rotate parent");
            sibling.set_color(p.color());
            p.set_color(Color::Black);
            if let Some(far) = sibling.child(side.opposite()) {
                far.set_color(Color::Black);
            }
            self.rotate_toward(p, side);
            node = self.root;
            break;
        }

        if let Some(node) = node {
            node.set_color(Color::Black);
        }
    }
}
