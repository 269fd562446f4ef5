#![allow(
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block
)]

extern crate alloc;
use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use core::mem::size_of;
use core::mem::ManuallyDrop;
use std::collections::BTreeMap;
use std::error::Error;
use std::format;
use std::vec;

use proptest::prelude::*;

use itertools::assert_equal;
use itertools::Itertools;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use allocated::{CollectIn, CountingAllocator, DropGuard, IntoIteratorIn};

use super::node::{Node, NodePtr, Side};
use super::*;

/// Walks the whole tree and asserts every structural invariant: keys in
/// order, parent links consistent, black root, no red node with a red child,
/// equal black-height on every path, and a node count matching `len()`.
fn check_invariants<K: Ord + Debug, V>(tree: &AllocatedRbTreeMap<K, V>) {
    let Some(root) = tree.root else {
        assert_eq!(tree.n, 0, "empty tree with non-zero size");
        return;
    };

    assert!(root.is_root(), "root has a parent");
    assert_eq!(root.color(), Color::Black, "root is red");

    let (count, _) = check_subtree(root, None, None);
    assert_eq!(count, tree.n, "size does not match node count");
    assert_eq!(tree.iter().len(), tree.n);
}

/// Returns the number of nodes and the black-height of the subtree.
fn check_subtree<K: Ord + Debug, V>(
    node: NodePtr<K, V>,
    lower: Option<&K>,
    upper: Option<&K>,
) -> (usize, usize) {
    let key = unsafe { node.key() };
    if let Some(lower) = lower {
        assert!(lower < key, "{key:?} is not above {lower:?}");
    }
    if let Some(upper) = upper {
        assert!(key < upper, "{key:?} is not below {upper:?}");
    }

    let mut count = 1;
    let mut heights = [1, 1];
    for (i, side) in [Side::Left, Side::Right].into_iter().enumerate() {
        let Some(child) = node.child(side) else {
            continue;
        };

        assert_eq!(child.parent(), Some(node), "broken parent link below {key:?}");
        assert!(
            !(node.color().is_red() && child.color().is_red()),
            "red node {key:?} has a red child"
        );

        let (lower, upper) = match side {
            Side::Left => (lower, Some(key)),
            Side::Right => (Some(key), upper),
        };
        let (c, h) = check_subtree(child, lower, upper);
        count += c;
        heights[i] = h;
    }

    assert_eq!(heights[0], heights[1], "black-height differs below {key:?}");
    (count, heights[0] + usize::from(node.color().is_black()))
}

#[test]
fn test_constructor() -> Result<(), Box<dyn Error>> {
    let alloc = CountingAllocator::default();
    let mut tree = AllocatedRbTreeMap::<u32, u32>::new_in(&alloc);

    unsafe {
        assert_eq!(tree.n, 0);
        assert_equal(tree.iter().map(|(k, v)| (*k, *v)), vec![]);

        assert_eq!(tree.len(), 0);
        assert!(tree.is_empty());
        assert_eq!(tree.root_key(), None);

        assert!(!tree.contains_key(&1));
        assert_eq!(tree.get(&1), None);

        assert!(tree.first_entry_in(&alloc).is_none());
        assert!(tree.last_entry_in(&alloc).is_none());
        assert_eq!(tree.first_key_value(), None);
        assert_eq!(tree.last_key_value(), None);

        tree.drop_in(&alloc);
        core::mem::forget(tree);
    }

    _assert_allocations(alloc, 0);

    Ok(())
}

#[test]
fn test_one() -> Result<(), Box<dyn Error>> {
    let alloc = CountingAllocator::default();
    let mut tree = AllocatedRbTreeMap::<u32, u32>::new_in(&alloc);

    unsafe {
        assert_eq!(tree.insert_in(&alloc, 1, 1)?, None);

        assert_eq!(tree.n, 1);
        assert_equal(tree.iter().map(|(k, v)| (*k, *v)), vec![(1, 1)]);
        check_invariants(&tree);

        assert_eq!(tree.len(), 1);
        assert!(!tree.is_empty());
        assert_eq!(tree.root_key(), Some(&1));

        assert!(tree.contains_key(&1));
        assert_eq!(tree.get(&1), Some(&1));

        let entry = tree.first_entry_in(&alloc).unwrap();
        assert_eq!(entry.key(), &1);
        assert_eq!(entry.get(), &1);

        assert_eq!(tree.first_key_value(), Some((&1, &1)));
        assert_eq!(tree.last_key_value(), Some((&1, &1)));

        tree.drop_in(&alloc);
        core::mem::forget(tree);
    }

    _assert_allocations(alloc, 1);

    Ok(())
}

#[test]
fn test_3_in_order() -> Result<(), Box<dyn Error>> {
    let alloc = CountingAllocator::default();
    let mut tree = AllocatedRbTreeMap::<u32, u32>::new_in(&alloc);

    unsafe {
        tree.insert_in(&alloc, 1, 1)?;
        tree.insert_in(&alloc, 2, 4)?;
        tree.insert_in(&alloc, 3, 9)?;

        assert_eq!(tree.n, 3);
        assert_eq!(tree.root_key(), Some(&2));
        assert_equal(
            tree.iter().map(|(k, v)| (*k, *v)),
            vec![(1, 1), (2, 4), (3, 9)],
        );
        check_invariants(&tree);

        tree.drop_in(&alloc);
        core::mem::forget(tree);
    }

    _assert_allocations(alloc, 3);

    Ok(())
}

#[test]
fn test_3_out_of_order() -> Result<(), Box<dyn Error>> {
    let alloc = CountingAllocator::default();
    let mut tree = AllocatedRbTreeMap::<u32, u32>::new_in(&alloc);

    unsafe {
        tree.insert_in(&alloc, 1, 1)?;
        tree.insert_in(&alloc, 3, 9)?;
        tree.insert_in(&alloc, 2, 4)?;

        assert_eq!(tree.n, 3);
        assert_eq!(tree.root_key(), Some(&2));
        assert_equal(
            tree.iter().map(|(k, v)| (*k, *v)),
            vec![(1, 1), (2, 4), (3, 9)],
        );
        check_invariants(&tree);

        tree.drop_in(&alloc);
        core::mem::forget(tree);
    }

    _assert_allocations(alloc, 3);

    Ok(())
}

#[test]
fn test_3_colors() -> Result<(), Box<dyn Error>> {
    let alloc = CountingAllocator::default();
    let tree: DropGuard<AllocatedRbTreeMap<u32, u32>, _> =
        [(3, 3), (2, 2), (1, 1)].into_iter().collect_in(&alloc)?;

    assert_equal(
        tree.iter_colored().map(|(k, c)| (*k, c)),
        vec![(1, Color::Red), (2, Color::Black), (3, Color::Red)],
    );
    assert_equal(
        tree.iter_colored().rev().map(|(k, _)| *k),
        vec![3, 2, 1],
    );

    core::mem::drop(tree);
    _assert_allocations(alloc, 3);

    Ok(())
}

#[test]
fn test_insert_existing_key_overwrites() -> Result<(), Box<dyn Error>> {
    let alloc = CountingAllocator::default();
    let mut tree = AllocatedRbTreeMap::<u32, String>::new_in(&alloc);

    unsafe {
        assert_eq!(tree.insert_in(&alloc, 7, "seven".to_string())?, None);
        assert_eq!(tree.insert_in(&alloc, 3, "three".to_string())?, None);
        let colors: Vec<_> = tree.iter_colored().map(|(k, c)| (*k, c)).collect();

        assert_eq!(
            tree.insert_in(&alloc, 7, "SEVEN".to_string())?,
            Some("seven".to_string())
        );

        assert_eq!(tree.len(), 2);
        assert_eq!(tree.get(&7).map(String::as_str), Some("SEVEN"));
        assert_equal(tree.iter_colored().map(|(k, c)| (*k, c)), colors);
        check_invariants(&tree);

        tree.drop_in(&alloc);
        core::mem::forget(tree);
    }

    assert_eq!(alloc.net_allocations(), 0);
    assert_eq!(alloc.n_allocations(), 2);

    Ok(())
}

#[test]
fn test_insert_sequential_10000() -> Result<(), Box<dyn Error>> {
    let alloc = CountingAllocator::default();
    let mut tree = AllocatedRbTreeMap::<u32, u32>::new_in(&alloc);

    unsafe {
        for i in 1..=10_000 {
            tree.insert_in(&alloc, i, i * 2)?;
        }

        assert_eq!(tree.len(), 10_000);
        assert_equal(tree.keys().copied(), 1..=10_000);
        assert_equal(tree.values().copied(), (1..=10_000).map(|i| i * 2));
        check_invariants(&tree);

        tree.drop_in(&alloc);
        core::mem::forget(tree);
    }

    _assert_allocations(alloc, 10_000);

    Ok(())
}

#[test]
fn test_random_permutation_round_trip() -> Result<(), Box<dyn Error>> {
    let alloc = CountingAllocator::default();
    let mut tree = AllocatedRbTreeMap::<u32, u32>::new_in(&alloc);

    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut keys: Vec<u32> = (0..2_000).collect();
    keys.shuffle(&mut rng);

    unsafe {
        for k in &keys {
            tree.insert_in(&alloc, *k, k + 1)?;
        }
        check_invariants(&tree);

        for k in &keys {
            assert_eq!(tree.get(k), Some(&(k + 1)));
        }
        assert_eq!(tree.get(&2_000), None);

        tree.drop_in(&alloc);
        core::mem::forget(tree);
    }

    _assert_allocations(alloc, 2_000);

    Ok(())
}

#[test]
fn test_remove_middle_of_three() -> Result<(), Box<dyn Error>> {
    let alloc = CountingAllocator::default();
    let mut tree = AllocatedRbTreeMap::<u32, u32>::new_in(&alloc);

    unsafe {
        tree.insert_in(&alloc, 1, 1)?;
        tree.insert_in(&alloc, 2, 2)?;
        tree.insert_in(&alloc, 3, 3)?;

        assert_eq!(tree.remove_in(&alloc, &2), Ok(2));
        assert_eq!(tree.root_key(), Some(&3));
        check_invariants(&tree);

        tree.insert_in(&alloc, 2, 2)?;
        assert_eq!(tree.remove_in(&alloc, &1), Ok(1));
        let root = tree.root.unwrap();
        assert_eq!(tree.root_key(), Some(&2));
        assert!(root.left().is_none());
        assert_eq!(root.right().map(|n| *n.key()), Some(3));
        check_invariants(&tree);

        tree.insert_in(&alloc, 1, 1)?;
        assert_eq!(tree.remove_in(&alloc, &3), Ok(3));
        let root = tree.root.unwrap();
        assert_eq!(tree.root_key(), Some(&2));
        assert_eq!(root.left().map(|n| *n.key()), Some(1));
        assert!(root.right().is_none());
        check_invariants(&tree);

        tree.drop_in(&alloc);
        core::mem::forget(tree);
    }

    _assert_allocations(alloc, 5);

    Ok(())
}

#[test]
fn test_remove_root_with_one_child() -> Result<(), Box<dyn Error>> {
    let alloc = CountingAllocator::default();
    let mut tree = AllocatedRbTreeMap::<u32, u32>::new_in(&alloc);

    unsafe {
        tree.insert_in(&alloc, 1, 10)?;
        tree.insert_in(&alloc, 2, 20)?;

        assert_eq!(tree.remove_entry_in(&alloc, &1), Ok((1, 10)));
        assert_eq!(tree.root_key(), Some(&2));
        assert_eq!(tree.get(&2), Some(&20));
        assert!(tree.root.unwrap().is_leaf());
        check_invariants(&tree);

        assert_eq!(tree.remove_entry_in(&alloc, &2), Ok((2, 20)));
        assert!(tree.is_empty());
        assert_eq!(tree.root_key(), None);

        tree.drop_in(&alloc);
        core::mem::forget(tree);
    }

    _assert_allocations(alloc, 2);

    Ok(())
}

#[test]
fn test_remove_errors() -> Result<(), Box<dyn Error>> {
    let alloc = CountingAllocator::default();
    let mut tree = AllocatedRbTreeMap::<u32, u32>::new_in(&alloc);

    unsafe {
        assert_eq!(tree.remove_in(&alloc, &6), Err(RemoveError::EmptyTree));

        tree.insert_in(&alloc, 5, 5)?;
        assert_eq!(tree.remove_in(&alloc, &6), Err(RemoveError::KeyNotFound));
        assert_eq!(tree.len(), 1);

        assert_eq!(tree.remove_in(&alloc, &5), Ok(5));
        assert_eq!(tree.remove_in(&alloc, &5), Err(RemoveError::EmptyTree));

        tree.insert_in(&alloc, 5, 5)?;
        tree.insert_in(&alloc, 8, 8)?;
        assert_eq!(tree.remove_in(&alloc, &8), Ok(8));
        assert_eq!(tree.get(&8), None);
        assert_eq!(tree.remove_in(&alloc, &8), Err(RemoveError::KeyNotFound));
        check_invariants(&tree);

        tree.drop_in(&alloc);
        core::mem::forget(tree);
    }

    _assert_allocations(alloc, 3);

    Ok(())
}

#[test]
fn test_remove_first_half_keeps_rest() -> Result<(), Box<dyn Error>> {
    let alloc = CountingAllocator::default();
    let mut tree: DropGuard<AllocatedRbTreeMap<u32, u32>, _> =
        (0..1_000).map(|k| (k, k)).collect_in(&alloc)?;

    unsafe {
        for k in 0..500 {
            assert_eq!(tree.remove_in(&alloc, &k), Ok(k));
        }
    }
    check_invariants(&tree);

    assert_eq!(tree.len(), 500);
    for k in 0..500 {
        assert_eq!(tree.get(&k), None);
    }
    for k in 500..1_000 {
        assert_eq!(tree.get(&k), Some(&k));
    }

    core::mem::drop(tree);
    _assert_allocations(alloc, 1_000);

    Ok(())
}

#[test]
fn test_remove_all_ascending() -> Result<(), Box<dyn Error>> {
    let alloc = CountingAllocator::default();
    let mut tree: DropGuard<AllocatedRbTreeMap<u32, u32>, _> =
        (0..10_000).map(|k| (k, k)).collect_in(&alloc)?;

    unsafe {
        for k in 0..10_000 {
            assert_eq!(tree.remove_in(&alloc, &k), Ok(k));
        }
    }

    assert_eq!(tree.len(), 0);
    assert!(tree.root.is_none());
    assert_eq!(alloc.net_allocations(), 0);

    core::mem::drop(tree);
    _assert_allocations(alloc, 10_000);

    Ok(())
}

#[test]
fn test_remove_all_descending_checked() -> Result<(), Box<dyn Error>> {
    let alloc = CountingAllocator::default();
    let mut tree: DropGuard<AllocatedRbTreeMap<u32, u32>, _> =
        (0..255).map(|k| (k, k)).collect_in(&alloc)?;

    unsafe {
        for k in (0..255).rev() {
            assert_eq!(tree.remove_in(&alloc, &k), Ok(k));
            check_invariants(&tree);
        }
    }

    assert!(tree.is_empty());

    core::mem::drop(tree);
    _assert_allocations(alloc, 255);

    Ok(())
}

#[test]
fn test_random_keys_in_small_range() -> Result<(), Box<dyn Error>> {
    let alloc = CountingAllocator::default();
    let mut tree = AllocatedRbTreeMap::<u32, u32>::new_in(&alloc);
    let mut rng = StdRng::seed_from_u64(100);

    unsafe {
        for _ in 0..10_000 {
            let k = rng.gen_range(1..=100);
            tree.insert_in(&alloc, k, k)?;
        }

        assert_eq!(tree.len(), 100);
        assert_equal(tree.keys().copied(), 1..=100);
        check_invariants(&tree);

        tree.drop_in(&alloc);
        core::mem::forget(tree);
    }

    _assert_allocations(alloc, 100);

    Ok(())
}

#[test]
fn test_insert_remove_insert() -> Result<(), Box<dyn Error>> {
    let alloc = CountingAllocator::default();
    let mut tree = AllocatedRbTreeMap::<u32, u32>::new_in(&alloc);

    unsafe {
        for k in 0..10_000 {
            tree.insert_in(&alloc, k, k)?;
        }
        for k in 5_000..10_000 {
            tree.remove_in(&alloc, &k)?;
        }
        for k in 10_000..11_000 {
            tree.insert_in(&alloc, k, k)?;
        }

        assert_eq!(tree.len(), 6_000);
        assert_equal(tree.keys().copied(), (0..5_000).chain(10_000..11_000));
        check_invariants(&tree);

        tree.drop_in(&alloc);
        core::mem::forget(tree);
    }

    _assert_allocations(alloc, 11_000);

    Ok(())
}

#[test]
fn test_small_7_collect_in() -> Result<(), Box<dyn Error>> {
    let alloc = CountingAllocator::default();
    let tree: DropGuard<AllocatedRbTreeMap<u32, u32>, _> =
        (1..=7).rev().map(|k| (k, k * k)).collect_in(&alloc)?;

    assert_eq!(tree.n, 7);
    assert_equal(
        tree.iter().map(|(k, v)| (*k, *v)),
        (1..=7).map(|i| (i, i * i)),
    );
    check_invariants(&tree);

    core::mem::drop(tree);
    _assert_allocations(alloc, 7);

    Ok(())
}

#[test]
fn test_small_7_clear_in() -> Result<(), Box<dyn Error>> {
    let alloc = CountingAllocator::default();
    let mut tree: DropGuard<AllocatedRbTreeMap<u32, u32>, _> =
        (1..=7).map(|k| (k, k * k)).collect_in(&alloc)?;

    unsafe {
        tree.clear_in(&alloc);
    }

    assert!(tree.is_empty());
    assert_eq!(tree.root_key(), None);
    assert_eq!(alloc.net_allocations(), 0);

    unsafe {
        tree.insert_in(&alloc, 1, 1)?;
    }
    assert_eq!(tree.len(), 1);

    core::mem::drop(tree);
    _assert_allocations(alloc, 8);

    Ok(())
}

#[test]
fn test_small_7_into_iter() -> Result<(), Box<dyn Error>> {
    let alloc = CountingAllocator::default();
    let tree: DropGuard<AllocatedRbTreeMap<u32, u32>, _> =
        (1..=7).map(|k| (k, k * k)).collect_in(&alloc)?;

    unsafe {
        let iter = ManuallyDrop::into_inner(tree.into_inner()).into_iter_in(&alloc);
        assert_eq!(iter.len(), 7);
        assert_equal(iter, (1..=7).map(|i| (i, i * i)));
    }

    _assert_allocations(alloc, 7);

    Ok(())
}

#[test]
fn test_into_iter_dropped_early() -> Result<(), Box<dyn Error>> {
    let alloc = CountingAllocator::default();
    let tree: DropGuard<AllocatedRbTreeMap<u32, String>, _> =
        (1..=50).map(|k| (k, k.to_string())).collect_in(&alloc)?;

    unsafe {
        let mut iter = ManuallyDrop::into_inner(tree.into_inner()).into_iter_in(&alloc);
        assert_eq!(iter.next(), Some((1, "1".to_string())));
        assert_eq!(iter.next(), Some((2, "2".to_string())));
        assert_eq!(iter.len(), 48);
    }

    assert_eq!(alloc.net_allocations(), 0);
    assert_eq!(alloc.n_allocations(), 50);

    Ok(())
}

#[test]
fn test_into_keys_and_values() -> Result<(), Box<dyn Error>> {
    let alloc = CountingAllocator::default();
    let tree: DropGuard<AllocatedRbTreeMap<u32, u32>, _> =
        [(2, 20), (1, 10), (3, 30)].into_iter().collect_in(&alloc)?;
    let other: DropGuard<AllocatedRbTreeMap<u32, u32>, _> =
        [(2, 20), (1, 10), (3, 30)].into_iter().collect_in(&alloc)?;

    unsafe {
        let keys = ManuallyDrop::into_inner(tree.into_inner()).into_keys_in(&alloc);
        assert_equal(keys, vec![1, 2, 3]);

        let values = ManuallyDrop::into_inner(other.into_inner()).into_values_in(&alloc);
        assert_equal(values, vec![10, 20, 30]);
    }

    _assert_allocations(alloc, 6);

    Ok(())
}

#[test]
fn test_iter_both_ends() -> Result<(), Box<dyn Error>> {
    let alloc = CountingAllocator::default();
    let tree: DropGuard<AllocatedRbTreeMap<u32, u32>, _> =
        (1..=10).map(|k| (k, k * 10)).collect_in(&alloc)?;

    let mut iter = tree.iter();
    assert_eq!(iter.len(), 10);
    assert_eq!(iter.next(), Some((&1, &10)));
    assert_eq!(iter.next_back(), Some((&10, &100)));
    assert_eq!(iter.len(), 8);
    assert_equal(iter.map(|(k, _)| *k), 2..=9);

    assert_equal(tree.keys().rev().copied(), (1..=10).rev());
    assert_equal(tree.values().rev().copied(), (1..=10).rev().map(|k| k * 10));

    let mut iter = tree.keys();
    for _ in 0..5 {
        iter.next();
        iter.next_back();
    }
    assert_eq!(iter.next(), None);
    assert_eq!(iter.next_back(), None);

    core::mem::drop(tree);
    _assert_allocations(alloc, 10);

    Ok(())
}

#[test]
fn test_iter_mut_and_values_mut() -> Result<(), Box<dyn Error>> {
    let alloc = CountingAllocator::default();
    let mut tree: DropGuard<AllocatedRbTreeMap<u32, u32>, _> =
        (1..=5).map(|k| (k, k)).collect_in(&alloc)?;

    for v in tree.values_mut() {
        *v *= 10;
    }
    assert_equal(tree.values().copied(), vec![10, 20, 30, 40, 50]);

    for (k, v) in tree.iter_mut().rev() {
        *v += k;
    }
    assert_equal(tree.values().copied(), vec![11, 22, 33, 44, 55]);

    for (_, v) in &mut *tree {
        *v = 0;
    }
    assert!(tree.values().all(|v| *v == 0));

    core::mem::drop(tree);
    _assert_allocations(alloc, 5);

    Ok(())
}

#[test]
fn test_debug_output() -> Result<(), Box<dyn Error>> {
    let alloc = CountingAllocator::default();
    let tree: DropGuard<AllocatedRbTreeMap<u32, &str>, _> =
        [(2, "b"), (1, "a")].into_iter().collect_in(&alloc)?;

    assert_eq!(format!("{:?}", *tree), r#"{1: "a", 2: "b"}"#);

    Ok(())
}

#[test]
fn test_small_1_entry() -> Result<(), Box<dyn Error>> {
    let alloc = CountingAllocator::default();
    let mut tree = AllocatedRbTreeMap::<u32, u32>::new_in(&alloc);

    unsafe {
        let entry = tree.entry_in(&alloc, 1);
        assert_eq!(entry.key(), &1);
        match entry {
            Entry::Vacant(v) => {
                assert_eq!(v.key_below(), None);
                assert_eq!(v.key_above(), None);
                *v.insert(1)? += 1;
            }
            Entry::Occupied(_) => panic!("Expected Vacant(_)"),
        }

        assert_eq!(tree.get(&1), Some(&2));

        let mut entry = tree.entry_in(&alloc, 1).unwrap_occupied();
        assert_eq!(entry.get(), &2);
        assert_eq!(entry.insert(5), 2);
        *entry.get_mut() += 1;
        assert_eq!(*entry.into_mut(), 6);

        let entry = tree.entry_in(&alloc, 1).unwrap_occupied();
        assert_eq!(entry.remove_entry(), (1, 6));
        assert!(tree.is_empty());

        tree.drop_in(&alloc);
        core::mem::forget(tree);
    }

    _assert_allocations(alloc, 1);

    Ok(())
}

#[test]
fn test_entry_or_insert() -> Result<(), Box<dyn Error>> {
    let alloc = CountingAllocator::default();
    let mut tree = AllocatedRbTreeMap::<&str, u32>::new_in(&alloc);

    unsafe {
        for word in "the quick brown fox jumps over the lazy dog the end".split(' ') {
            tree.entry_in(&alloc, word)
                .and_modify(|n| *n += 1)
                .or_insert(1)?;
        }

        assert_eq!(tree.get("the"), Some(&3));
        assert_eq!(tree.get("fox"), Some(&1));
        assert_eq!(tree.len(), 9);

        *tree.entry_in(&alloc, "cat").or_default()? += 4;
        *tree.entry_in(&alloc, "cat").or_insert_with(|| 100)? += 1;
        let len = tree.entry_in(&alloc, "horse").or_insert_with_key(|k| k.len() as u32)?;
        assert_eq!(*len, 5);

        assert_eq!(tree.get("cat"), Some(&5));
        assert_eq!(tree.len(), 11);
        check_invariants(&tree);

        match tree.entry_in(&alloc, "zebra") {
            Entry::Vacant(v) => assert_eq!(v.into_key(), "zebra"),
            Entry::Occupied(_) => panic!("Expected Vacant(_)"),
        }
        assert_eq!(tree.len(), 11);

        tree.drop_in(&alloc);
        core::mem::forget(tree);
    }

    assert_eq!(alloc.net_allocations(), 0);
    assert_eq!(alloc.n_allocations(), 11);

    Ok(())
}

#[test]
fn test_entry_remove() -> Result<(), Box<dyn Error>> {
    let alloc = CountingAllocator::default();
    let mut tree: DropGuard<AllocatedRbTreeMap<u32, u32>, _> =
        (0..64).map(|k| (k, k * k)).collect_in(&alloc)?;

    unsafe {
        for k in (0..64).step_by(3) {
            let entry = tree.entry_in(&alloc, k).unwrap_occupied();
            assert_eq!(entry.remove(), k * k);
            check_invariants(&tree);
        }
    }

    assert_equal(tree.keys().copied(), (0..64).filter(|k| k % 3 != 0));

    core::mem::drop(tree);
    _assert_allocations(alloc, 64);

    Ok(())
}

#[test]
fn test_first_and_last_entry() -> Result<(), Box<dyn Error>> {
    let alloc = CountingAllocator::default();
    let mut tree: DropGuard<AllocatedRbTreeMap<u32, u32>, _> =
        (1..=7).map(|k| (k, k * k)).collect_in(&alloc)?;

    unsafe {
        for expected in 1..=3 {
            let entry = tree.first_entry_in(&alloc).unwrap();
            assert_eq!(entry.remove_entry(), (expected, expected * expected));
            check_invariants(&tree);
        }
        for expected in (4..=7).rev() {
            let entry = tree.last_entry_in(&alloc).unwrap();
            assert_eq!(entry.remove_entry(), (expected, expected * expected));
            check_invariants(&tree);
        }

        assert!(tree.first_entry_in(&alloc).is_none());
    }

    core::mem::drop(tree);
    _assert_allocations(alloc, 7);

    Ok(())
}

#[test]
fn test_rotations_preserve_order() -> Result<(), Box<dyn Error>> {
    let alloc = CountingAllocator::default();
    let mut tree: DropGuard<AllocatedRbTreeMap<u32, u32>, _> =
        (1..=7).map(|k| (k, k)).collect_in(&alloc)?;

    let root = tree.root.unwrap();
    let before: Vec<_> = tree.keys().copied().collect();

    tree.rotate_left(root);
    assert_equal(tree.keys().copied(), before.iter().copied());
    assert_eq!(tree.root, root.parent());
    assert!(tree.root.unwrap().is_root());

    let pivot = tree.root.unwrap();
    tree.rotate_right(pivot);
    assert_eq!(tree.root, Some(root));
    assert_equal(tree.keys().copied(), before.iter().copied());
    check_invariants(&tree);

    core::mem::drop(tree);
    _assert_allocations(alloc, 7);

    Ok(())
}

#[test]
fn test_vacant_entry_neighbours() -> Result<(), Box<dyn Error>> {
    let alloc = CountingAllocator::default();
    let mut map = wrapper::RbTreeMap::new_in(&alloc);

    for k in [50, 30, 70, 20, 40, 60, 80] {
        map.insert(k, ())?;
    }

    for (key, below, above) in [
        (10, None, Some(&20)),
        (25, Some(&20), Some(&30)),
        (35, Some(&30), Some(&40)),
        (45, Some(&40), Some(&50)),
        (55, Some(&50), Some(&60)),
        (75, Some(&70), Some(&80)),
        (90, Some(&80), None),
    ] {
        match map.entry(key) {
            Entry::Vacant(v) => {
                assert_eq!(v.key_below(), below, "below {key}");
                assert_eq!(v.key_above(), above, "above {key}");
            }
            Entry::Occupied(_) => panic!("Expected vacant entry for key {key}"),
        }
    }

    Ok(())
}

#[test]
fn test_wrapper() -> Result<(), Box<dyn Error>> {
    let alloc = CountingAllocator::default();
    let mut map = wrapper::RbTreeMap::new_in(&alloc);

    assert_eq!(map.remove(&1), Err(RemoveError::EmptyTree));

    for k in [5, 3, 7, 1, 9] {
        assert_eq!(map.insert(k, k.to_string())?, None);
    }
    assert_eq!(map.insert(3, "three".to_string())?, Some("3".to_string()));

    assert_eq!(map.len(), 5);
    assert_eq!(map[&3], "three");
    assert!(map.contains_key(&9));
    assert_eq!(map.get_key_value(&7), Some((&7, &"7".to_string())));
    map.get_mut(&7).unwrap().push('!');
    assert_eq!(map[&7], "7!");

    assert_eq!(map.remove(&4), Err(RemoveError::KeyNotFound));
    assert_eq!(map.remove_entry(&5), Ok((5, "5".to_string())));
    assert_eq!(map.len(), 4);
    check_invariants(&map.raw);

    assert_eq!(map.first_key_value(), Some((&1, &"1".to_string())));
    assert_eq!(map.last_key_value(), Some((&9, &"9".to_string())));
    assert_eq!(map.pop_first(), Some((1, "1".to_string())));
    assert_eq!(map.pop_last(), Some((9, "9".to_string())));
    assert_equal(map.keys().copied(), vec![3, 7]);
    assert_equal(&map, vec![(&3, &"three".to_string()), (&7, &"7!".to_string())]);

    map.clear();
    assert!(map.is_empty());
    assert_eq!(map.pop_first(), None);
    assert_eq!(alloc.net_allocations(), 0);

    map.extend((0..10).map(|k| (k, k.to_string())));
    assert_eq!(map.len(), 10);
    check_invariants(&map.raw);

    core::mem::drop(map);
    assert_eq!(alloc.net_allocations(), 0);
    assert_eq!(alloc.net_bytes_allocated(), 0);

    Ok(())
}

#[test]
fn test_wrapper_from_iter() {
    let map: wrapper::RbTreeMap<_, _> = (0..100).rev().map(|k| (k % 10, k)).collect();

    assert_eq!(map.len(), 10);
    assert_equal(map.iter().map(|(k, v)| (*k, *v)), (0..10).map(|k| (k, k)));
    assert_eq!(format!("{map:?}").len(), format!("{:?}", *map.raw).len());
    check_invariants(&map.raw);
}

#[test]
#[should_panic(expected = "no entry found for key")]
fn test_wrapper_index_missing_key() {
    let mut map = wrapper::RbTreeMap::new();
    map.insert(1, 1).unwrap();
    let _ = map[&2];
}

#[cfg(feature = "std")]
#[test]
fn test_to_dot() -> Result<(), Box<dyn Error>> {
    let mut map = wrapper::RbTreeMap::new();
    for k in 1..=3 {
        map.insert(k, k * k)?;
    }

    let dot = map.to_dot()?;
    assert!(dot.starts_with("digraph G {\n"));
    assert!(dot.ends_with("}\n"));
    assert_eq!(dot.matches("fillcolor=\"black\"").count(), 1);
    assert_eq!(dot.matches("fillcolor=\"red\"").count(), 2);
    assert_eq!(dot.matches(" -> ").count(), 2);
    assert!(dot.contains("label=\"2|4\""));

    Ok(())
}

#[test]
fn test_remove_error_messages() {
    assert_eq!(RemoveError::KeyNotFound.to_string(), "key not in tree");
    assert_eq!(RemoveError::EmptyTree.to_string(), "tree is empty");
}

proptest! {
    #[test]
    fn test_uints(mut map in prop::collection::vec((0..1000u32, 0..1000u32), 1..100)) {
        let alloc = CountingAllocator::default();
        let tree: DropGuard::<AllocatedRbTreeMap::<u32, u32>, _> = map.iter().copied().collect_in(&alloc)?;

        check_invariants(&tree);

        map.reverse();
        map.sort_by(|a, b| a.0.cmp(&b.0));
        let map: Vec<_> = map.into_iter().unique_by(|v| v.0).collect();

        assert_eq!(tree.len(), map.len());
        assert_equal(tree.iter().map(|(k, v)| (*k, *v)), map);

        core::mem::drop(tree);

        assert_eq!(alloc.net_allocations(), 0);
        assert_eq!(alloc.net_bytes_allocated(), 0);
    }
}

proptest! {
    #[test]
    fn test_strings(mut map in prop::collection::vec(".*", 1..100)) {
        let alloc = CountingAllocator::default();
        let tree: DropGuard::<AllocatedRbTreeMap::<String, ()>, _> = map.iter().map(|s| (s.clone(), ())).collect_in(&alloc)?;

        check_invariants(&tree);

        map.sort();
        let map: Vec<_> = map.into_iter().unique().collect();

        assert_eq!(tree.len(), map.len());
        assert_equal(tree.keys(), map.iter());

        core::mem::drop(tree);

        assert_eq!(alloc.net_allocations(), 0);
        assert_eq!(alloc.net_bytes_allocated(), 0);
    }
}

proptest! {
    #[test]
    fn test_insert_remove_sequence(ops in prop::collection::vec((any::<bool>(), 0..200u32), 1..400)) {
        let alloc = CountingAllocator::default();
        let mut tree = AllocatedRbTreeMap::<u32, u32>::new_in(&alloc);
        let mut expected = BTreeMap::new();

        for (insert, k) in ops {
            if insert {
                let old = unsafe { tree.insert_in(&alloc, k, k + 1)? };
                assert_eq!(old, expected.insert(k, k + 1));
            } else {
                let removed = unsafe { tree.remove_in(&alloc, &k) };
                match expected.remove(&k) {
                    Some(v) => assert_eq!(removed, Ok(v)),
                    None if expected.is_empty() => assert_eq!(removed, Err(RemoveError::EmptyTree)),
                    None => assert_eq!(removed, Err(RemoveError::KeyNotFound)),
                }
            }

            check_invariants(&tree);
            assert_eq!(tree.len(), expected.len());
        }

        assert_equal(tree.iter(), expected.iter());

        core::mem::drop(tree);

        assert_eq!(alloc.net_allocations(), 0);
        assert_eq!(alloc.net_bytes_allocated(), 0);
    }
}

fn _assert_allocations<A: Allocator>(alloc: CountingAllocator<A>, n_nodes: usize) {
    assert_eq!(alloc.net_allocations(), 0);
    assert_eq!(alloc.net_bytes_allocated(), 0);
    assert_eq!(alloc.n_allocations(), n_nodes);
    assert_eq!(alloc.n_deallocations(), n_nodes);
    assert_eq!(
        alloc.n_bytes_allocated(),
        n_nodes * size_of::<Node<u32, u32>>()
    );
    assert_eq!(
        alloc.n_bytes_deallocated(),
        n_nodes * size_of::<Node<u32, u32>>()
    );
}
