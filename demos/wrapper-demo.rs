//! Demonstrates the ergonomic wrapper type for the red-black tree.
//!
//! This example shows how to use the safe `RbTreeMap` wrapper instead of the
//! lower-level allocated type.

use allocated_rbtree::{RbTreeMap, RemoveError};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Red-Black Tree Demo ===\n");
    basic_demo()?;

    println!("\n=== Removal Demo ===\n");
    removal_demo()?;

    Ok(())
}

fn basic_demo() -> Result<(), Box<dyn std::error::Error>> {
    // Create a new map using the ergonomic wrapper
    let mut map = RbTreeMap::new();

    // Insert some key-value pairs (no unsafe blocks needed!)
    map.insert(3, "three")?;
    map.insert(1, "one")?;
    map.insert(4, "four")?;
    map.insert(1, "ONE")?; // Updates existing key
    map.insert(5, "five")?;
    map.insert(9, "nine")?;
    map.insert(2, "two")?;

    println!("Inserted {} items", map.len());
    println!("Key 1: {}", map[&1]);

    // Iterate over entries (sorted by key)
    println!("\nAll entries:");
    for (k, v) in &map {
        println!("  {} -> {}", k, v);
    }

    // Node colors, in key order
    print!("\nColors: ");
    for (k, color) in map.iter_colored() {
        print!("{}:{:?} ", k, color);
    }
    println!();

    if let Some(root) = map.root_key() {
        println!("Root key: {}", root);
    }

    // Use the entry API for in-place manipulation
    map.entry(6).or_insert("six")?;
    println!("\nAfter adding 6: {} items", map.len());

    Ok(())
}

fn removal_demo() -> Result<(), Box<dyn std::error::Error>> {
    let mut map: RbTreeMap<u32, u32> = (0..10).map(|i| (i, i * i)).collect();
    println!("Inserted {} items", map.len());

    let value = map.remove(&3)?;
    println!("Removed key 3 with value {}", value);

    match map.remove(&3) {
        Err(RemoveError::KeyNotFound) => println!("Key 3 is gone: {}", RemoveError::KeyNotFound),
        other => println!("Unexpected result: {:?}", other),
    }

    if let Some((k, v)) = map.pop_first() {
        println!("Popped first entry: {} -> {}", k, v);
    }
    if let Some((k, v)) = map.pop_last() {
        println!("Popped last entry: {} -> {}", k, v);
    }

    print!("\nKeys: ");
    for k in map.keys() {
        print!("{} ", k);
    }
    println!();

    map.clear();
    println!("\nAfter clear: {} items", map.len());

    if let Err(err) = map.remove(&0) {
        println!("Removing from the empty map: {}", err);
    }

    Ok(())
}
