//! AVL tree implementation
//!
//! Ordered map from `String` keys to [`StoreEntry`] values. Every node owns
//! its subtrees; insert and delete recurse down the tree and hand the
//! (possibly rotated) subtree root back up.
//!
//! ## Invariants (hold after every mutation)
//! 1. In-order keys are strictly increasing
//! 2. `height = 1 + max(height(left), height(right))`, empty subtree = 0
//! 3. `height(left) - height(right)` is in {-1, 0, 1}
//! 4. Keys are unique
//!
//! Rotations are chosen from balance factors alone, never from payloads.

use std::cmp::Ordering;

use super::StoreEntry;
use crate::error::{RediError, Result};
use crate::protocol::{Encoding, Value};

type Link = Option<Box<Node>>;

#[derive(Debug)]
struct Node {
    key: String,
    entry: StoreEntry,
    height: u32,
    left: Link,
    right: Link,
}

impl Node {
    fn leaf(key: String, entry: StoreEntry) -> Box<Node> {
        Box::new(Node {
            key,
            entry,
            height: 1,
            left: None,
            right: None,
        })
    }

    fn update_height(&mut self) {
        self.height = 1 + height(&self.left).max(height(&self.right));
    }

    fn balance(&self) -> i64 {
        i64::from(height(&self.left)) - i64::from(height(&self.right))
    }
}

fn height(link: &Link) -> u32 {
    link.as_ref().map_or(0, |node| node.height)
}

fn balance_of(link: &Link) -> i64 {
    link.as_ref().map_or(0, |node| node.balance())
}

// =============================================================================
// Rotations
// =============================================================================

//       y            x
//      / \          / \
//     x   C   ->   A   y
//    / \              / \
//   A   B            B   C
fn rotate_right(mut y: Box<Node>) -> Box<Node> {
    let mut x = match y.left.take() {
        Some(x) => x,
        None => return y,
    };
    y.left = x.right.take();
    y.update_height();
    x.right = Some(y);
    x.update_height();
    x
}

//     x                y
//    / \              / \
//   A   y     ->     x   C
//      / \          / \
//     B   C        A   B
fn rotate_left(mut x: Box<Node>) -> Box<Node> {
    let mut y = match x.right.take() {
        Some(y) => y,
        None => return x,
    };
    x.right = y.left.take();
    x.update_height();
    y.left = Some(x);
    y.update_height();
    y
}

/// Restore the height and balance invariants at `node`, whose subtrees
/// already satisfy them.
fn rebalance(mut node: Box<Node>) -> Box<Node> {
    node.update_height();
    let balance = node.balance();

    if balance > 1 {
        // LR when the left child leans right, otherwise LL
        if balance_of(&node.left) < 0 {
            node.left = node.left.take().map(rotate_left);
        }
        return rotate_right(node);
    }

    if balance < -1 {
        // RL when the right child leans left, otherwise RR
        if balance_of(&node.right) > 0 {
            node.right = node.right.take().map(rotate_right);
        }
        return rotate_left(node);
    }

    node
}

// =============================================================================
// Recursive insert / delete
// =============================================================================

fn insert(link: Link, key: String, entry: StoreEntry, inserted: &mut bool) -> Box<Node> {
    let mut node = match link {
        Some(node) => node,
        None => {
            *inserted = true;
            return Node::leaf(key, entry);
        }
    };

    match key.cmp(&node.key) {
        Ordering::Less => node.left = Some(insert(node.left.take(), key, entry, inserted)),
        Ordering::Greater => node.right = Some(insert(node.right.take(), key, entry, inserted)),
        Ordering::Equal => {
            // Replace in place; the shape does not change
            node.entry = entry;
            return node;
        }
    }

    rebalance(node)
}

fn remove(link: Link, key: &str, removed: &mut bool) -> Link {
    let mut node = link?;

    match key.cmp(node.key.as_str()) {
        Ordering::Less => node.left = remove(node.left.take(), key, removed),
        Ordering::Greater => node.right = remove(node.right.take(), key, removed),
        Ordering::Equal => {
            *removed = true;
            match (node.left.take(), node.right.take()) {
                (None, None) => return None,
                (Some(child), None) | (None, Some(child)) => return Some(child),
                (Some(left), Some(right)) => {
                    // The in-order successor takes over both key and entry
                    let (right, successor) = take_min(right);
                    let Node { key, entry, .. } = *successor;
                    node.key = key;
                    node.entry = entry;
                    node.left = Some(left);
                    node.right = right;
                }
            }
        }
    }

    Some(rebalance(node))
}

/// Detach the minimum node of a subtree, returning the rebalanced remainder
/// and the detached node.
fn take_min(mut node: Box<Node>) -> (Link, Box<Node>) {
    match node.left.take() {
        None => {
            let right = node.right.take();
            (right, node)
        }
        Some(left) => {
            let (left, min) = take_min(left);
            node.left = left;
            (Some(rebalance(node)), min)
        }
    }
}

// =============================================================================
// Public tree
// =============================================================================

/// Height-balanced ordered map
#[derive(Debug, Default)]
pub struct AvlTree {
    root: Link,
    len: usize,
}

impl AvlTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Height of the root (0 when empty)
    pub fn height(&self) -> u32 {
        height(&self.root)
    }

    /// Insert a value, or replace the entry if the key exists.
    ///
    /// Returns true if the key was new.
    pub fn upsert(&mut self, key: impl Into<String>, value: Value, encoding: Encoding) -> bool {
        let mut inserted = false;
        let entry = StoreEntry::new(value, encoding);
        self.root = Some(insert(self.root.take(), key.into(), entry, &mut inserted));
        if inserted {
            self.len += 1;
        }
        inserted
    }

    /// Point lookup
    pub fn lookup(&self, key: &str) -> Option<&StoreEntry> {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            current = match key.cmp(node.key.as_str()) {
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
                Ordering::Equal => return Some(&node.entry),
            };
        }
        None
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// Remove a key. Returns true only if the key was present.
    pub fn remove(&mut self, key: &str) -> bool {
        let mut removed = false;
        self.root = remove(self.root.take(), key, &mut removed);
        if removed {
            self.len -= 1;
        }
        removed
    }

    /// All keys in ascending order
    pub fn keys(&self) -> Vec<String> {
        self.iter().map(|(key, _)| key.to_string()).collect()
    }

    /// In-order iterator over `(key, entry)` pairs
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self.root.as_deref())
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.root = None;
        self.len = 0;
    }

    /// Check every structural invariant, reporting the first violation
    pub fn validate(&self) -> Result<()> {
        let mut count = 0;
        check(&self.root, None, None, &mut count)?;
        if count != self.len {
            return Err(RediError::Internal(format!(
                "tree holds {} nodes but records {}",
                count, self.len
            )));
        }
        Ok(())
    }
}

fn check<'a>(
    link: &'a Link,
    lower: Option<&'a str>,
    upper: Option<&'a str>,
    count: &mut usize,
) -> Result<u32> {
    let node = match link {
        Some(node) => node,
        None => return Ok(0),
    };
    let key = node.key.as_str();

    if lower.map_or(false, |lower| key <= lower) || upper.map_or(false, |upper| key >= upper) {
        return Err(RediError::Internal(format!("key '{}' is out of order", key)));
    }

    let left = check(&node.left, lower, Some(key), count)?;
    let right = check(&node.right, Some(key), upper, count)?;
    *count += 1;

    if node.height != 1 + left.max(right) {
        return Err(RediError::Internal(format!(
            "key '{}' records height {} but its subtrees give {}",
            key,
            node.height,
            1 + left.max(right)
        )));
    }
    if left.abs_diff(right) > 1 {
        return Err(RediError::Internal(format!(
            "key '{}' is unbalanced ({} vs {})",
            key, left, right
        )));
    }

    Ok(node.height)
}

/// In-order iterator over the tree
pub struct Iter<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iter<'a> {
    fn new(root: Option<&'a Node>) -> Self {
        let mut iter = Self { stack: Vec::new() };
        iter.push_left(root);
        iter
    }

    fn push_left(&mut self, mut link: Option<&'a Node>) {
        while let Some(node) = link {
            self.stack.push(node);
            link = node.left.as_deref();
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a StoreEntry);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left(node.right.as_deref());
        Some((node.key.as_str(), &node.entry))
    }
}
