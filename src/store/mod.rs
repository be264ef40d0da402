//! Store Module
//!
//! In-memory ordered storage for all key/value state.
//!
//! ## Responsibilities
//! - Insert-or-replace, point lookup and delete in O(log n)
//! - Ordered key enumeration
//! - Keep the tree height-balanced after every mutation
//!
//! ## Data Structure Choice
//! An AVL tree over owned boxed nodes:
//! - Ordered keys (needed for `keys`)
//! - Strict height bound, so worst-case lookups stay logarithmic
//! - No parent pointers: every recursive step returns the new subtree root

mod avl;

pub use avl::{AvlTree, Iter};

use crate::protocol::{Encoding, Value};

/// Entry stored under a key
#[derive(Debug, Clone, PartialEq)]
pub struct StoreEntry {
    pub value: Value,
    pub encoding: Encoding,
}

impl StoreEntry {
    pub fn new(value: Value, encoding: Encoding) -> Self {
        Self { value, encoding }
    }
}
