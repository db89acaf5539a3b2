//! An ordered set of unique keys backed by a treap: a binary search tree whose shape is kept
//! approximately balanced by a max-heap over random, or caller-supplied, per-node priorities.

#[macro_use]
extern crate serde_derive;

pub mod treap;

pub use crate::treap::{Error, Result, Treap};
