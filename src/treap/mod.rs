//! Probabilistic binary search tree where each node also maintains the heap invariant.

mod node;
mod set;
mod tree;

pub use self::set::Treap;

use std::error;
use std::fmt;
use std::result;

#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// A required argument was absent. The treap is left unchanged.
    InvalidArgument(&'static str),
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidArgument(reason) => write!(f, "invalid argument: {}", reason),
        }
    }
}

pub type Result<T> = result::Result<T, Error>;
