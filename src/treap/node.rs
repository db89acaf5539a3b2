use crate::treap::tree;

/// The child slot a search descends into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Side {
    Left,
    Right,
}

/// A struct representing an internal node of a treap.
#[derive(Serialize)]
pub struct Node<T> {
    pub key: T,
    pub priority: u32,
    pub left: tree::Tree<T>,
    pub right: tree::Tree<T>,
}

impl<T> Node<T> {
    pub fn new(key: T, priority: u32) -> Self {
        Node {
            key,
            priority,
            left: None,
            right: None,
        }
    }

    pub fn child(&self, side: Side) -> &tree::Tree<T> {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn child_mut(&mut self, side: Side) -> &mut tree::Tree<T> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    /// Returns `true` if `child` has a strictly greater priority than this node.
    pub fn is_heap_property_violated(&self, child: &tree::Tree<T>) -> bool {
        match child {
            Some(child_node) => child_node.priority > self.priority,
            None => false,
        }
    }
}
