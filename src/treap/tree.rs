use crate::treap::node::{Node, Side};
use log::trace;
use std::cmp::Ordering;
use std::fmt;

pub type Tree<T> = Option<Box<Node<T>>>;

/// Rendered in place of an empty subtree by the structural dump.
pub const EMPTY_MARKER: &str = "-";

#[derive(Clone, Copy)]
enum Rotation {
    Left,
    Right,
}

enum RemovalCase {
    RemoveNode,
    RotateLeft,
    RotateRight,
}

fn rotate_left<T>(mut node: Box<Node<T>>) -> Box<Node<T>> {
    let mut child = match node.right.take() {
        Some(child) => child,
        None => unreachable!(),
    };
    trace!("rotating left: priority {} above {}", child.priority, node.priority);
    node.right = child.left.take();
    child.left = Some(node);
    child
}

fn rotate_right<T>(mut node: Box<Node<T>>) -> Box<Node<T>> {
    let mut child = match node.left.take() {
        Some(child) => child,
        None => unreachable!(),
    };
    trace!("rotating right: priority {} above {}", child.priority, node.priority);
    node.left = child.right.take();
    child.right = Some(node);
    child
}

// Replaces the subtree rooted at `tree` with its rotation; the promoted child lands in the same
// slot, so the parent (or the root) is updated in place.
fn rotate<T>(tree: &mut Tree<T>, rotation: Rotation) {
    let node = match tree.take() {
        Some(node) => node,
        None => unreachable!(),
    };
    *tree = Some(match rotation {
        Rotation::Left => rotate_left(node),
        Rotation::Right => rotate_right(node),
    });
}

// precondition: `tree` is not empty
fn child_slot<T>(tree: &mut Tree<T>, side: Side) -> &mut Tree<T> {
    match tree {
        Some(node) => node.child_mut(side),
        None => unreachable!(),
    }
}

// Returns the sides taken from the root down to the empty slot where `key` belongs, or `None` if
// `key` is already present.
fn search_path<T: Ord>(tree: &Tree<T>, key: &T) -> Option<Vec<Side>> {
    let mut path = Vec::new();
    let mut curr = tree;
    while let Some(node) = curr {
        let side = match key.cmp(&node.key) {
            Ordering::Less => Side::Left,
            Ordering::Greater => Side::Right,
            Ordering::Equal => return None,
        };
        path.push(side);
        curr = node.child(side);
    }
    Some(path)
}

/// Inserts `new_node` as a leaf and bubbles it up while its priority is strictly greater than its
/// parent's. Returns `false` and leaves the tree untouched if an equal key exists.
///
/// The nodes on the search path are unlinked into a stack, then relinked from the bottom up with
/// the new node rotated above every ancestor it outranks.
pub fn insert<T: Ord>(tree: &mut Tree<T>, new_node: Node<T>) -> bool {
    let path = match search_path(tree, &new_node.key) {
        Some(path) => path,
        None => return false,
    };

    let mut ancestors = Vec::with_capacity(path.len());
    let mut curr = tree.take();
    for side in path {
        let mut node = match curr {
            Some(node) => node,
            None => unreachable!(),
        };
        curr = node.child_mut(side).take();
        ancestors.push((node, side));
    }

    let mut promoted = Box::new(new_node);
    while let Some((mut parent, side)) = ancestors.pop() {
        *parent.child_mut(side) = Some(promoted);
        promoted = if parent.is_heap_property_violated(parent.child(side)) {
            match side {
                Side::Left => rotate_right(parent),
                Side::Right => rotate_left(parent),
            }
        } else {
            parent
        };
    }
    *tree = Some(promoted);
    true
}

fn get_removal_case<T>(node: &Node<T>) -> RemovalCase {
    match (&node.left, &node.right) {
        (Some(left_node), Some(right_node)) => {
            if left_node.priority > right_node.priority {
                RemovalCase::RotateRight
            } else {
                RemovalCase::RotateLeft
            }
        },
        (Some(_), None) => RemovalCase::RotateRight,
        (None, Some(_)) => RemovalCase::RotateLeft,
        (None, None) => RemovalCase::RemoveNode,
    }
}

// Rotates the root of `tree` down until it is a leaf, following it into its new slot after every
// rotation, then unlinks it.
fn rotate_down<T>(mut tree: &mut Tree<T>) -> Option<T> {
    loop {
        let case = match tree {
            Some(node) => get_removal_case(node),
            None => return None,
        };

        let side = match case {
            RemovalCase::RotateRight => {
                rotate(tree, Rotation::Right);
                Side::Right
            },
            RemovalCase::RotateLeft => {
                rotate(tree, Rotation::Left);
                Side::Left
            },
            RemovalCase::RemoveNode => return tree.take().map(|node| node.key),
        };
        tree = child_slot(tree, side);
    }
}

/// Removes the node holding `key`, returning its key, or `None` if no such node exists.
pub fn remove<T: Ord>(mut tree: &mut Tree<T>, key: &T) -> Option<T> {
    loop {
        let side = match tree {
            Some(node) => match key.cmp(&node.key) {
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
                Ordering::Equal => break,
            },
            None => return None,
        };
        tree = child_slot(tree, side);
    }
    rotate_down(tree)
}

pub fn contains<T: Ord>(tree: &Tree<T>, key: &T) -> bool {
    let mut curr = tree;
    while let Some(node) = curr {
        curr = match key.cmp(&node.key) {
            Ordering::Less => &node.left,
            Ordering::Greater => &node.right,
            Ordering::Equal => return true,
        };
    }
    false
}

pub fn height<T>(tree: &Tree<T>) -> usize {
    let mut max_depth = 0;
    let mut stack = vec![(tree, 1)];
    while let Some((curr, depth)) = stack.pop() {
        if let Some(node) = curr {
            max_depth = max_depth.max(depth);
            stack.push((&node.left, depth + 1));
            stack.push((&node.right, depth + 1));
        }
    }
    max_depth
}

/// Drops every node of `tree` one at a time, so the depth of the tree never reaches the call
/// stack.
pub fn clear<T>(tree: &mut Tree<T>) {
    let mut stack: Vec<Box<Node<T>>> = tree.take().into_iter().collect();
    while let Some(mut node) = stack.pop() {
        stack.extend(node.left.take());
        stack.extend(node.right.take());
    }
}

enum CloneStep<'a, T> {
    Visit(&'a Tree<T>),
    Build(&'a Node<T>),
}

/// Deep copy of `tree`, built in post-order with an explicit stack.
pub fn clone<T: Clone>(tree: &Tree<T>) -> Tree<T> {
    let mut steps = vec![CloneStep::Visit(tree)];
    let mut built: Vec<Tree<T>> = Vec::new();
    while let Some(step) = steps.pop() {
        match step {
            CloneStep::Visit(None) => built.push(None),
            CloneStep::Visit(Some(node)) => {
                steps.push(CloneStep::Build(node));
                steps.push(CloneStep::Visit(&node.right));
                steps.push(CloneStep::Visit(&node.left));
            },
            CloneStep::Build(node) => {
                let (right, left) = match (built.pop(), built.pop()) {
                    (Some(right), Some(left)) => (right, left),
                    _ => unreachable!(),
                };
                built.push(Some(Box::new(Node {
                    key: node.key.clone(),
                    priority: node.priority,
                    left,
                    right,
                })));
            },
        }
    }
    built.pop().and_then(|root| root)
}

enum WriteStep<'a, T> {
    Subtree(&'a Tree<T>),
    Text(&'static str),
}

/// Writes `key,priority (LEFT) (RIGHT)` for every node, using `write_key` for the keys.
pub fn write_structure<T, F>(tree: &Tree<T>, f: &mut fmt::Formatter, write_key: &F) -> fmt::Result
where
    F: Fn(&T, &mut fmt::Formatter) -> fmt::Result,
{
    let mut steps = vec![WriteStep::Subtree(tree)];
    while let Some(step) = steps.pop() {
        match step {
            WriteStep::Text(text) => f.write_str(text)?,
            WriteStep::Subtree(None) => f.write_str(EMPTY_MARKER)?,
            WriteStep::Subtree(Some(node)) => {
                write_key(&node.key, f)?;
                write!(f, ",{} (", node.priority)?;
                steps.push(WriteStep::Text(")"));
                steps.push(WriteStep::Subtree(&node.right));
                steps.push(WriteStep::Text(") ("));
                steps.push(WriteStep::Subtree(&node.left));
            },
        }
    }
    Ok(())
}

// Checks key order, heap order and node count of `tree` with an in-order walk.
#[cfg(test)]
pub fn is_valid<T: Ord>(tree: &Tree<T>, expected_len: usize) -> bool {
    let mut stack = Vec::new();
    let mut curr = tree;
    let mut prev: Option<&T> = None;
    let mut len = 0;
    loop {
        while let Some(node) = curr {
            if node.is_heap_property_violated(&node.left)
                || node.is_heap_property_violated(&node.right)
            {
                return false;
            }
            stack.push(node);
            curr = &node.left;
        }
        let node = match stack.pop() {
            Some(node) => node,
            None => break,
        };
        if let Some(prev_key) = prev {
            if *prev_key >= node.key {
                return false;
            }
        }
        prev = Some(&node.key);
        len += 1;
        curr = &node.right;
    }
    len == expected_len
}
