use crate::treap::node::Node;
use crate::treap::tree;
use crate::treap::{Error, Result};
use log::trace;
use rand::{Rng, SeedableRng, XorShiftRng};
use std::fmt;

/// An ordered set of unique keys implemented using a treap.
///
/// A treap is a tree that satisfies both the binary search tree property and a heap property. Each
/// node has a key and a priority. The key of any node is greater than all keys in its left subtree
/// and less than all keys occuring in its right subtree. The priority of a node is greater than or
/// equal to the priority of its children. By randomly generating priorities, the expected height
/// of the tree is proportional to the logarithm of the number of keys.
///
/// Priorities are drawn from a generator owned by the treap. Constructing the treap with
/// `Treap::with_seed` makes the sequence of priorities, and therefore the shape of the tree,
/// reproducible.
///
/// Every operation walks the tree iteratively, so a degenerate shape built from explicit
/// priorities costs time but never call stack. The one exception is `Serialize`, whose nested
/// output recurses once per level of the tree.
///
/// # Examples
///
/// ```
/// use treap_set::Treap;
///
/// let mut treap = Treap::new();
/// assert!(treap.insert(0));
/// assert!(treap.insert(3));
/// assert!(!treap.insert(3));
///
/// assert_eq!(treap.len(), 2);
/// assert!(treap.contains(&3));
///
/// assert!(treap.remove(&0));
/// assert!(!treap.remove(&1));
/// ```
#[derive(Serialize)]
pub struct Treap<T> {
    root: tree::Tree<T>,
    len: usize,
    #[serde(skip)]
    rng: XorShiftRng,
}

impl<T> Treap<T>
where
    T: Ord,
{
    /// Constructs a new, empty `Treap<T>` whose generator is seeded from the operating system.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_set::Treap;
    ///
    /// let treap: Treap<u32> = Treap::new();
    /// assert!(treap.is_empty());
    /// ```
    pub fn new() -> Self {
        Treap {
            root: None,
            len: 0,
            rng: rand::weak_rng(),
        }
    }

    /// Constructs a new, empty `Treap<T>` with a deterministic priority generator. Two treaps
    /// built with the same seed and the same sequence of operations have identical structure.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_set::Treap;
    ///
    /// let mut a = Treap::with_seed(7);
    /// let mut b = Treap::with_seed(7);
    /// for key in 0..10 {
    ///     a.insert(key);
    ///     b.insert(key);
    /// }
    /// assert_eq!(a.to_string(), b.to_string());
    /// ```
    pub fn with_seed(seed: u64) -> Self {
        Treap {
            root: None,
            len: 0,
            rng: XorShiftRng::from_seed(expand_seed(seed)),
        }
    }

    /// Inserts a key into the treap with a randomly drawn priority. Returns `false` and leaves
    /// the treap unchanged if the key already exists.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_set::Treap;
    ///
    /// let mut treap = Treap::new();
    /// assert!(treap.insert(1));
    /// assert!(treap.contains(&1));
    /// assert!(!treap.insert(1));
    /// ```
    pub fn insert(&mut self, key: T) -> bool {
        let priority = self.rng.gen_range(0, u32::max_value());
        trace!("drew priority {}", priority);
        self.insert_with_priority(key, priority)
    }

    /// Inserts a key into the treap with an explicit priority. Returns `false` and leaves the
    /// treap unchanged if the key already exists.
    ///
    /// A node is rotated above its parent only if its priority is strictly greater, so nodes with
    /// equal priorities keep the depth order in which they were inserted.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_set::Treap;
    ///
    /// let mut treap = Treap::new();
    /// treap.insert_with_priority(2, 10);
    /// treap.insert_with_priority(1, 20);
    /// assert_eq!(treap.to_string(), "1,20 (-) (2,10 (-) (-))");
    /// ```
    pub fn insert_with_priority(&mut self, key: T, priority: u32) -> bool {
        let inserted = tree::insert(&mut self.root, Node::new(key, priority));
        if inserted {
            self.len += 1;
        }
        trace!("insert with priority {}: {} (len {})", priority, inserted, self.len);
        inserted
    }

    /// Removes a key from the treap. Returns `false` if the key does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_set::Treap;
    ///
    /// let mut treap = Treap::new();
    /// treap.insert(1);
    /// assert!(treap.remove(&1));
    /// assert!(!treap.remove(&1));
    /// ```
    pub fn remove(&mut self, key: &T) -> bool {
        let removed = tree::remove(&mut self.root, key).is_some();
        if removed {
            self.len -= 1;
        }
        trace!("remove: {} (len {})", removed, self.len);
        removed
    }

    /// Checks if a key exists in the treap.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_set::Treap;
    ///
    /// let mut treap = Treap::new();
    /// treap.insert(1);
    /// assert!(!treap.contains(&0));
    /// assert!(treap.contains(&1));
    /// ```
    pub fn contains(&self, key: &T) -> bool {
        tree::contains(&self.root, key)
    }

    /// Inserts a possibly absent key. Returns `Error::InvalidArgument` without drawing a priority
    /// or touching the treap if the key is `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_set::{Error, Treap};
    ///
    /// let mut treap = Treap::new();
    /// assert_eq!(treap.try_insert(Some(1)), Ok(true));
    /// assert_eq!(treap.try_insert(Some(1)), Ok(false));
    /// assert_eq!(
    ///     treap.try_insert(None),
    ///     Err(Error::InvalidArgument("key cannot be absent")),
    /// );
    /// ```
    pub fn try_insert(&mut self, key: Option<T>) -> Result<bool> {
        let key = key.ok_or(Error::InvalidArgument("key cannot be absent"))?;
        Ok(self.insert(key))
    }

    /// Inserts a possibly absent key with an explicit priority. Returns
    /// `Error::InvalidArgument` without touching the treap if the key is `None`.
    pub fn try_insert_with_priority(&mut self, key: Option<T>, priority: u32) -> Result<bool> {
        let key = key.ok_or(Error::InvalidArgument("key cannot be absent"))?;
        Ok(self.insert_with_priority(key, priority))
    }

    /// Removes a possibly absent key. Returns `Error::InvalidArgument` without touching the treap
    /// if the key is `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_set::Treap;
    ///
    /// let mut treap: Treap<u32> = Treap::new();
    /// assert_eq!(treap.try_remove(Some(&1)), Ok(false));
    /// assert!(treap.try_remove(None).is_err());
    /// ```
    pub fn try_remove(&mut self, key: Option<&T>) -> Result<bool> {
        let key = key.ok_or(Error::InvalidArgument("key cannot be absent"))?;
        Ok(self.remove(key))
    }

    /// Checks if a possibly absent key exists in the treap. Returns `Error::InvalidArgument` if
    /// the key is `None`.
    pub fn try_contains(&self, key: Option<&T>) -> Result<bool> {
        let key = key.ok_or(Error::InvalidArgument("key cannot be absent"))?;
        Ok(self.contains(key))
    }
}

impl<T> Treap<T> {
    /// Returns the number of keys in the treap.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_set::Treap;
    ///
    /// let mut treap = Treap::new();
    /// treap.insert(1);
    /// assert_eq!(treap.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the treap has no keys.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of nodes on the longest path from the root to a leaf.
    ///
    /// # Examples
    ///
    /// ```
    /// use treap_set::Treap;
    ///
    /// let mut treap = Treap::new();
    /// assert_eq!(treap.height(), 0);
    /// treap.insert_with_priority(1, 5);
    /// treap.insert_with_priority(2, 3);
    /// assert_eq!(treap.height(), 2);
    /// ```
    pub fn height(&self) -> usize {
        tree::height(&self.root)
    }

    /// Removes every key from the treap. The state of the priority generator is kept.
    pub fn clear(&mut self) {
        tree::clear(&mut self.root);
        self.len = 0;
    }
}

impl<T> Clone for Treap<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        Treap {
            root: tree::clone(&self.root),
            len: self.len,
            rng: self.rng.clone(),
        }
    }
}

impl<T> Drop for Treap<T> {
    fn drop(&mut self) {
        tree::clear(&mut self.root);
    }
}

impl<T> Default for Treap<T>
where
    T: Ord,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Renders every node as `key,priority (LEFT) (RIGHT)`, with `-` for an empty subtree.
impl<T> fmt::Display for Treap<T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        tree::write_structure(&self.root, f, &|key: &T, f: &mut fmt::Formatter| write!(f, "{}", key))
    }
}

impl<T> fmt::Debug for Treap<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Treap {{ len: {}, root: ", self.len)?;
        tree::write_structure(&self.root, f, &|key: &T, f: &mut fmt::Formatter| write!(f, "{:?}", key))?;
        write!(f, " }}")
    }
}

// XorShiftRng rejects an all-zero seed; the third word can never be zero.
fn expand_seed(seed: u64) -> [u32; 4] {
    let low = seed as u32;
    let high = (seed >> 32) as u32;
    [low, high, (low ^ 0x9E37_79B9) | 1, high ^ 0x7F4A_7C15]
}

#[cfg(test)]
mod tests {
    use super::{expand_seed, Treap};
    use crate::treap::tree;
    use crate::treap::Error;
    use rand::{Rng, SeedableRng, XorShiftRng};
    use std::collections::BTreeSet;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn is_valid<T: Ord>(treap: &Treap<T>) -> bool {
        tree::is_valid(&treap.root, treap.len)
    }

    #[test]
    fn test_len_empty() {
        let treap: Treap<u32> = Treap::new();
        assert_eq!(treap.len(), 0);
    }

    #[test]
    fn test_is_empty() {
        let treap: Treap<u32> = Treap::new();
        assert!(treap.is_empty());
    }

    #[test]
    fn test_insert() {
        let mut treap = Treap::new();
        assert!(treap.insert(1));
        assert!(treap.contains(&1));
        assert_eq!(treap.len(), 1);
    }

    #[test]
    fn test_insert_duplicate() {
        let mut treap = Treap::with_seed(1);
        assert!(treap.insert(1));
        treap.insert(2);
        let before = treap.to_string();
        assert!(!treap.insert(1));
        assert_eq!(treap.len(), 2);
        assert_eq!(treap.to_string(), before);
    }

    #[test]
    fn test_remove() {
        let mut treap = Treap::new();
        treap.insert(1);
        assert!(treap.remove(&1));
        assert!(!treap.contains(&1));
        assert!(treap.is_empty());
    }

    #[test]
    fn test_remove_missing() {
        let mut treap = Treap::with_seed(1);
        assert!(!treap.remove(&1));
        treap.insert(1);
        treap.insert(3);
        let before = treap.to_string();
        assert!(!treap.remove(&2));
        assert_eq!(treap.to_string(), before);
        assert_eq!(treap.len(), 2);
    }

    #[test]
    fn test_contains_empty() {
        let treap: Treap<u32> = Treap::new();
        assert!(!treap.contains(&1));
    }

    #[test]
    fn test_clear() {
        let mut treap = Treap::new();
        treap.insert(1);
        treap.insert(2);
        treap.clear();
        assert!(treap.is_empty());
        assert!(!treap.contains(&1));
        assert_eq!(treap.height(), 0);
    }

    #[test]
    fn test_display() {
        let mut treap = Treap::new();
        assert_eq!(treap.to_string(), "-");
        treap.insert_with_priority(2, 5);
        treap.insert_with_priority(1, 3);
        treap.insert_with_priority(3, 4);
        assert_eq!(treap.to_string(), "2,5 (1,3 (-) (-)) (3,4 (-) (-))");
    }

    #[test]
    fn test_debug() {
        let mut treap = Treap::new();
        treap.insert_with_priority("a", 1);
        assert_eq!(format!("{:?}", treap), "Treap { len: 1, root: \"a\",1 (-) (-) }");
    }

    #[test]
    fn test_try_operations_reject_absent_key() {
        let mut treap = Treap::with_seed(3);
        treap.insert(1);
        let before = treap.to_string();

        assert_eq!(treap.try_insert(None), Err(Error::InvalidArgument("key cannot be absent")));
        assert!(treap.try_insert_with_priority(None, 10).is_err());
        assert!(treap.try_remove(None).is_err());
        assert!(treap.try_contains(None).is_err());

        assert_eq!(treap.len(), 1);
        assert_eq!(treap.to_string(), before);
    }

    #[test]
    fn test_try_operations_with_key() {
        let mut treap = Treap::new();
        assert_eq!(treap.try_insert_with_priority(Some(1), 10), Ok(true));
        assert_eq!(treap.try_insert(Some(1)), Ok(false));
        assert_eq!(treap.try_contains(Some(&1)), Ok(true));
        assert_eq!(treap.try_remove(Some(&1)), Ok(true));
        assert_eq!(treap.try_remove(Some(&1)), Ok(false));
        assert_eq!(treap.try_contains(Some(&1)), Ok(false));
    }

    #[test]
    fn test_absent_key_does_not_draw_priority() {
        let mut a = Treap::with_seed(9);
        let mut b = Treap::with_seed(9);
        assert!(a.try_insert(None).is_err());
        a.insert(1);
        b.insert(1);
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_expand_seed_never_zero() {
        assert_ne!(expand_seed(0), [0, 0, 0, 0]);
        assert_ne!(expand_seed(1), expand_seed(2));
    }

    #[test]
    fn test_same_seed_same_structure() {
        let mut a = Treap::with_seed(42);
        let mut b = Treap::with_seed(42);
        for key in 0..100 {
            a.insert(key);
            b.insert(key);
        }
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_clone_is_independent() {
        let mut treap = Treap::with_seed(5);
        treap.insert(1);
        let mut copy = treap.clone();
        copy.remove(&1);
        assert!(treap.contains(&1));
        assert!(!copy.contains(&1));
    }

    #[test]
    fn test_invariants_under_random_operations() {
        init_logging();
        let mut rng: XorShiftRng = SeedableRng::from_seed([1, 1, 1, 1]);
        let mut treap = Treap::with_seed(11);
        let mut expected = BTreeSet::new();
        for _ in 0..2_000 {
            let key = rng.gen_range(0, 200u32);
            if rng.gen::<bool>() {
                assert_eq!(treap.insert(key), expected.insert(key));
            } else {
                assert_eq!(treap.remove(&key), expected.remove(&key));
            }
            assert_eq!(treap.len(), expected.len());
        }
        assert!(is_valid(&treap));
        for key in 0..200 {
            assert_eq!(treap.contains(&key), expected.contains(&key));
        }
    }

    #[test]
    fn test_invariants_with_colliding_priorities() {
        let mut rng: XorShiftRng = SeedableRng::from_seed([2, 3, 5, 7]);
        let mut treap = Treap::new();
        for _ in 0..1_000 {
            let key = rng.gen_range(0, 100u32);
            let priority = rng.gen_range(0, 4u32);
            treap.insert_with_priority(key, priority);
            if rng.gen_weighted_bool(3) {
                treap.remove(&rng.gen_range(0, 100u32));
            }
            assert!(is_valid(&treap));
        }
    }

    #[test]
    fn test_sorted_insertion_stays_shallow() {
        let mut treap = Treap::with_seed(8);
        for key in 0..10_000u32 {
            treap.insert(key);
        }
        assert!(is_valid(&treap));
        assert!(treap.height() < 64);
    }

    #[test]
    fn test_deep_chain() {
        let depth = 100_000u32;
        let mut treap = Treap::new();
        for priority in 0..depth {
            assert!(treap.insert_with_priority(2 * priority, priority));
        }
        assert_eq!(treap.height(), depth as usize);
        assert!(is_valid(&treap));

        assert!(treap.insert_with_priority(1, 0));
        assert!(treap.insert_with_priority(3, u32::max_value()));
        assert!(treap.to_string().starts_with("3,4294967295 ("));
        assert!(is_valid(&treap));

        let copy = treap.clone();
        assert_eq!(copy.len(), treap.len());
        assert!(is_valid(&copy));

        assert!(treap.remove(&0));
        assert!(treap.remove(&3));
        assert!(!treap.contains(&0));
        assert_eq!(treap.len(), depth as usize);
        assert!(is_valid(&treap));
    }
}
