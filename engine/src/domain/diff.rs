//! Child-set diffing.
//!
//! Child rows are never mutated in place: a changed attachment or
//! participant is modelled as remove-old-key plus add-new-key, so the only
//! question a synchronizer ever asks is "which keys are new, which are
//! gone". This module answers it, generically over key and item shape.

use std::collections::HashSet;
use std::hash::Hash;

/// Add/remove partitions computed by [`diff_children`].
///
/// Ordering of either list is unspecified; callers must not rely on the
/// relative order of additions and removals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildSetDiff<K, T> {
    /// Desired items whose key is not yet persisted.
    pub to_add: Vec<T>,
    /// Persisted keys no longer present among the desired items.
    pub to_remove: Vec<K>,
}

/// Partition a desired child collection against the persisted key set.
///
/// Items whose key appears in both sets are left untouched. An empty
/// `existing` set is the create path: nothing to remove, everything to
/// add, no separate branch needed.
///
/// # Examples
/// ```
/// use std::collections::HashSet;
/// use tripsync::domain::diff_children;
///
/// let existing: HashSet<&str> = ["a.png", "b.png"].into();
/// let diff = diff_children(&existing, vec!["b.png", "c.png"], |name| *name);
/// assert_eq!(diff.to_add, vec!["c.png"]);
/// assert_eq!(diff.to_remove, vec!["a.png"]);
/// ```
pub fn diff_children<K, T, F>(existing: &HashSet<K>, desired: Vec<T>, key_of: F) -> ChildSetDiff<K, T>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> K,
{
    let desired_keys: HashSet<K> = desired.iter().map(&key_of).collect();
    let to_remove = existing.difference(&desired_keys).cloned().collect();
    let to_add = desired
        .into_iter()
        .filter(|item| !existing.contains(&key_of(item)))
        .collect();
    ChildSetDiff { to_add, to_remove }
}
