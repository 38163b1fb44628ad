//! Neighbor-set diffing.

use std::collections::HashSet;
use std::hash::Hash;

/// Diff two neighbor sets into `(appeared, disappeared)`.
///
/// `appeared` holds members of `new` absent from `old`; `disappeared` holds
/// members of `old` absent from `new`. The event router feeds consecutive
/// reachability snapshots through this to derive transition events.
pub fn diff_sets<T>(old: &HashSet<T>, new: &HashSet<T>) -> (Vec<T>, Vec<T>)
where
    T: Eq + Hash + Clone,
{
    let appeared = new.difference(old).cloned().collect();
    let disappeared = old.difference(new).cloned().collect();
    (appeared, disappeared)
}
