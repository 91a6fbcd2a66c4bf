//! Shard set algebra
//!
//! Generic union / difference / equality used to fold the request set and
//! to report reconciliation diffs.

use std::collections::BTreeSet;

/// Identifier of a stream partition
pub type ShardId = u32;

/// Ordered, deduplicated set of shards
pub type ShardSet = BTreeSet<ShardId>;

/// Collect items into a deduplicated, ordered set
pub fn dedup<T, I>(items: I) -> BTreeSet<T>
where
    T: Ord,
    I: IntoIterator<Item = T>,
{
    items.into_iter().collect()
}

/// Elements present in either set
pub fn union<T: Ord + Clone>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> BTreeSet<T> {
    a.union(b).cloned().collect()
}

/// Elements of `a` that are not in `b`
pub fn difference<T: Ord + Clone>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> BTreeSet<T> {
    a.difference(b).cloned().collect()
}

/// Order- and duplicate-insensitive equality of two collections
pub fn same_members<'a, T, A, B>(a: A, b: B) -> bool
where
    T: Ord + 'a,
    A: IntoIterator<Item = &'a T>,
    B: IntoIterator<Item = &'a T>,
{
    let a: BTreeSet<&T> = a.into_iter().collect();
    let b: BTreeSet<&T> = b.into_iter().collect();
    a == b
}

/// Difference between what was requested and what the coordinator granted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShardDiff {
    /// Granted but not requested
    pub added: ShardSet,
    /// Requested but not granted
    pub removed: ShardSet,
}

impl ShardDiff {
    /// Compute the diff of a heartbeat response against its request
    pub fn between(proposed: &ShardSet, granted: &ShardSet) -> Self {
        Self {
            added: difference(granted, proposed),
            removed: difference(proposed, granted),
        }
    }

    /// True when the response matched the request exactly
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}
