//! Node partitioning of one length's keyspace

use crate::codec::Keyspace;
use crate::error::{ConfigError, Result};
use std::fmt;

/// Inclusive position range `[start, end]`.
///
/// `end == start - 1` is the empty range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchRange {
    pub start: i64,
    pub end: i64,
}

impl SearchRange {
    /// Callers guarantee `start <= end + 1`
    pub(crate) fn new(start: i64, end: i64) -> Self {
        debug_assert!(start <= end.saturating_add(1), "inverted range {start}..={end}");
        Self { start, end }
    }

    /// Range `[start, end]`, or `None` when the bounds are inverted
    pub fn try_new(start: i64, end: i64) -> Option<Self> {
        (start <= end.saturating_add(1)).then_some(Self { start, end })
    }

    /// Every position of `length`
    pub fn full(keyspace: &Keyspace, length: usize) -> Self {
        Self::new(0, keyspace.total_combinations(length) - 1)
    }

    /// Number of positions, `end - start + 1`
    pub fn size(&self) -> i64 {
        self.end.saturating_sub(self.start).saturating_add(1).max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn contains(&self, position: i64) -> bool {
        self.start <= position && position <= self.end
    }
}

impl fmt::Display for SearchRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Range assigned to `node_index` out of `total_nodes` for `length`.
///
/// Every node gets `total / total_nodes` positions except the last, which
/// also takes the remainder. When there are fewer positions than nodes the
/// leading nodes get empty ranges.
pub fn partition(
    keyspace: &Keyspace,
    total_nodes: usize,
    node_index: usize,
    length: usize,
) -> Result<SearchRange> {
    if total_nodes == 0 {
        return Err(ConfigError::InvalidNodeCount(total_nodes).into());
    }
    if node_index >= total_nodes {
        return Err(ConfigError::NodeIndexOutOfRange {
            index: node_index,
            total: total_nodes,
        }
        .into());
    }
    if length == 0 {
        return Err(ConfigError::InvalidLength(length).into());
    }

    let total = keyspace.total_combinations(length);
    let chunk = total / total_nodes as i64;
    let start = chunk * node_index as i64;
    let end = if node_index == total_nodes - 1 {
        total - 1
    } else {
        chunk * (node_index as i64 + 1) - 1
    };

    Ok(SearchRange::new(start, end))
}
