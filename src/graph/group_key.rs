use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Routing and sort key of a shard in the shuffle
///
/// Shards are partitioned and grouped by the reversed target URL only; the
/// weight just orders shards inside a group (heaviest first).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphGroupKey {
    pub reversed_url: String,
    pub weight: f32,
}

impl GraphGroupKey {
    pub fn new(reversed_url: impl Into<String>, weight: f32) -> Self {
        Self {
            reversed_url: reversed_url.into(),
            weight,
        }
    }

    /// True if both keys belong to the same reduce group
    pub fn same_group(&self, other: &Self) -> bool {
        self.reversed_url == other.reversed_url
    }
}

// Ordering is total so keys can be sorted even with NaN weights
impl Ord for GraphGroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.reversed_url
            .cmp(&other.reversed_url)
            .then_with(|| other.weight.total_cmp(&self.weight))
    }
}

impl PartialOrd for GraphGroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for GraphGroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GraphGroupKey {}
