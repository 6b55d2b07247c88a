use crate::state::CrawlStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-cycle counters
///
/// Every map task and reduce partition owns one set; the cycle driver merges
/// them once the workers are joined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateCounters {
    // ===== Emitter =====
    /// Page records scanned
    pub rows: u64,
    /// Records that could not be decoded and were left out
    pub rows_corrupt: u64,
    /// Pages expanded into shards
    pub rows_mapped: u64,
    /// Outlink shards emitted
    pub new_rows_mapped: u64,
    /// Pages skipped because they carry no unapplied fetch
    pub not_fetched: u64,
    /// Pages skipped for exceeding the maximum distance
    pub too_deep: u64,
    pub outlinks_truncated: u64,

    // ===== Shuffle =====
    pub shard_write_errors: u64,
    pub shard_read_errors: u64,

    // ===== Reconstruction =====
    /// URL groups reduced
    pub groups: u64,
    /// Pages whose depth was lowered
    pub pages_depth_up: u64,
    pub pages_persist: u64,
    /// Focus pages loaded from the crawl database
    pub exist_out_pages: u64,
    pub new_pages: u64,
    pub new_detail_pages: u64,
    /// Unknown targets dropped because additions are disabled
    pub not_fetched_dropped: u64,
    pub inlinks_truncated: u64,
    pub scoring_errors: u64,
    pub store_errors: u64,
    /// Groups skipped because of an error
    pub failed_updates: u64,
    pub forced_refetches: u64,
    pub failed_partitions: u64,

    /// Status of every in-batch page after its update
    pub status: BTreeMap<CrawlStatus, u64>,
}

impl UpdateCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count_status(&mut self, status: CrawlStatus) {
        *self.status.entry(status).or_insert(0) += 1;
    }

    pub fn status_count(&self, status: CrawlStatus) -> u64 {
        self.status.get(&status).copied().unwrap_or(0)
    }

    /// Adds another worker's counters into these
    pub fn merge(&mut self, other: &UpdateCounters) {
        self.rows += other.rows;
        self.rows_corrupt += other.rows_corrupt;
        self.rows_mapped += other.rows_mapped;
        self.new_rows_mapped += other.new_rows_mapped;
        self.not_fetched += other.not_fetched;
        self.too_deep += other.too_deep;
        self.outlinks_truncated += other.outlinks_truncated;
        self.shard_write_errors += other.shard_write_errors;
        self.shard_read_errors += other.shard_read_errors;
        self.groups += other.groups;
        self.pages_depth_up += other.pages_depth_up;
        self.pages_persist += other.pages_persist;
        self.exist_out_pages += other.exist_out_pages;
        self.new_pages += other.new_pages;
        self.new_detail_pages += other.new_detail_pages;
        self.not_fetched_dropped += other.not_fetched_dropped;
        self.inlinks_truncated += other.inlinks_truncated;
        self.scoring_errors += other.scoring_errors;
        self.store_errors += other.store_errors;
        self.failed_updates += other.failed_updates;
        self.forced_refetches += other.forced_refetches;
        self.failed_partitions += other.failed_partitions;

        for (status, count) in &other.status {
            *self.status.entry(*status).or_insert(0) += count;
        }
    }

    /// Total number of per-record errors
    pub fn errors(&self) -> u64 {
        self.rows_corrupt
            + self.shard_write_errors
            + self.shard_read_errors
            + self.scoring_errors
            + self.store_errors
            + self.failed_updates
    }
}
