//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::state::{CrawlStatus, WebPage};
use crate::storage::{CycleRecord, CycleStatus};
use crate::update::UpdateCounters;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Cycle not found: {0}")]
    CycleNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines the crawl database operations needed by the update
/// engine. Keys are reversed URLs. A backend is shared between workers
/// behind a mutex, so every call is a single atomic read or write.
pub trait Storage {
    // ===== Cycle Management =====

    /// Records the start of an update cycle
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    /// * `started_at` - The cycle clock
    ///
    /// # Returns
    ///
    /// The ID of the newly created cycle
    fn create_cycle(&mut self, config_hash: &str, started_at: DateTime<Utc>)
        -> StorageResult<i64>;

    /// Gets a cycle by ID
    fn get_cycle(&self, cycle_id: i64) -> StorageResult<CycleRecord>;

    /// Gets the most recent cycle
    fn get_latest_cycle(&self) -> StorageResult<Option<CycleRecord>>;

    /// Marks a cycle as finished and stores its counters
    fn complete_cycle(
        &mut self,
        cycle_id: i64,
        status: CycleStatus,
        counters: &UpdateCounters,
    ) -> StorageResult<()>;

    // ===== Page Management =====

    /// Gets the page stored under a reversed URL
    fn get_page(&self, reversed_url: &str) -> StorageResult<Option<WebPage>>;

    /// Inserts or replaces the page stored under a reversed URL
    fn put_page(&mut self, reversed_url: &str, page: &WebPage) -> StorageResult<()>;

    /// Loads every page record with its key, in key order
    ///
    /// A record that cannot be decoded is returned as an error next to its
    /// key; only a failure of the scan itself fails the call.
    fn scan_pages(&self) -> StorageResult<Vec<(String, StorageResult<WebPage>)>>;

    // ===== Statistics =====

    /// Counts pages by status
    fn count_pages_by_status(&self, status: CrawlStatus) -> StorageResult<u64>;

    /// Gets total page count
    fn count_total_pages(&self) -> StorageResult<u64>;

    /// Gets page count breakdown by depth
    ///
    /// Returns a map of depth -> number of pages at that depth; pages no
    /// seed path has reached are left out
    fn get_depth_breakdown(&self) -> StorageResult<HashMap<u32, usize>>;
}
