//! Storage module for the crawl database
//!
//! This module handles all database operations of the update engine:
//! - SQLite database initialization and schema management
//! - Page records keyed by reversed URL
//! - Update cycle tracking with the final counters of each cycle

mod schema;
mod sqlite;
mod traits;

pub use sqlite::{init_database, SqliteStorage};
pub use traits::{Storage, StorageError, StorageResult};

use crate::update::UpdateCounters;
use crate::UpdateError;

use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(UpdateError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, UpdateError> {
    SqliteStorage::new(path)
}

/// Represents one update cycle
#[derive(Debug, Clone)]
pub struct CycleRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: CycleStatus,
    pub counters: Option<UpdateCounters>,
}

/// Status of an update cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStatus {
    Running,
    /// Every partition finished
    Completed,
    /// Finished, but at least one partition failed
    Partial,
    Failed,
}

impl CycleStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "partial" => Some(Self::Partial),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
