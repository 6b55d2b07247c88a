//! The out-graph update
//!
//! This module turns the pages fetched in a crawl batch into updated page
//! records for every URL they touch.
//!
//! # Components
//!
//! - `mapper`: expands each fetched page into one-edge shards
//! - `shuffle`: partitions, sorts and groups the shards by target URL
//! - `reducer`: rebuilds each URL's inbound neighbourhood and updates its page
//! - `coordinator`: runs the stages over the crawl database
//! - `counters`: per-cycle counters merged across workers

mod coordinator;
mod counters;
pub mod mapper;
pub mod reducer;
pub mod shuffle;

pub use coordinator::{run_update, CycleReport, UpdateCoordinator};
pub use counters::UpdateCounters;
pub use mapper::OutGraphMapper;
pub use reducer::{OutGraphReducer, PageExistence};
pub use shuffle::TransportError;

use crate::{Result, UpdateError};
use std::sync::{Mutex, MutexGuard};

/// Locks the shared crawl database
///
/// A poisoned lock means a worker panicked mid-write; it is reported as a
/// worker failure instead of being recovered.
pub(crate) fn lock_store<S>(store: &Mutex<S>) -> Result<MutexGuard<'_, S>> {
    store
        .lock()
        .map_err(|_| UpdateError::Worker("storage lock poisoned".to_string()))
}
