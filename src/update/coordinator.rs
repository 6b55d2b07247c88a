//! Update cycle coordinator
//!
//! Drives one out-graph update over the whole crawl database: scans every
//! page record, runs the map stage on parallel blocking workers, gathers the
//! shuffle, then reduces each partition on the same worker budget and writes
//! the results back. The crawl database is shared between workers behind a
//! mutex; it is never held across an await point.

use crate::config::Config;
use crate::schedule::{build_fetch_schedule, FetchSchedule};
use crate::scoring::{build_scoring_filter, ScoringFilter};
use crate::state::WebPage;
use crate::storage::{open_storage, CycleStatus, SqliteStorage, Storage, StorageResult};
use crate::update::mapper::OutGraphMapper;
use crate::update::reducer::OutGraphReducer;
use crate::update::shuffle::{Shuffle, ShuffleWriter};
use crate::update::{lock_store, UpdateCounters};
use crate::{Result, UpdateError};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Outcome of one update cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle_id: i64,
    pub status: CycleStatus,
    /// The cycle clock
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub counters: UpdateCounters,
}

/// Coordinates the map, shuffle and reduce stages of an update
pub struct UpdateCoordinator<S> {
    config: Arc<Config>,
    config_hash: String,
    storage: Arc<Mutex<S>>,
    schedule: Arc<dyn FetchSchedule>,
    scoring: Arc<dyn ScoringFilter>,
}

impl<S> UpdateCoordinator<S>
where
    S: Storage + Send + 'static,
{
    /// Creates a coordinator over an opened crawl database
    ///
    /// Fails if the configured schedule or scoring class is unknown.
    pub fn new(config: Config, config_hash: impl Into<String>, storage: Arc<Mutex<S>>) -> Result<Self> {
        let schedule = build_fetch_schedule(&config)?;
        let scoring = build_scoring_filter(&config)?;

        Ok(Self {
            config: Arc::new(config),
            config_hash: config_hash.into(),
            storage,
            schedule,
            scoring,
        })
    }

    /// Runs one update cycle with the current time as cycle clock
    pub async fn run(&self) -> Result<CycleReport> {
        self.run_at(Utc::now()).await
    }

    /// Runs one update cycle with an explicit cycle clock
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<CycleReport> {
        let started = Instant::now();
        let cycle_id = lock_store(&self.storage)?.create_cycle(&self.config_hash, now)?;
        tracing::info!("Starting update cycle {} (crawl {})", cycle_id, self.config.update.crawl_id);

        let scanned = lock_store(&self.storage)?.scan_pages();
        let rows = match scanned {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!("Failed to scan crawl database: {}", e);
                let failed = lock_store(&self.storage)?.complete_cycle(
                    cycle_id,
                    CycleStatus::Failed,
                    &UpdateCounters::new(),
                );
                if let Err(inner) = failed {
                    tracing::error!("Failed to record cycle failure: {}", inner);
                }
                return Err(e.into());
            }
        };
        tracing::info!("Scanned {} page records", rows.len());

        let mut counters = UpdateCounters::new();
        let rows = skip_corrupt_rows(rows, &mut counters);
        let shuffle = self.map_stage(rows, &mut counters).await;
        tracing::info!(
            "Map stage done: {} rows mapped, {} shards",
            counters.rows_mapped,
            shuffle.shard_count()
        );

        self.reduce_stage(shuffle, now, &mut counters).await?;

        let status = if counters.failed_partitions > 0 {
            CycleStatus::Partial
        } else {
            CycleStatus::Completed
        };
        lock_store(&self.storage)?.complete_cycle(cycle_id, status, &counters)?;

        let elapsed = started.elapsed();
        tracing::info!(
            "Update cycle {} {}: {} groups, {} pages written, {} new, {} errors in {:.2}s",
            cycle_id,
            status.to_db_string(),
            counters.groups,
            counters.pages_persist,
            counters.new_pages,
            counters.errors(),
            elapsed.as_secs_f64()
        );

        Ok(CycleReport {
            cycle_id,
            status,
            started_at: now,
            elapsed,
            counters,
        })
    }

    fn workers(&self) -> usize {
        self.config.update.workers.max(1)
    }

    /// Expands the scanned pages into a shuffle
    async fn map_stage(
        &self,
        rows: Vec<(String, WebPage)>,
        counters: &mut UpdateCounters,
    ) -> Shuffle {
        let partitions = self.config.update.partitions.max(1);
        let workers = self.workers();

        let mapper = Arc::new(OutGraphMapper::new(&self.config.update, self.scoring.clone()));
        mapper.log_setup(&self.config.update.crawl_id);

        let mut chunks: Vec<Vec<(String, WebPage)>> = (0..workers).map(|_| Vec::new()).collect();
        for (i, row) in rows.into_iter().enumerate() {
            chunks[i % workers].push(row);
        }

        let mut tasks = JoinSet::new();
        for chunk in chunks.into_iter().filter(|c| !c.is_empty()) {
            let mapper = mapper.clone();
            tasks.spawn_blocking(move || {
                let mut writer = ShuffleWriter::new(partitions);
                let mut local = UpdateCounters::new();
                for (reversed_url, page) in chunk {
                    mapper.map(&reversed_url, page, &mut writer, &mut local);
                }
                (writer, local)
            });
        }

        let mut shuffle = Shuffle::new(partitions);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((writer, local)) => {
                    shuffle.absorb(writer);
                    counters.merge(&local);
                }
                Err(e) => {
                    tracing::error!("Map task failed: {}", e);
                    counters.failed_partitions += 1;
                }
            }
        }
        shuffle
    }

    /// Reduces every partition of the shuffle, at most `workers` at a time
    async fn reduce_stage(
        &self,
        shuffle: Shuffle,
        now: DateTime<Utc>,
        counters: &mut UpdateCounters,
    ) -> Result<()> {
        let reducer = Arc::new(OutGraphReducer::new(
            &self.config,
            self.schedule.clone(),
            self.scoring.clone(),
            now,
        ));
        reducer.log_setup();

        let semaphore = Arc::new(Semaphore::new(self.workers()));
        let mut tasks = JoinSet::new();
        for partition in shuffle.into_partitions() {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| UpdateError::Worker(format!("Semaphore error: {}", e)))?;
            let reducer = reducer.clone();
            let storage = self.storage.clone();
            tasks.spawn_blocking(move || {
                let _permit = permit;
                let index = partition.index;
                (index, reducer.reduce_partition(partition, &storage))
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(local))) => counters.merge(&local),
                Ok((index, Err(e))) => {
                    tracing::error!("Reduce partition {} failed: {}", index, e);
                    counters.failed_partitions += 1;
                }
                Err(e) => {
                    tracing::error!("Reduce task failed: {}", e);
                    counters.failed_partitions += 1;
                }
            }
        }
        Ok(())
    }
}

/// Opens the configured crawl database and runs one update cycle
pub async fn run_update(config: Config, config_hash: &str) -> Result<CycleReport> {
    let storage = open_storage(Path::new(&config.storage.database_path))?;
    let storage: Arc<Mutex<SqliteStorage>> = Arc::new(Mutex::new(storage));

    let coordinator = UpdateCoordinator::new(config, config_hash, storage)?;
    coordinator.run().await
}

/// Drops the records that failed to decode, logging each by key
fn skip_corrupt_rows(
    rows: Vec<(String, StorageResult<WebPage>)>,
    counters: &mut UpdateCounters,
) -> Vec<(String, WebPage)> {
    rows.into_iter()
        .filter_map(|(reversed_url, page)| match page {
            Ok(page) => Some((reversed_url, page)),
            Err(e) => {
                tracing::error!("Skipping unreadable record {}: {}", reversed_url, e);
                counters.rows += 1;
                counters.rows_corrupt += 1;
                None
            }
        })
        .collect()
}
