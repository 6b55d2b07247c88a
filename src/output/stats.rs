//! Statistics generation from the crawl database
//!
//! This module provides functionality for extracting and displaying
//! crawl database statistics from the storage layer.

use crate::state::CrawlStatus;
use crate::storage::{CycleRecord, Storage};
use crate::UpdateError;
use std::collections::BTreeMap;

/// Crawl database statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Total number of page records
    pub total_pages: u64,

    /// Count of pages by status
    pub pages_by_status: BTreeMap<CrawlStatus, u64>,

    /// Pages per known depth
    pub depth_breakdown: BTreeMap<u32, usize>,

    /// Pages no seed path has reached yet
    pub unreached_pages: u64,

    /// The most recent update cycle, if any
    pub latest_cycle: Option<CycleRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(UpdateError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<CrawlStatistics, UpdateError> {
    let total_pages = storage.count_total_pages()?;

    let mut pages_by_status = BTreeMap::new();
    for status in CrawlStatus::all_statuses() {
        let count = storage.count_pages_by_status(status)?;
        if count > 0 {
            pages_by_status.insert(status, count);
        }
    }

    let depth_breakdown: BTreeMap<u32, usize> =
        storage.get_depth_breakdown()?.into_iter().collect();
    let reached: u64 = depth_breakdown.values().map(|&n| n as u64).sum();

    Ok(CrawlStatistics {
        total_pages,
        pages_by_status,
        depth_breakdown,
        unreached_pages: total_pages.saturating_sub(reached),
        latest_cycle: storage.get_latest_cycle()?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Database Statistics ===\n");

    println!("Overview:");
    println!("  Total pages: {}", stats.total_pages);
    println!("  Unreached pages: {}", stats.unreached_pages);
    println!();

    println!("Pages by Status:");
    // Sort statuses by count (descending)
    let mut status_counts: Vec<_> = stats.pages_by_status.iter().collect();
    status_counts.sort_by(|a, b| b.1.cmp(a.1));

    for (status, count) in status_counts {
        println!("  {}: {} ({:.1}%)", status, count, percentage(*count, stats.total_pages));
    }
    println!();

    if !stats.depth_breakdown.is_empty() {
        println!("Pages by Depth:");
        for (depth, count) in &stats.depth_breakdown {
            println!("  {}: {}", depth, count);
        }
        println!();
    }

    match &stats.latest_cycle {
        Some(cycle) => {
            println!("Latest Cycle:");
            println!("  ID: {}", cycle.id);
            println!("  Status: {}", cycle.status.to_db_string());
            println!("  Started: {}", cycle.started_at);
            if let Some(finished) = &cycle.finished_at {
                println!("  Finished: {}", finished);
            }
            println!("  Config hash: {}", cycle.config_hash);
            if let Some(counters) = &cycle.counters {
                println!();
                super::print_counters(counters);
            }
        }
        None => println!("No update cycles recorded"),
    }
}

fn percentage(count: u64, total: u64) -> f64 {
    if total > 0 {
        (count as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}
