//! Output module for update reports and database statistics
//!
//! This module handles:
//! - Printing the counters of a finished update cycle
//! - Loading and printing statistics of the crawl database

pub mod stats;

pub use stats::{load_statistics, print_statistics, CrawlStatistics};

use crate::state::CrawlStatus;
use crate::update::{CycleReport, UpdateCounters};

/// Prints the outcome of an update cycle
pub fn print_cycle_report(report: &CycleReport) {
    println!("=== Update Cycle {} ===\n", report.cycle_id);
    println!("Status: {}", report.status.to_db_string());
    println!("Cycle clock: {}", report.started_at.to_rfc3339());
    println!("Duration: {:.2}s", report.elapsed.as_secs_f64());
    println!();
    print_counters(&report.counters);
}

/// Prints a set of cycle counters grouped by stage
pub fn print_counters(counters: &UpdateCounters) {
    println!("Emitter:");
    println!("  Rows scanned: {}", counters.rows);
    println!("  Rows mapped: {}", counters.rows_mapped);
    println!("  Outlink shards: {}", counters.new_rows_mapped);
    println!("  Not fetched this cycle: {}", counters.not_fetched);
    println!("  Too deep: {}", counters.too_deep);
    println!("  Outlinks truncated: {}", counters.outlinks_truncated);
    println!();

    println!("Reconstruction:");
    println!("  Groups: {}", counters.groups);
    println!("  Pages written: {}", counters.pages_persist);
    println!("  Loaded from database: {}", counters.exist_out_pages);
    println!(
        "  New pages: {} ({} detail)",
        counters.new_pages, counters.new_detail_pages
    );
    println!("  Dropped unknown targets: {}", counters.not_fetched_dropped);
    println!("  Depth lowered: {}", counters.pages_depth_up);
    println!("  Inlinks truncated: {}", counters.inlinks_truncated);
    println!("  Forced refetches: {}", counters.forced_refetches);
    println!();

    if !counters.status.is_empty() {
        println!("In-batch Status:");
        for status in CrawlStatus::all_statuses() {
            let count = counters.status_count(status);
            if count > 0 {
                println!("  {}: {}", status, count);
            }
        }
        println!();
    }

    if counters.errors() > 0 || counters.failed_partitions > 0 {
        println!("Errors:");
        println!("  Corrupt records: {}", counters.rows_corrupt);
        println!("  Shard writes: {}", counters.shard_write_errors);
        println!("  Shard reads: {}", counters.shard_read_errors);
        println!("  Scoring: {}", counters.scoring_errors);
        println!("  Storage: {}", counters.store_errors);
        println!("  Skipped updates: {}", counters.failed_updates);
        println!("  Failed partitions: {}", counters.failed_partitions);
    }
}
