//! State module for page records
//!
//! This module provides the page record kept in the crawl database and the
//! small enums that describe it.
//!
//! # Components
//!
//! - `CrawlStatus`: lifecycle status of a page (unfetched, fetched, retry, gone, ...)
//! - `Mark`: pipeline stages that have processed a page
//! - `PageCategory`: coarse page classification used by the fetch schedule
//! - `WebPage`: the persistent page record

mod crawl_status;
mod mark;
mod page_category;
mod web_page;

// Re-export main types
pub use crawl_status::CrawlStatus;
pub use mark::Mark;
pub use page_category::PageCategory;
pub use web_page::{
    earliest_valid_time, WebPage, DETAIL_LIKELIHOOD_THRESHOLD, EARLIEST_VALID_SECS, META_CASH,
    META_NO_FETCH, META_SEED, NEVER_FETCH_INTERVAL_DAYS, NEVER_FETCH_INTERVAL_SECS, UNKNOWN_DEPTH,
};
