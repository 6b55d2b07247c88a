//! URL handling module for Ripple-Update
//!
//! This module provides the reversed-domain key codec used by the crawl
//! database and the shuffle, host comparison for scoring, and URL-shape
//! page classification for the fetch schedule.

mod category;
mod domain;
mod reverse;

// Re-export main functions
pub use category::sniff_page_category;
pub use domain::{extract_host, same_host};
pub use reverse::{reverse_url, unreverse_url};
