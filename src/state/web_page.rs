//! The persistent page record
//!
//! One `WebPage` exists per canonical URL in the crawl database. The fetch
//! stage fills the content-bearing fields; the out-graph update maintains
//! links, score, depth, schedule and status.

use crate::state::{CrawlStatus, Mark, PageCategory};
use crate::url::sniff_page_category;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Depth of a page no seed path has reached yet
pub const UNKNOWN_DEPTH: u32 = u32::MAX;

/// Fetch interval marking a page that must never be fetched again
pub const NEVER_FETCH_INTERVAL_DAYS: i64 = 36_500;
pub const NEVER_FETCH_INTERVAL_SECS: i64 = NEVER_FETCH_INTERVAL_DAYS * 24 * 3600;

/// Timestamps before 1982-01-01 are treated as unknown
pub const EARLIEST_VALID_SECS: i64 = 378_691_200;

/// Category likelihood a page needs before it is treated as a detail page
pub const DETAIL_LIKELIHOOD_THRESHOLD: f32 = 0.85;

pub const META_SEED: &str = "_seed_";
pub const META_NO_FETCH: &str = "_nf_";
pub const META_CASH: &str = "_csh_";

pub fn earliest_valid_time() -> DateTime<Utc> {
    DateTime::from_timestamp(EARLIEST_VALID_SECS, 0).unwrap_or_default()
}

/// A page record of the crawl database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebPage {
    pub status: CrawlStatus,

    /// Next scheduled fetch (before an update: the time of the last fetch)
    pub fetch_time: DateTime<Utc>,
    pub prev_fetch_time: DateTime<Utc>,

    pub modified_time: DateTime<Utc>,
    pub prev_modified_time: DateTime<Utc>,

    /// Seconds between fetches
    pub fetch_interval: i64,

    pub retries_since_fetch: u32,
    pub fetch_count: u32,

    /// Shortest known link distance from a seed
    pub depth: u32,

    pub score: f32,

    pub signature: Option<Vec<u8>>,
    pub prev_signature: Option<Vec<u8>>,

    pub batch_id: Option<String>,
    pub crawl_id: Option<String>,

    pub publish_time: Option<DateTime<Utc>>,
    /// Newest publish time among the items this page links to
    pub ref_publish_time: Option<DateTime<Utc>>,

    pub page_category: PageCategory,
    pub page_category_likelihood: f32,

    /// Inbound link URL -> anchor text
    pub inlinks: BTreeMap<String, String>,
    /// Outbound link URL -> anchor text
    pub outlinks: BTreeMap<String, String>,

    /// Response headers of the last fetch
    pub headers: BTreeMap<String, String>,

    pub metadata: BTreeMap<String, Vec<u8>>,

    pub marks: BTreeMap<Mark, String>,
}

impl Default for WebPage {
    fn default() -> Self {
        Self {
            status: CrawlStatus::Unfetched,
            fetch_time: DateTime::default(),
            prev_fetch_time: DateTime::default(),
            modified_time: DateTime::default(),
            prev_modified_time: DateTime::default(),
            fetch_interval: 0,
            retries_since_fetch: 0,
            fetch_count: 0,
            depth: UNKNOWN_DEPTH,
            score: 0.0,
            signature: None,
            prev_signature: None,
            batch_id: None,
            crawl_id: None,
            publish_time: None,
            ref_publish_time: None,
            page_category: PageCategory::Unknown,
            page_category_likelihood: 0.0,
            inlinks: BTreeMap::new(),
            outlinks: BTreeMap::new(),
            headers: BTreeMap::new(),
            metadata: BTreeMap::new(),
            marks: BTreeMap::new(),
        }
    }
}

impl WebPage {
    /// Creates an empty, unfetched page record
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Marks =====

    pub fn has_mark(&self, mark: Mark) -> bool {
        self.marks.contains_key(&mark)
    }

    pub fn mark(&self, mark: Mark) -> Option<&str> {
        self.marks.get(&mark).map(String::as_str)
    }

    pub fn put_mark(&mut self, mark: Mark, batch_id: impl Into<String>) {
        self.marks.insert(mark, batch_id.into());
    }

    pub fn remove_mark(&mut self, mark: Mark) -> Option<String> {
        self.marks.remove(&mark)
    }

    /// True if the page carries a fetch that the out-graph update has not applied yet
    pub fn is_fetched_this_cycle(&self) -> bool {
        match self.mark(Mark::Fetch) {
            Some(fetch_batch) => self.mark(Mark::UpdateOutgraph) != Some(fetch_batch),
            None => false,
        }
    }

    // ===== Metadata flags =====

    pub fn is_seed(&self) -> bool {
        self.metadata.contains_key(META_SEED)
    }

    pub fn mark_seed(&mut self) {
        self.metadata.insert(META_SEED.to_string(), Vec::new());
    }

    pub fn is_no_fetch(&self) -> bool {
        self.metadata.contains_key(META_NO_FETCH)
    }

    pub fn set_no_fetch(&mut self) {
        self.metadata.insert(META_NO_FETCH.to_string(), Vec::new());
    }

    /// OPIC cash, stored as a big-endian f32
    pub fn cash(&self) -> Option<f32> {
        let raw = self.metadata.get(META_CASH)?;
        let bytes: [u8; 4] = raw.as_slice().try_into().ok()?;
        Some(f32::from_be_bytes(bytes))
    }

    pub fn set_cash(&mut self, cash: f32) {
        self.metadata
            .insert(META_CASH.to_string(), cash.to_be_bytes().to_vec());
    }

    // ===== Derived views =====

    /// Last-Modified response header, if present and parseable
    pub fn header_last_modified(&self) -> Option<DateTime<Utc>> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("last-modified"))
            .and_then(|(_, v)| DateTime::parse_from_rfc2822(v.trim()).ok())
            .map(|t| t.with_timezone(&Utc))
    }

    /// Whether this page very likely shows one single item
    ///
    /// A category assigned by the parser wins; otherwise the URL shape decides.
    pub fn very_like_detail_page(&self, url: &str) -> bool {
        match self.page_category {
            PageCategory::Unknown => sniff_page_category(url).is_detail(),
            category => {
                category.is_detail() && self.page_category_likelihood >= DETAIL_LIKELIHOOD_THRESHOLD
            }
        }
    }

    /// Depth a page linked from this one would have
    pub fn child_depth(&self) -> u32 {
        self.depth.saturating_add(1)
    }
}
