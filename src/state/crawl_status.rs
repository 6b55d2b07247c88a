/// Crawl status definitions for page records
///
/// This module defines the lifecycle states a page record moves through
/// between fetch and update cycles.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the crawl status of a page record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CrawlStatus {
    // ===== Pending =====
    /// Page is known but has not been fetched (or must be fetched again)
    Unfetched,

    // ===== Fetch Outcomes =====
    /// Page was fetched successfully
    Fetched,

    /// Page was fetched and answered with a temporary redirect
    RedirectTemp,

    /// Page was fetched and answered with a permanent redirect
    RedirectPerm,

    /// Page was fetched and reported no change since the last fetch
    NotModified,

    /// Fetch failed transiently and should be retried
    Retry,

    // ===== Retired =====
    /// Page is permanently gone; the record is kept
    Gone,
}

impl CrawlStatus {
    /// Returns true for outcomes of a successful fetch
    pub fn is_fetched(&self) -> bool {
        matches!(
            self,
            Self::Fetched | Self::RedirectTemp | Self::RedirectPerm | Self::NotModified
        )
    }

    /// Returns true if the page is waiting for a (re)fetch
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Unfetched | Self::Retry)
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Unfetched => "unfetched",
            Self::Fetched => "fetched",
            Self::RedirectTemp => "redir_temp",
            Self::RedirectPerm => "redir_perm",
            Self::NotModified => "not_modified",
            Self::Retry => "retry",
            Self::Gone => "gone",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "unfetched" => Some(Self::Unfetched),
            "fetched" => Some(Self::Fetched),
            "redir_temp" => Some(Self::RedirectTemp),
            "redir_perm" => Some(Self::RedirectPerm),
            "not_modified" => Some(Self::NotModified),
            "retry" => Some(Self::Retry),
            "gone" => Some(Self::Gone),
            _ => None,
        }
    }

    /// Returns all possible statuses
    pub fn all_statuses() -> Vec<Self> {
        vec![
            Self::Unfetched,
            Self::Fetched,
            Self::RedirectTemp,
            Self::RedirectPerm,
            Self::NotModified,
            Self::Retry,
            Self::Gone,
        ]
    }
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
