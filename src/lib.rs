//! Ripple-Update: incremental link-graph update for a crawl database
//!
//! Given the pages fetched in a crawl batch, this crate rebuilds the inbound
//! neighbourhood of every affected URL, propagates link scores across the
//! edges, recomputes each page's next fetch, resolves page lifecycle state
//! against the crawl database, and writes the updated records back.

pub mod config;
pub mod graph;
pub mod output;
pub mod schedule;
pub mod scoring;
pub mod state;
pub mod storage;
pub mod update;
pub mod url;

use thiserror::Error;

/// Main error type for Ripple-Update operations
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Scoring error: {0}")]
    Scoring(#[from] scoring::ScoringError),

    #[error("Shard transport error: {0}")]
    Transport(#[from] update::TransportError),

    #[error("Empty shard group for {0}")]
    EmptyGroup(String),

    #[error("Worker failed: {0}")]
    Worker(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown {kind} class: {name}")]
    UnknownClass { kind: &'static str, name: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),

    #[error("Malformed reversed URL: {0}")]
    MalformedReversed(String),
}

/// Result type alias for Ripple-Update operations
pub type Result<T> = std::result::Result<T, UpdateError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use graph::{GraphGroupKey, WebEdge, WebGraph, WebVertex};
pub use state::{CrawlStatus, Mark, PageCategory, WebPage};
pub use url::{reverse_url, unreverse_url};
