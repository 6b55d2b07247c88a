//! Scoring filters
//!
//! A scoring filter decides how much link score a page hands to each of its
//! outlinks and how the weights arriving over inbound edges turn into the
//! page's own score. Filters are selected by name in configuration.
//!
//! # Filters
//!
//! - `opic`: on-line page importance computation (cash flows along links)
//! - `link`: scores come from an external link analysis and are left alone

mod link;
mod opic;

pub use link::LinkAnalysisScoringFilter;
pub use opic::OpicScoringFilter;

use crate::config::Config;
use crate::graph::{WebEdge, WebGraph};
use crate::state::WebPage;
use crate::{ConfigError, ConfigResult};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by a scoring filter for a single page
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Invalid score {score} for {url}")]
    InvalidScore { url: String, score: f32 },

    #[error("Invalid weight {weight} on edge {source_url} -> {target_url}")]
    InvalidWeight {
        source_url: String,
        target_url: String,
        weight: f32,
    },
}

/// Result type for scoring operations
pub type ScoringResult<T> = Result<T, ScoringError>;

/// A pluggable link scoring policy
pub trait ScoringFilter: Send + Sync {
    /// Filter name as used in configuration
    fn name(&self) -> &'static str;

    /// Sets the starting score of a page discovered through a link
    fn initial_score(&self, url: &str, page: &mut WebPage) -> ScoringResult<()>;

    /// Assigns a weight to every outgoing edge of a fetched page
    ///
    /// `out_degree` counts the outlinks the score is divided across; loop
    /// edges in `edges` must be left untouched.
    fn distribute_to_outlinks(
        &self,
        url: &str,
        page: &mut WebPage,
        edges: &mut [WebEdge],
        out_degree: usize,
    ) -> ScoringResult<()>;

    /// Folds the weights of the inbound edges into the page's score
    fn update_score(
        &self,
        url: &str,
        page: &mut WebPage,
        graph: &WebGraph,
        incoming: &[&WebEdge],
    ) -> ScoringResult<()>;

    /// Sort value used when generating fetch lists
    fn generator_sort_value(&self, url: &str, page: &WebPage, init_sort: f32)
        -> ScoringResult<f32>;

    /// Boost given to the page at index time
    fn indexer_score(&self, url: &str, page: &WebPage, init_score: f32) -> ScoringResult<f32>;
}

/// Builds the scoring filter named in the configuration
pub fn build_scoring_filter(config: &Config) -> ConfigResult<Arc<dyn ScoringFilter>> {
    let scoring = &config.scoring;
    let filter: Arc<dyn ScoringFilter> = match scoring.class.as_str() {
        "opic" => Arc::new(OpicScoringFilter::new(
            scoring.internal_link_factor,
            scoring.external_link_factor,
        )),
        "link" => Arc::new(LinkAnalysisScoringFilter::new(scoring.normalize_score)),
        other => {
            return Err(ConfigError::UnknownClass {
                kind: "scoring filter",
                name: other.to_string(),
            })
        }
    };
    Ok(filter)
}
