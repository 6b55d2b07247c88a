//! Link graph primitives
//!
//! Vertices are keyed by URL and own an optional page record; edges refer to
//! their endpoints by URL. Nothing holds a reference into another object, so
//! graphs can be split into one-edge shards, shipped across the shuffle and
//! merged again without ownership cycles.

mod group_key;
mod web_graph;

pub use group_key::GraphGroupKey;
pub use web_graph::WebGraph;

use crate::state::WebPage;
use serde::{Deserialize, Serialize};

/// A URL with the page record attached to it, if it has been resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebVertex {
    pub url: String,
    pub page: Option<WebPage>,
}

impl WebVertex {
    /// A vertex whose page has not been resolved
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            page: None,
        }
    }

    pub fn with_page(url: impl Into<String>, page: WebPage) -> Self {
        Self {
            url: url.into(),
            page: Some(page),
        }
    }

    pub fn has_page(&self) -> bool {
        self.page.is_some()
    }
}

/// A directed link between two URLs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebEdge {
    pub source: String,
    pub target: String,
    pub anchor: String,
    /// Score carried along the edge; 0.0 until a scoring filter assigns one
    pub weight: f32,
}

impl WebEdge {
    pub const DEFAULT_WEIGHT: f32 = 0.0;

    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            anchor: String::new(),
            weight: Self::DEFAULT_WEIGHT,
        }
    }

    pub fn with_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = anchor.into();
        self
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    /// Self-loops carry a page's own record through the shuffle; they are
    /// never links for scoring or depth purposes
    pub fn is_loop(&self) -> bool {
        self.source == self.target
    }
}
