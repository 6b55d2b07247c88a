//! Graph shard emitter
//!
//! Expands every page fetched in the current cycle into one-edge shards: one
//! per outlink, routed to the outlink target, plus a self-loop routed back to
//! the page itself that carries its full record to its own reduce group.

use crate::config::UpdateConfig;
use crate::graph::{GraphGroupKey, WebEdge, WebGraph, WebVertex};
use crate::scoring::ScoringFilter;
use crate::state::WebPage;
use crate::update::shuffle::ShardSink;
use crate::update::UpdateCounters;
use crate::url::{reverse_url, unreverse_url};
use std::collections::BTreeMap;
use std::sync::Arc;

/// The map stage of an update cycle
pub struct OutGraphMapper {
    scoring: Arc<dyn ScoringFilter>,
    max_distance: u32,
    max_outlinks: usize,
}

impl OutGraphMapper {
    pub fn new(config: &UpdateConfig, scoring: Arc<dyn ScoringFilter>) -> Self {
        Self {
            scoring,
            max_distance: config.max_distance,
            max_outlinks: config.max_outlinks,
        }
    }

    /// Logs the effective parameters of the stage
    pub fn log_setup(&self, crawl_id: &str) {
        tracing::info!(
            "OutGraphMapper: crawl_id={}, max_distance={}, max_outlinks={}, scoring={}",
            crawl_id,
            self.max_distance,
            self.max_outlinks,
            self.scoring.name()
        );
    }

    /// Emits the shards of one page record
    ///
    /// Per-page failures are logged and counted; nothing here aborts the map task.
    pub fn map(
        &self,
        reversed_url: &str,
        mut page: WebPage,
        sink: &mut dyn ShardSink,
        counters: &mut UpdateCounters,
    ) {
        counters.rows += 1;

        if !page.is_fetched_this_cycle() {
            counters.not_fetched += 1;
            return;
        }

        if page.depth > self.max_distance {
            tracing::debug!(
                "Skipping {}: depth {} exceeds {}",
                reversed_url,
                page.depth,
                self.max_distance
            );
            counters.too_deep += 1;
            return;
        }

        let url = match unreverse_url(reversed_url)
            .and_then(|url| reverse_url(&url))
            .and_then(|canonical| unreverse_url(&canonical).map(|url| (canonical, url)))
        {
            Ok((canonical, url)) if canonical == reversed_url => url,
            Ok((canonical, _)) => {
                // The loop shard would land in a different group than the record
                tracing::warn!(
                    "Skipping page stored under non-canonical key {} (expected {})",
                    reversed_url,
                    canonical
                );
                counters.failed_updates += 1;
                return;
            }
            Err(e) => {
                tracing::warn!("Skipping page with bad key {}: {}", reversed_url, e);
                counters.failed_updates += 1;
                return;
            }
        };

        // Targets are named by their canonical form so that every shard of a
        // group agrees on the focus URL
        let mut targets: BTreeMap<String, &str> = BTreeMap::new();
        for (target, anchor) in &page.outlinks {
            match reverse_url(target).and_then(|reversed| unreverse_url(&reversed)) {
                Ok(canonical) => {
                    targets.entry(canonical).or_insert(anchor.as_str());
                }
                Err(e) => {
                    tracing::warn!("Dropping link {} -> {}: {}", url, target, e);
                    counters.shard_write_errors += 1;
                }
            }
        }

        // A link to the page itself is carried by the self-loop
        targets.remove(&url);

        let candidates = targets.len();
        let mut edges: Vec<WebEdge> = targets
            .into_iter()
            .take(self.max_outlinks)
            .map(|(target, anchor)| WebEdge::new(url.as_str(), target).with_anchor(anchor))
            .collect();

        if candidates > edges.len() {
            tracing::debug!(
                "Truncated outlinks of {}: {} -> {}",
                url,
                candidates,
                edges.len()
            );
            counters.outlinks_truncated += (candidates - edges.len()) as u64;
        }

        let out_degree = edges.len();
        if let Err(e) = self
            .scoring
            .distribute_to_outlinks(&url, &mut page, &mut edges, out_degree)
        {
            tracing::warn!("Distributing score failed for {}: {}", reversed_url, e);
            counters.scoring_errors += 1;
            for edge in edges.iter_mut() {
                edge.weight = WebEdge::DEFAULT_WEIGHT;
            }
        }

        let mut graph = WebGraph::new();
        graph.add_vertex(WebVertex::with_page(url.as_str(), page));
        graph.insert_edge(WebEdge::new(url.as_str(), url.as_str()));
        for edge in edges {
            graph.insert_edge(edge);
        }

        let mut emitted = 0u64;
        for edge in graph.edges() {
            let key = if edge.is_loop() {
                GraphGroupKey::new(reversed_url, edge.weight)
            } else {
                match reverse_url(&edge.target) {
                    Ok(reversed) => GraphGroupKey::new(reversed, edge.weight),
                    Err(e) => {
                        tracing::warn!("Dropping link {} -> {}: {}", url, edge.target, e);
                        counters.shard_write_errors += 1;
                        continue;
                    }
                }
            };

            let shard = graph.subgraph_of(edge);
            match sink.write(key, &shard) {
                Ok(()) if !edge.is_loop() => emitted += 1,
                Ok(()) => {}
                Err(e) => {
                    tracing::error!("Failed to write shard {} -> {}: {}", url, edge.target, e);
                    counters.shard_write_errors += 1;
                }
            }
        }

        counters.rows_mapped += 1;
        counters.new_rows_mapped += emitted;
    }
}
