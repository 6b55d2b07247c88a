use crate::graph::{WebEdge, WebGraph};
use crate::scoring::{ScoringError, ScoringFilter, ScoringResult};
use crate::state::WebPage;
use crate::url::same_host;

/// On-line page importance computation
///
/// Every page holds some cash. A fetched page splits its cash evenly across
/// its outlinks and keeps none; a page receiving weight adds it both to its
/// score and to its cash. A page without recorded cash spends its score.
#[derive(Debug, Clone)]
pub struct OpicScoringFilter {
    internal_link_factor: f32,
    external_link_factor: f32,
}

impl OpicScoringFilter {
    pub fn new(internal_link_factor: f32, external_link_factor: f32) -> Self {
        Self {
            internal_link_factor,
            external_link_factor,
        }
    }
}

impl Default for OpicScoringFilter {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

impl ScoringFilter for OpicScoringFilter {
    fn name(&self) -> &'static str {
        "opic"
    }

    fn initial_score(&self, _url: &str, page: &mut WebPage) -> ScoringResult<()> {
        page.score = 0.0;
        page.set_cash(0.0);
        Ok(())
    }

    fn distribute_to_outlinks(
        &self,
        url: &str,
        page: &mut WebPage,
        edges: &mut [WebEdge],
        out_degree: usize,
    ) -> ScoringResult<()> {
        if out_degree == 0 {
            return Ok(());
        }

        let cash = page.cash().unwrap_or(page.score);
        if !cash.is_finite() {
            return Err(ScoringError::InvalidScore {
                url: url.to_string(),
                score: cash,
            });
        }

        let unit = cash / out_degree as f32;
        for edge in edges.iter_mut().filter(|e| !e.is_loop()) {
            let factor = if same_host(url, &edge.target) {
                self.internal_link_factor
            } else {
                self.external_link_factor
            };
            edge.weight = unit * factor;
        }

        page.set_cash(0.0);
        Ok(())
    }

    fn update_score(
        &self,
        url: &str,
        page: &mut WebPage,
        _graph: &WebGraph,
        incoming: &[&WebEdge],
    ) -> ScoringResult<()> {
        let mut adjust = 0.0f32;
        for edge in incoming.iter().filter(|e| !e.is_loop()) {
            if !edge.weight.is_finite() {
                return Err(ScoringError::InvalidWeight {
                    source_url: edge.source.clone(),
                    target_url: edge.target.clone(),
                    weight: edge.weight,
                });
            }
            adjust += edge.weight;
        }

        let score = page.score + adjust;
        if !score.is_finite() {
            return Err(ScoringError::InvalidScore {
                url: url.to_string(),
                score,
            });
        }

        page.score = score;
        page.set_cash(page.cash().unwrap_or(0.0) + adjust);
        Ok(())
    }

    fn generator_sort_value(
        &self,
        _url: &str,
        page: &WebPage,
        init_sort: f32,
    ) -> ScoringResult<f32> {
        Ok(page.score * init_sort)
    }

    fn indexer_score(&self, _url: &str, page: &WebPage, init_score: f32) -> ScoringResult<f32> {
        Ok(page.score.max(0.0).sqrt() * init_score)
    }
}
