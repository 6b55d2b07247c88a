use crate::graph::{WebEdge, WebGraph};
use crate::scoring::{ScoringFilter, ScoringResult};
use crate::state::WebPage;

/// Scoring for crawls whose scores come from an offline link analysis
///
/// Nothing flows along links during an update; the stored score is only
/// normalized at index time.
#[derive(Debug, Clone)]
pub struct LinkAnalysisScoringFilter {
    normalize_score: f32,
}

impl LinkAnalysisScoringFilter {
    pub fn new(normalize_score: f32) -> Self {
        Self { normalize_score }
    }
}

impl ScoringFilter for LinkAnalysisScoringFilter {
    fn name(&self) -> &'static str {
        "link"
    }

    fn initial_score(&self, _url: &str, page: &mut WebPage) -> ScoringResult<()> {
        page.score = 0.0;
        Ok(())
    }

    fn distribute_to_outlinks(
        &self,
        _url: &str,
        _page: &mut WebPage,
        _edges: &mut [WebEdge],
        _out_degree: usize,
    ) -> ScoringResult<()> {
        Ok(())
    }

    fn update_score(
        &self,
        _url: &str,
        _page: &mut WebPage,
        _graph: &WebGraph,
        _incoming: &[&WebEdge],
    ) -> ScoringResult<()> {
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

    fn indexer_score(&self, _url: &str, page: &WebPage, _init_score: f32) -> ScoringResult<f32> {
        Ok(self.normalize_score * page.score)
    }
}
