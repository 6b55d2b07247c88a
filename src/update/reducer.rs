//! Neighbourhood reconstruction and page update
//!
//! Every reduce group holds the shards routed to one reversed URL. Merged,
//! they form the inbound neighbourhood of that URL: the in-batch sources that
//! link to it, plus its own record if it was fetched this cycle. The reducer
//! resolves where the focus page comes from, applies the link, depth and
//! score updates, and, for pages fetched this cycle, the fetch schedule and
//! status transitions.

use crate::config::Config;
use crate::graph::{WebEdge, WebGraph};
use crate::schedule::{ChangeState, FetchSchedule, FetchTimes};
use crate::scoring::ScoringFilter;
use crate::state::{CrawlStatus, Mark, WebPage, NEVER_FETCH_INTERVAL_SECS};
use crate::storage::Storage;
use crate::update::shuffle::{decode_shard, Partition, ShardGroup};
use crate::update::{lock_store, UpdateCounters};
use crate::url::{sniff_page_category, unreverse_url};
use crate::{Result, UpdateError};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

/// Where the focus page of a reduce group came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageExistence {
    /// Carried by the group's own self-loop shard: fetched this cycle
    InBatch,
    /// Loaded from the crawl database
    OutOfBatch,
    /// Not known anywhere; created by this update
    NotFetched,
}

/// The reduce stage of an update cycle
pub struct OutGraphReducer {
    schedule: Arc<dyn FetchSchedule>,
    scoring: Arc<dyn ScoringFilter>,
    crawl_id: String,
    additions_allowed: bool,
    retry_max: u32,
    max_fetch_interval: i64,
    max_inlinks: usize,
    /// Cycle clock shared by every group
    now: DateTime<Utc>,
}

impl OutGraphReducer {
    pub fn new(
        config: &Config,
        schedule: Arc<dyn FetchSchedule>,
        scoring: Arc<dyn ScoringFilter>,
        now: DateTime<Utc>,
    ) -> Self {
        let update = &config.update;
        Self {
            schedule,
            scoring,
            crawl_id: update.crawl_id.clone(),
            additions_allowed: update.additions_allowed,
            retry_max: update.retry_max,
            max_fetch_interval: update.max_fetch_interval,
            max_inlinks: update.max_inlinks,
            now,
        }
    }

    /// Logs the effective parameters of the stage
    pub fn log_setup(&self) {
        tracing::info!(
            "OutGraphReducer: crawl_id={}, additions_allowed={}, retry_max={}, max_fetch_interval={}s, max_inlinks={}, schedule={}, scoring={}",
            self.crawl_id,
            self.additions_allowed,
            self.retry_max,
            self.max_fetch_interval,
            self.max_inlinks,
            self.schedule.name(),
            self.scoring.name()
        );
    }

    /// Reduces every group of a partition and persists the results
    ///
    /// Group failures are counted and skipped. Only a poisoned storage lock
    /// fails the partition.
    pub fn reduce_partition<S: Storage>(
        &self,
        partition: Partition,
        store: &Mutex<S>,
    ) -> Result<UpdateCounters> {
        let mut counters = UpdateCounters::new();
        tracing::debug!(
            "Reducing partition {}: {} groups, {} shards",
            partition.index,
            partition.groups.len(),
            partition.shard_count()
        );

        for group in &partition.groups {
            match self.reduce(group, store, &mut counters) {
                Ok(Some(page)) => {
                    let written = lock_store(store)?.put_page(&group.reversed_url, &page);
                    match written {
                        Ok(()) => counters.pages_persist += 1,
                        Err(e) => {
                            tracing::error!("Failed to persist {}: {}", group.reversed_url, e);
                            counters.store_errors += 1;
                            counters.failed_updates += 1;
                        }
                    }
                }
                Ok(None) => {}
                Err(e @ UpdateError::Worker(_)) => return Err(e),
                Err(e) => {
                    tracing::error!("Skipping update of {}: {}", group.reversed_url, e);
                    counters.failed_updates += 1;
                }
            }
        }

        Ok(counters)
    }

    /// Rebuilds one group's neighbourhood and returns the updated focus page
    ///
    /// Returns `None` when the focus page is unknown and additions are disabled.
    pub fn reduce<S: Storage>(
        &self,
        group: &ShardGroup,
        store: &Mutex<S>,
        counters: &mut UpdateCounters,
    ) -> Result<Option<WebPage>> {
        counters.groups += 1;

        let url = unreverse_url(&group.reversed_url)?;
        let mut graph = self.merge_shards(group, counters)?;
        graph.set_focus(&url);

        let (mut page, existence) =
            match self.resolve_focus(&url, &group.reversed_url, &mut graph, store, counters)? {
                Some(resolved) => resolved,
                None => return Ok(None),
            };

        tracing::trace!("Updating {} ({:?})", url, existence);
        self.update_graph(&url, &mut page, &graph, counters);

        if existence == PageExistence::InBatch {
            self.update_fetch_schedule(&url, &mut page, counters);
            self.update_marks(&mut page);
            counters.count_status(page.status);
        }

        Ok(Some(page))
    }

    fn merge_shards(&self, group: &ShardGroup, counters: &mut UpdateCounters) -> Result<WebGraph> {
        let mut graph = WebGraph::new();
        for shard in &group.shards {
            match decode_shard(&shard.key, &shard.bytes) {
                Ok(subgraph) => graph.merge(subgraph),
                Err(e) => {
                    tracing::warn!("Dropping shard: {}", e);
                    counters.shard_read_errors += 1;
                }
            }
        }

        if graph.edge_count() == 0 {
            return Err(UpdateError::EmptyGroup(group.reversed_url.clone()));
        }
        Ok(graph)
    }

    fn resolve_focus<S: Storage>(
        &self,
        url: &str,
        reversed_url: &str,
        graph: &mut WebGraph,
        store: &Mutex<S>,
        counters: &mut UpdateCounters,
    ) -> Result<Option<(WebPage, PageExistence)>> {
        if let Some(page) = graph.take_page(url) {
            return Ok(Some((page, PageExistence::InBatch)));
        }

        let loaded = lock_store(store)?.get_page(reversed_url);
        match loaded {
            Ok(Some(page)) => {
                counters.exist_out_pages += 1;
                Ok(Some((page, PageExistence::OutOfBatch)))
            }
            Ok(None) if self.additions_allowed => {
                let page = self.create_page(url, counters);
                Ok(Some((page, PageExistence::NotFetched)))
            }
            Ok(None) => {
                counters.not_fetched_dropped += 1;
                Ok(None)
            }
            Err(e) => {
                counters.store_errors += 1;
                Err(e.into())
            }
        }
    }

    fn create_page(&self, url: &str, counters: &mut UpdateCounters) -> WebPage {
        let mut page = WebPage::new();
        page.crawl_id = Some(self.crawl_id.clone());
        self.schedule.initialize_schedule(url, &mut page, self.now);
        page.status = CrawlStatus::Unfetched;

        if let Err(e) = self.scoring.initial_score(url, &mut page) {
            tracing::warn!("Initial score failed for {}: {}", url, e);
            page.score = 0.0;
            counters.scoring_errors += 1;
        }

        counters.new_pages += 1;
        if sniff_page_category(url).is_detail() {
            counters.new_detail_pages += 1;
        }
        page
    }

    /// Applies inlinks, depth and score from the inbound edges
    fn update_graph(
        &self,
        url: &str,
        page: &mut WebPage,
        graph: &WebGraph,
        counters: &mut UpdateCounters,
    ) {
        let mut incoming: Vec<&WebEdge> = graph.incoming_edges(url).collect();
        incoming.sort_by(|a, b| a.source.cmp(&b.source));

        let mut depth = page.depth;
        for edge in incoming.iter().filter(|e| !e.is_loop()) {
            if page.inlinks.contains_key(&edge.source) || page.inlinks.len() < self.max_inlinks {
                page.inlinks.insert(edge.source.clone(), edge.anchor.clone());
            } else {
                counters.inlinks_truncated += 1;
            }

            if let Some(source) = graph.page(&edge.source) {
                depth = depth.min(source.child_depth());
            }
        }

        // Depth only ever decreases
        if depth < page.depth {
            page.depth = depth;
            counters.pages_depth_up += 1;
        }

        if let Err(e) = self.scoring.update_score(url, page, graph, &incoming) {
            tracing::warn!("Score update failed for {}: {}", url, e);
            page.score = 0.0;
            counters.scoring_errors += 1;
        }
    }

    fn update_fetch_schedule(&self, url: &str, page: &mut WebPage, counters: &mut UpdateCounters) {
        match page.status {
            CrawlStatus::Fetched
            | CrawlStatus::RedirectTemp
            | CrawlStatus::RedirectPerm
            | CrawlStatus::NotModified => {
                let state = ChangeState::from_signatures(
                    page.prev_signature.as_deref(),
                    page.signature.as_deref(),
                )
                .unwrap_or(if page.status == CrawlStatus::NotModified {
                    ChangeState::NotModified
                } else {
                    ChangeState::Unknown
                });

                let mut times = FetchTimes::of(page);
                if let Some(last_modified) = page.header_last_modified() {
                    if last_modified > times.modified_time {
                        times.prev_modified_time = times.modified_time;
                        times.modified_time = last_modified;
                    }
                }

                self.schedule.set_fetch_schedule(url, page, times, state);

                if page.fetch_interval > self.max_fetch_interval
                    && page.fetch_interval < NEVER_FETCH_INTERVAL_SECS
                {
                    tracing::info!(
                        "Force refetch page {}, fetch interval {}s",
                        url,
                        page.fetch_interval
                    );
                    self.schedule.force_refetch(url, page, true, self.now);
                    counters.forced_refetches += 1;
                }
            }
            CrawlStatus::Retry => {
                let times = FetchTimes::of(page);
                self.schedule.set_page_retry_schedule(url, page, times);
                // Counts the failure just recorded
                page.status = if page.retries_since_fetch < self.retry_max {
                    CrawlStatus::Unfetched
                } else {
                    CrawlStatus::Gone
                };
            }
            CrawlStatus::Gone => {
                let times = FetchTimes::of(page);
                self.schedule.set_page_gone_schedule(url, page, times);
            }
            CrawlStatus::Unfetched => {}
        }
    }

    fn update_marks(&self, page: &mut WebPage) {
        let batch = page
            .mark(Mark::Parse)
            .or_else(|| page.mark(Mark::Fetch))
            .map(str::to_string);
        if let Some(batch) = batch {
            page.put_mark(Mark::UpdateOutgraph, batch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpdateConfig;
    use crate::graph::GraphGroupKey;
    use crate::schedule::{AdaptiveFetchSchedule, DefaultFetchSchedule, ScheduleSettings};
    use crate::scoring::{OpicScoringFilter, ScoringError, ScoringResult};
    use crate::state::UNKNOWN_DEPTH;
    use crate::storage::{CycleRecord, CycleStatus, SqliteStorage, StorageError, StorageResult};
    use crate::update::mapper::OutGraphMapper;
    use crate::update::shuffle::{EncodedShard, Shuffle, ShuffleWriter};
    use chrono::TimeZone;
    use std::collections::HashMap;

    const T0: i64 = 1_700_000_000;
    const DAY: i64 = 24 * 3600;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn now() -> DateTime<Utc> {
        at(T0 + 10 * DAY)
    }

    fn reducer_with(config: Config, schedule: Arc<dyn FetchSchedule>) -> OutGraphReducer {
        OutGraphReducer::new(
            &config,
            schedule,
            Arc::new(OpicScoringFilter::default()),
            now(),
        )
    }

    fn reducer(config: Config) -> OutGraphReducer {
        let settings = ScheduleSettings::from_config(&config);
        reducer_with(config, Arc::new(AdaptiveFetchSchedule::new(settings)))
    }

    fn config() -> Config {
        Config::with_database_path(":memory:")
    }

    fn store() -> Mutex<SqliteStorage> {
        Mutex::new(SqliteStorage::new_in_memory().unwrap())
    }

    /// A page fetched in batch "b1" at T0
    fn fetched(status: CrawlStatus, outlinks: &[&str]) -> WebPage {
        let mut page = WebPage::new();
        page.status = status;
        page.depth = 0;
        page.score = 4.0;
        page.fetch_time = at(T0);
        page.modified_time = at(T0);
        page.fetch_interval = 100;
        page.put_mark(Mark::Fetch, "b1");
        page.put_mark(Mark::Parse, "b1");
        for link in outlinks {
            page.outlinks.insert(link.to_string(), format!("to {}", link));
        }
        page
    }

    /// Maps the pages and reduces every resulting group
    fn run(
        reducer: &OutGraphReducer,
        store: &Mutex<SqliteStorage>,
        pages: Vec<(&str, WebPage)>,
    ) -> (HashMap<String, WebPage>, UpdateCounters) {
        let mapper = OutGraphMapper::new(
            &UpdateConfig::default(),
            Arc::new(OpicScoringFilter::default()),
        );
        let mut counters = UpdateCounters::new();
        let mut writer = ShuffleWriter::new(3);
        for (key, page) in pages {
            mapper.map(key, page, &mut writer, &mut counters);
        }
        let mut shuffle = Shuffle::new(3);
        shuffle.absorb(writer);

        let mut pages = HashMap::new();
        for partition in shuffle.into_partitions() {
            for group in &partition.groups {
                if let Some(page) = reducer.reduce(group, store, &mut counters).unwrap() {
                    pages.insert(group.reversed_url.clone(), page);
                }
            }
        }
        (pages, counters)
    }

    #[test]
    fn test_new_target_is_created_and_linked() {
        let reducer = reducer(config());
        let store = store();

        let (pages, counters) = run(
            &reducer,
            &store,
            vec![("com.a:http/", fetched(CrawlStatus::Fetched, &["http://b.com/"]))],
        );

        let b = &pages["com.b:http/"];
        assert_eq!(b.status, CrawlStatus::Unfetched);
        assert_eq!(b.depth, 1);
        assert_eq!(b.score, 4.0);
        assert_eq!(b.fetch_time, now());
        assert_eq!(b.inlinks.get("http://a.com/").map(String::as_str), Some("to http://b.com/"));
        assert_eq!(b.crawl_id.as_deref(), Some("default"));
        assert_eq!(counters.new_pages, 1);
        assert_eq!(counters.pages_depth_up, 1);

        let a = &pages["com.a:http/"];
        assert_eq!(a.mark(Mark::UpdateOutgraph), Some("b1"));
        assert_eq!(a.cash(), Some(0.0));
        assert!(a.inlinks.is_empty());
        assert_eq!(counters.status_count(CrawlStatus::Fetched), 1);
        assert_eq!(counters.groups, 2);
    }

    #[test]
    fn test_unchanged_page_backs_off() {
        let reducer = reducer(config());
        let mut page = fetched(CrawlStatus::Fetched, &[]);
        page.signature = Some(vec![1, 2, 3]);
        page.prev_signature = Some(vec![1, 2, 3]);

        let (pages, _) = run(&reducer, &store(), vec![("com.c:http/", page)]);

        let c = &pages["com.c:http/"];
        assert_eq!(c.fetch_interval, 120);
        assert_eq!(c.fetch_time, at(T0 + 120));
        assert_eq!(c.prev_fetch_time, at(T0));
        assert_eq!(c.status, CrawlStatus::Fetched);
    }

    #[test]
    fn test_retries_exhausted_page_is_gone() {
        let reducer = reducer(config());
        let mut exhausted = fetched(CrawlStatus::Retry, &[]);
        exhausted.retries_since_fetch = 3;
        let mut last_chance = fetched(CrawlStatus::Retry, &[]);
        last_chance.retries_since_fetch = 2;
        let mut retrying = fetched(CrawlStatus::Retry, &[]);
        retrying.retries_since_fetch = 1;

        let (pages, counters) = run(
            &reducer,
            &store(),
            vec![
                ("com.d:http/", exhausted),
                ("com.e:http/", retrying),
                ("com.l:http/", last_chance),
            ],
        );

        let d = &pages["com.d:http/"];
        assert_eq!(d.status, CrawlStatus::Gone);
        assert_eq!(d.retries_since_fetch, 4);
        assert_eq!(d.fetch_time, at(T0 + DAY));

        let e = &pages["com.e:http/"];
        assert_eq!(e.status, CrawlStatus::Unfetched);
        assert_eq!(e.retries_since_fetch, 2);

        // The failure recorded now reaches the limit
        let l = &pages["com.l:http/"];
        assert_eq!(l.retries_since_fetch, 3);
        assert_eq!(l.status, CrawlStatus::Gone);

        assert_eq!(counters.status_count(CrawlStatus::Gone), 2);
        assert_eq!(counters.status_count(CrawlStatus::Unfetched), 1);
    }

    #[test]
    fn test_gone_page_backs_off() {
        let reducer = reducer(config());
        let (pages, _) = run(&reducer, &store(), vec![("com.g:http/", fetched(CrawlStatus::Gone, &[]))]);

        let g = &pages["com.g:http/"];
        assert_eq!(g.status, CrawlStatus::Gone);
        assert_eq!(g.fetch_interval, 150);
        assert_eq!(g.fetch_time, at(T0 + 150));
    }

    #[test]
    fn test_long_interval_forces_refetch() {
        let reducer = reducer(config());
        let mut page = fetched(CrawlStatus::NotModified, &[]);
        page.fetch_interval = 80 * DAY;
        page.signature = Some(vec![7]);

        let (pages, counters) = run(&reducer, &store(), vec![("com.f:http/", page)]);

        let f = &pages["com.f:http/"];
        assert_eq!(counters.forced_refetches, 1);
        assert_eq!(f.status, CrawlStatus::Unfetched);
        assert_eq!(f.fetch_time, now());
        assert_eq!(f.fetch_interval, 81 * DAY);
        assert_eq!(f.signature, None);
        assert_eq!(counters.status_count(CrawlStatus::Unfetched), 1);
    }

    #[test]
    fn test_newer_last_modified_header_wins() {
        let config = config();
        let settings = ScheduleSettings::from_config(&config);
        let reducer = reducer_with(config, Arc::new(DefaultFetchSchedule::new(settings)));

        let mut page = fetched(CrawlStatus::Fetched, &[]);
        page.modified_time = at(T0 - DAY);
        page.headers.insert(
            "Last-Modified".to_string(),
            "Tue, 14 Nov 2023 22:13:20 GMT".to_string(),
        );

        let (pages, _) = run(&reducer, &store(), vec![("com.h:http/", page)]);

        let h = &pages["com.h:http/"];
        assert_eq!(h.modified_time, at(T0));
        assert_eq!(h.prev_modified_time, at(T0 - DAY));
    }

    #[test]
    fn test_self_link_is_not_an_inlink() {
        let reducer = reducer(config());
        let mut page = fetched(CrawlStatus::Fetched, &["http://a.com/"]);
        page.depth = 2;

        let (pages, counters) = run(&reducer, &store(), vec![("com.a:http/", page)]);

        let a = &pages["com.a:http/"];
        assert!(a.inlinks.is_empty());
        assert_eq!(a.depth, 2);
        assert_eq!(counters.pages_depth_up, 0);
    }

    #[test]
    fn test_depth_never_increases() {
        let reducer = reducer(config());
        let store = store();

        let mut known = WebPage::new();
        known.depth = 1;
        known.score = 1.0;
        store.lock().unwrap().put_page("com.t:http/", &known).unwrap();

        let mut deep = fetched(CrawlStatus::Fetched, &["http://t.com/"]);
        deep.depth = 5;
        let (pages, counters) = run(&reducer, &store, vec![("com.s:http/", deep)]);

        let t = &pages["com.t:http/"];
        assert_eq!(t.depth, 1);
        assert_eq!(t.score, 5.0);
        assert!(t.inlinks.contains_key("http://s.com/"));
        assert_eq!(counters.exist_out_pages, 1);
        assert_eq!(counters.new_pages, 0);
        assert_eq!(counters.pages_depth_up, 0);
    }

    #[test]
    fn test_shallowest_source_sets_depth() {
        let reducer = reducer(config());
        let mut near = fetched(CrawlStatus::Fetched, &["http://t.com/"]);
        near.depth = 2;
        let mut far = fetched(CrawlStatus::Fetched, &["http://t.com/"]);
        far.depth = 7;

        let (pages, _) = run(
            &reducer,
            &store(),
            vec![("com.far:http/", far), ("com.near:http/", near)],
        );

        let t = &pages["com.t:http/"];
        assert_eq!(t.depth, 3);
        assert_eq!(t.inlinks.len(), 2);
        assert_eq!(t.score, 8.0);
    }

    #[test]
    fn test_inlinks_are_capped() {
        let mut config = config();
        config.update.max_inlinks = 1;
        let reducer = reducer(config);

        let (pages, counters) = run(
            &reducer,
            &store(),
            vec![
                ("com.x:http/", fetched(CrawlStatus::Fetched, &["http://t.com/"])),
                ("com.y:http/", fetched(CrawlStatus::Fetched, &["http://t.com/"])),
            ],
        );

        let t = &pages["com.t:http/"];
        assert_eq!(t.inlinks.len(), 1);
        assert!(t.inlinks.contains_key("http://x.com/"));
        assert_eq!(counters.inlinks_truncated, 1);
    }

    #[test]
    fn test_unknown_target_dropped_without_additions() {
        let mut config = config();
        config.update.additions_allowed = false;
        let reducer = reducer(config);

        let (pages, counters) = run(
            &reducer,
            &store(),
            vec![("com.a:http/", fetched(CrawlStatus::Fetched, &["http://b.com/"]))],
        );

        assert!(!pages.contains_key("com.b:http/"));
        assert!(pages.contains_key("com.a:http/"));
        assert_eq!(counters.not_fetched_dropped, 1);
        assert_eq!(counters.new_pages, 0);
    }

    #[test]
    fn test_new_detail_page_is_counted() {
        let reducer = reducer(config());
        let (_, counters) = run(
            &reducer,
            &store(),
            vec![(
                "com.a:http/",
                fetched(CrawlStatus::Fetched, &["http://shop.com/item/12342134134.html"]),
            )],
        );

        assert_eq!(counters.new_pages, 1);
        assert_eq!(counters.new_detail_pages, 1);
    }

    #[test]
    fn test_undecodable_group_is_an_error() {
        let reducer = reducer(config());
        let group = ShardGroup {
            reversed_url: "com.a:http/".to_string(),
            shards: vec![EncodedShard {
                key: GraphGroupKey::new("com.a:http/", 1.0),
                bytes: b"garbage".to_vec(),
            }],
        };

        let mut counters = UpdateCounters::new();
        let result = reducer.reduce(&group, &store(), &mut counters);
        assert!(matches!(result, Err(UpdateError::EmptyGroup(_))));
        assert_eq!(counters.shard_read_errors, 1);
    }

    /// Maps the pages into a single partition
    fn single_partition(pages: Vec<(&str, WebPage)>) -> Partition {
        let mapper = OutGraphMapper::new(
            &UpdateConfig::default(),
            Arc::new(OpicScoringFilter::default()),
        );
        let mut counters = UpdateCounters::new();
        let mut writer = ShuffleWriter::new(1);
        for (key, page) in pages {
            mapper.map(key, page, &mut writer, &mut counters);
        }
        let mut shuffle = Shuffle::new(1);
        shuffle.absorb(writer);
        shuffle.into_partitions().remove(0)
    }

    #[test]
    fn test_partition_persists_and_skips_failures() {
        let reducer = reducer(config());
        let store = store();

        let mut partition = single_partition(vec![(
            "com.a:http/",
            fetched(CrawlStatus::Fetched, &["http://b.com/"]),
        )]);
        partition.groups.push(ShardGroup {
            reversed_url: "com.z:http/".to_string(),
            shards: vec![EncodedShard {
                key: GraphGroupKey::new("com.z:http/", 1.0),
                bytes: b"garbage".to_vec(),
            }],
        });

        let counters = reducer.reduce_partition(partition, &store).unwrap();
        assert_eq!(counters.groups, 3);
        assert_eq!(counters.pages_persist, 2);
        assert_eq!(counters.failed_updates, 1);

        let guard = store.lock().unwrap();
        let b = guard.get_page("com.b:http/").unwrap().unwrap();
        assert_eq!(b.depth, 1);
        let a = guard.get_page("com.a:http/").unwrap().unwrap();
        assert_eq!(a.mark(Mark::UpdateOutgraph), Some("b1"));
    }

    /// Rejects every inbound score update
    struct RejectingScores;

    impl ScoringFilter for RejectingScores {
        fn name(&self) -> &'static str {
            "rejecting"
        }
        fn initial_score(&self, _: &str, page: &mut WebPage) -> ScoringResult<()> {
            page.score = 1.0;
            Ok(())
        }
        fn distribute_to_outlinks(
            &self,
            _: &str,
            _: &mut WebPage,
            _: &mut [WebEdge],
            _: usize,
        ) -> ScoringResult<()> {
            Ok(())
        }
        fn update_score(
            &self,
            url: &str,
            page: &mut WebPage,
            _: &WebGraph,
            _: &[&WebEdge],
        ) -> ScoringResult<()> {
            page.score = f32::NAN;
            Err(ScoringError::InvalidScore {
                url: url.to_string(),
                score: f32::NAN,
            })
        }
        fn generator_sort_value(&self, _: &str, _: &WebPage, s: f32) -> ScoringResult<f32> {
            Ok(s)
        }
        fn indexer_score(&self, _: &str, _: &WebPage, s: f32) -> ScoringResult<f32> {
            Ok(s)
        }
    }

    #[test]
    fn test_failed_score_update_resets_score() {
        let config = config();
        let settings = ScheduleSettings::from_config(&config);
        let reducer = OutGraphReducer::new(
            &config,
            Arc::new(AdaptiveFetchSchedule::new(settings)),
            Arc::new(RejectingScores),
            now(),
        );
        let store = store();

        let partition = single_partition(vec![(
            "com.a:http/",
            fetched(CrawlStatus::Fetched, &["http://b.com/"]),
        )]);
        let counters = reducer.reduce_partition(partition, &store).unwrap();

        assert_eq!(counters.scoring_errors, 2);
        assert_eq!(counters.pages_persist, 2);
        assert_eq!(counters.failed_updates, 0);

        let guard = store.lock().unwrap();
        for key in ["com.a:http/", "com.b:http/"] {
            let page = guard.get_page(key).unwrap().unwrap();
            assert_eq!(page.score, 0.0);
        }
        let b = guard.get_page("com.b:http/").unwrap().unwrap();
        assert!(b.inlinks.contains_key("http://a.com/"));
    }

    /// Keeps written pages in memory and fails every read
    #[derive(Default)]
    struct UnreadableStore {
        pages: HashMap<String, WebPage>,
    }

    impl Storage for UnreadableStore {
        fn create_cycle(&mut self, _: &str, _: DateTime<Utc>) -> StorageResult<i64> {
            Ok(1)
        }
        fn get_cycle(&self, cycle_id: i64) -> StorageResult<CycleRecord> {
            Err(StorageError::CycleNotFound(cycle_id))
        }
        fn get_latest_cycle(&self) -> StorageResult<Option<CycleRecord>> {
            Ok(None)
        }
        fn complete_cycle(&mut self, _: i64, _: CycleStatus, _: &UpdateCounters) -> StorageResult<()> {
            Ok(())
        }
        fn get_page(&self, _: &str) -> StorageResult<Option<WebPage>> {
            Err(StorageError::Database("disk I/O error".to_string()))
        }
        fn put_page(&mut self, reversed_url: &str, page: &WebPage) -> StorageResult<()> {
            self.pages.insert(reversed_url.to_string(), page.clone());
            Ok(())
        }
        fn scan_pages(&self) -> StorageResult<Vec<(String, StorageResult<WebPage>)>> {
            Ok(Vec::new())
        }
        fn count_pages_by_status(&self, _: CrawlStatus) -> StorageResult<u64> {
            Ok(0)
        }
        fn count_total_pages(&self) -> StorageResult<u64> {
            Ok(self.pages.len() as u64)
        }
        fn get_depth_breakdown(&self) -> StorageResult<HashMap<u32, usize>> {
            Ok(HashMap::new())
        }
    }

    #[test]
    fn test_failed_page_read_skips_only_that_group() {
        let reducer = reducer(config());
        let store = Mutex::new(UnreadableStore::default());

        let partition = single_partition(vec![(
            "com.a:http/",
            fetched(CrawlStatus::Fetched, &["http://b.com/"]),
        )]);
        let counters = reducer.reduce_partition(partition, &store).unwrap();

        assert_eq!(counters.groups, 2);
        assert_eq!(counters.store_errors, 1);
        assert_eq!(counters.failed_updates, 1);
        assert_eq!(counters.new_pages, 0);
        assert_eq!(counters.pages_persist, 1);

        let guard = store.lock().unwrap();
        assert!(guard.pages.contains_key("com.a:http/"));
        assert!(!guard.pages.contains_key("com.b:http/"));
    }

    #[test]
    fn test_reduce_is_repeatable() {
        let reducer = reducer(config());
        let pages = || {
            vec![
                ("com.a:http/", fetched(CrawlStatus::Fetched, &["http://b.com/", "http://c.com/"])),
                ("com.c:http/", fetched(CrawlStatus::NotModified, &["http://b.com/"])),
            ]
        };

        let (first, _) = run(&reducer, &store(), pages());
        let (second, _) = run(&reducer, &store(), pages());
        assert_eq!(first, second);
        assert_eq!(first["com.b:http/"].fetch_time, now());
    }

    #[test]
    fn test_new_page_depth_starts_unknown() {
        let reducer = reducer(config());
        let mut counters = UpdateCounters::new();
        let page = reducer.create_page("http://n.com/", &mut counters);
        assert_eq!(page.depth, UNKNOWN_DEPTH);
        assert_eq!(page.status, CrawlStatus::Unfetched);
        assert_eq!(page.score, 0.0);
        assert_eq!(page.fetch_interval, 30 * DAY);
    }
}
