use crate::schedule::{AdaptiveFetchSchedule, ChangeState, FetchSchedule, FetchTimes, ScheduleSettings};
use crate::state::{earliest_valid_time, WebPage, NEVER_FETCH_INTERVAL_SECS};
use chrono::{DateTime, Utc};
use tracing::warn;

const SECS_PER_HOUR: i64 = 3600;

/// Schedule for news-like sites
///
/// Seed pages are revisited according to how recently the items they link to
/// were published. Pages that very likely show a single item are fetched
/// once and never again. All other pages are scheduled adaptively.
#[derive(Debug, Clone)]
pub struct NewsFetchSchedule {
    adaptive: AdaptiveFetchSchedule,
}

impl NewsFetchSchedule {
    pub fn new(settings: ScheduleSettings) -> Self {
        Self {
            adaptive: AdaptiveFetchSchedule::new(settings),
        }
    }

    fn seed_interval(&self, url: &str, page: &WebPage, fetch_time: DateTime<Utc>) -> i64 {
        let settings = self.adaptive.settings();

        // Publish times of referenced items are not known before the second fetch
        if page.fetch_count <= 1 {
            return 1;
        }

        let ref_publish_time = page.ref_publish_time.unwrap_or_default();
        if ref_publish_time < earliest_valid_time() {
            warn!(
                "Unexpected referred publish time {} for {}",
                ref_publish_time, url
            );
        }

        let hours = (fetch_time - ref_publish_time).num_hours();
        let interval = if hours <= 24 {
            1
        } else if hours <= 72 {
            SECS_PER_HOUR
        } else {
            let grown = page.fetch_interval
                + (page.fetch_interval as f64 * settings.inc_rate) as i64;
            grown.max(SECS_PER_HOUR)
        };

        // Seeds with fresh items come back every round, below the min interval
        interval
            .min(settings.seed_max_interval)
            .min(settings.max_interval)
            .max(1)
    }
}

impl FetchSchedule for NewsFetchSchedule {
    fn name(&self) -> &'static str {
        "news"
    }

    fn settings(&self) -> &ScheduleSettings {
        self.adaptive.settings()
    }

    fn set_fetch_schedule(
        &self,
        url: &str,
        page: &mut WebPage,
        times: FetchTimes,
        state: ChangeState,
    ) {
        if !page.is_seed() && !page.very_like_detail_page(url) {
            self.adaptive.set_fetch_schedule(url, page, times, state);
            return;
        }

        page.retries_since_fetch = 0;
        let times = times.with_valid_modified_time();

        let interval = if page.is_seed() {
            self.seed_interval(url, page, times.fetch_time)
        } else {
            page.set_no_fetch();
            NEVER_FETCH_INTERVAL_SECS
        };

        self.update_refetch_time(
            page,
            interval,
            times.fetch_time,
            times.prev_modified_time,
            times.modified_time,
        );
    }
}
