use crate::schedule::{ChangeState, FetchSchedule, FetchTimes, ScheduleSettings};
use crate::state::WebPage;
use chrono::{DateTime, Utc};

/// Schedule that follows how often a page actually changes
///
/// A modified page is fetched sooner (`1 - dec_rate`), an unmodified one later
/// (`1 + inc_rate`). With sync-delta enabled the next fetch is pulled toward
/// the observed modification time, and an interval shorter than the
/// fetch/modify gap is widened to the gap.
#[derive(Debug, Clone)]
pub struct AdaptiveFetchSchedule {
    settings: ScheduleSettings,
}

impl AdaptiveFetchSchedule {
    pub fn new(settings: ScheduleSettings) -> Self {
        Self { settings }
    }

    /// Computes the clamped interval and the fetch time it counts from
    ///
    /// `times` must already carry a valid modification time.
    pub fn adapt(
        &self,
        interval: i64,
        times: &FetchTimes,
        state: ChangeState,
    ) -> (i64, DateTime<Utc>) {
        let settings = &self.settings;

        let mut interval = match state {
            ChangeState::Modified => (interval as f64 * (1.0 - settings.dec_rate)).round() as i64,
            ChangeState::NotModified => {
                (interval as f64 * (1.0 + settings.inc_rate)).round() as i64
            }
            ChangeState::Unknown => interval,
        };

        let mut fetch_time = times.fetch_time;
        if settings.sync_delta {
            let gap = (times.fetch_time - times.modified_time).num_seconds();
            if gap > interval {
                interval = gap;
            }
            let shift = (gap as f64 * settings.sync_delta_rate).round() as i64;
            fetch_time = super::add_secs(fetch_time, -shift);
        }

        (settings.clamp(interval), fetch_time)
    }
}

impl FetchSchedule for AdaptiveFetchSchedule {
    fn name(&self) -> &'static str {
        "adaptive"
    }

    fn settings(&self) -> &ScheduleSettings {
        &self.settings
    }

    fn set_fetch_schedule(
        &self,
        _url: &str,
        page: &mut WebPage,
        times: FetchTimes,
        state: ChangeState,
    ) {
        page.retries_since_fetch = 0;

        let times = times.with_valid_modified_time();
        let (interval, fetch_time) = self.adapt(page.fetch_interval, &times, state);
        self.update_refetch_time(
            page,
            interval,
            fetch_time,
            times.prev_modified_time,
            times.modified_time,
        );
    }
}
