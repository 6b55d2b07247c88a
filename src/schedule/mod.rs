//! Fetch schedule policies
//!
//! A fetch schedule decides when a page is fetched next. Every policy shares
//! the bookkeeping in the default methods of [`FetchSchedule`] and only
//! differs in how `set_fetch_schedule` turns the fetch history of a page into
//! a new interval.
//!
//! # Policies
//!
//! - `default`: keeps the current interval
//! - `adaptive`: shrinks the interval when a page changed, grows it when it did not
//! - `news`: seed pages follow their newest referenced publish time, detail
//!   pages are never fetched again, everything else is adaptive

mod adaptive;
mod default;
mod news;

pub use adaptive::AdaptiveFetchSchedule;
pub use default::DefaultFetchSchedule;
pub use news::NewsFetchSchedule;

use crate::config::Config;
use crate::state::{earliest_valid_time, CrawlStatus, WebPage};
use crate::{ConfigError, ConfigResult};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

const SECS_PER_DAY: i64 = 24 * 3600;

/// Whether a page's content changed between its last two fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeState {
    Unknown,
    Modified,
    NotModified,
}

impl ChangeState {
    /// Compares two content signatures; either one missing gives `None`
    pub fn from_signatures(prev: Option<&[u8]>, current: Option<&[u8]>) -> Option<Self> {
        match (prev, current) {
            (Some(prev), Some(current)) if prev == current => Some(Self::NotModified),
            (Some(_), Some(_)) => Some(Self::Modified),
            _ => None,
        }
    }
}

/// Fetch and modification history handed to a schedule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchTimes {
    pub prev_fetch_time: DateTime<Utc>,
    pub prev_modified_time: DateTime<Utc>,
    pub fetch_time: DateTime<Utc>,
    pub modified_time: DateTime<Utc>,
}

impl FetchTimes {
    /// The history currently recorded on a page
    pub fn of(page: &WebPage) -> Self {
        Self {
            prev_fetch_time: page.prev_fetch_time,
            prev_modified_time: page.prev_modified_time,
            fetch_time: page.fetch_time,
            modified_time: page.modified_time,
        }
    }

    /// Replaces a modification time older than the earliest valid time with the fetch time
    pub fn with_valid_modified_time(mut self) -> Self {
        if self.modified_time < earliest_valid_time() {
            self.modified_time = self.fetch_time;
        }
        self
    }
}

/// Interval bounds and rates shared by all policies, in seconds
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleSettings {
    pub default_interval: i64,
    pub min_interval: i64,
    pub max_interval: i64,
    pub seed_max_interval: i64,
    /// Ceiling used by the gone schedule and by forced refetches
    pub max_fetch_interval: i64,
    pub inc_rate: f64,
    pub dec_rate: f64,
    pub sync_delta: bool,
    pub sync_delta_rate: f64,
}

impl ScheduleSettings {
    pub fn from_config(config: &Config) -> Self {
        let schedule = &config.schedule;
        Self {
            default_interval: schedule.default_interval,
            min_interval: schedule.min_interval,
            max_interval: schedule.max_interval,
            seed_max_interval: schedule.seed_max_interval,
            max_fetch_interval: config.update.max_fetch_interval,
            inc_rate: schedule.inc_rate,
            dec_rate: schedule.dec_rate,
            sync_delta: schedule.sync_delta,
            sync_delta_rate: schedule.sync_delta_rate,
        }
    }

    /// Clamps an interval into `[min_interval, max_interval]`
    pub fn clamp(&self, interval: i64) -> i64 {
        interval.clamp(self.min_interval, self.max_interval)
    }
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self::from_config(&Config::with_database_path(""))
    }
}

/// Adds seconds to a time; on overflow the time is returned unchanged
pub(crate) fn add_secs(time: DateTime<Utc>, secs: i64) -> DateTime<Utc> {
    Duration::try_seconds(secs)
        .and_then(|d| time.checked_add_signed(d))
        .unwrap_or(time)
}

/// A policy computing when a page is fetched next
pub trait FetchSchedule: Send + Sync {
    /// Policy name as used in configuration
    fn name(&self) -> &'static str;

    fn settings(&self) -> &ScheduleSettings;

    /// Recomputes the fetch interval and next fetch time of a fetched page
    ///
    /// Implementations must reset the retry counter and finish through
    /// [`FetchSchedule::update_refetch_time`].
    fn set_fetch_schedule(
        &self,
        url: &str,
        page: &mut WebPage,
        times: FetchTimes,
        state: ChangeState,
    );

    /// Schedules a newly discovered page for an immediate fetch
    fn initialize_schedule(&self, _url: &str, page: &mut WebPage, now: DateTime<Utc>) {
        page.fetch_time = now;
        page.fetch_interval = self.settings().default_interval;
        page.retries_since_fetch = 0;
    }

    /// Stores a computed interval and moves the fetch times forward
    fn update_refetch_time(
        &self,
        page: &mut WebPage,
        interval: i64,
        fetch_time: DateTime<Utc>,
        prev_modified_time: DateTime<Utc>,
        modified_time: DateTime<Utc>,
    ) {
        page.prev_fetch_time = page.fetch_time;
        page.fetch_time = add_secs(fetch_time, interval);
        page.fetch_interval = interval;
        page.prev_modified_time = prev_modified_time;
        page.modified_time = modified_time;
    }

    /// Backs off a page that no longer exists
    fn set_page_gone_schedule(&self, _url: &str, page: &mut WebPage, times: FetchTimes) {
        let max = self.settings().max_fetch_interval as f64;
        let grown = page.fetch_interval as f64 * 1.5;
        page.fetch_interval = if grown < max {
            grown.round() as i64
        } else {
            (max * 0.9).round() as i64
        };
        page.fetch_time = add_secs(times.fetch_time, page.fetch_interval);
    }

    /// Tries a failed fetch again one day later
    fn set_page_retry_schedule(&self, _url: &str, page: &mut WebPage, times: FetchTimes) {
        page.fetch_time = add_secs(times.fetch_time, SECS_PER_DAY);
        page.retries_since_fetch = page.retries_since_fetch.saturating_add(1);
    }

    /// Resets a page so that it is fetched again as if it were new
    ///
    /// With `asap` the next fetch is `now`; otherwise the stored fetch time stands.
    fn force_refetch(&self, _url: &str, page: &mut WebPage, asap: bool, now: DateTime<Utc>) {
        let max = self.settings().max_fetch_interval;
        if page.fetch_interval > max {
            page.fetch_interval = (max as f64 * 0.9).round() as i64;
        }
        page.status = CrawlStatus::Unfetched;
        page.retries_since_fetch = 0;
        page.signature = None;
        page.modified_time = DateTime::default();
        page.prev_modified_time = DateTime::default();
        if asap {
            page.fetch_time = now;
        }
    }
}

/// Builds the fetch schedule named in the configuration
pub fn build_fetch_schedule(config: &Config) -> ConfigResult<Arc<dyn FetchSchedule>> {
    let settings = ScheduleSettings::from_config(config);
    let schedule: Arc<dyn FetchSchedule> = match config.schedule.class.as_str() {
        "default" => Arc::new(DefaultFetchSchedule::new(settings)),
        "adaptive" => Arc::new(AdaptiveFetchSchedule::new(settings)),
        "news" => Arc::new(NewsFetchSchedule::new(settings)),
        other => {
            return Err(ConfigError::UnknownClass {
                kind: "fetch schedule",
                name: other.to_string(),
            })
        }
    };
    Ok(schedule)
}
