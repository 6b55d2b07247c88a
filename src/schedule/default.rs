use crate::schedule::{ChangeState, FetchSchedule, FetchTimes, ScheduleSettings};
use crate::state::WebPage;

/// Fixed-interval schedule: every page keeps the interval it has
#[derive(Debug, Clone)]
pub struct DefaultFetchSchedule {
    settings: ScheduleSettings,
}

impl DefaultFetchSchedule {
    pub fn new(settings: ScheduleSettings) -> Self {
        Self { settings }
    }
}

impl FetchSchedule for DefaultFetchSchedule {
    fn name(&self) -> &'static str {
        "default"
    }

    fn settings(&self) -> &ScheduleSettings {
        &self.settings
    }

    fn set_fetch_schedule(
        &self,
        _url: &str,
        page: &mut WebPage,
        times: FetchTimes,
        _state: ChangeState,
    ) {
        page.retries_since_fetch = 0;

        let times = times.with_valid_modified_time();
        let interval = self.settings.clamp(page.fetch_interval);
        self.update_refetch_time(
            page,
            interval,
            times.fetch_time,
            times.prev_modified_time,
            times.modified_time,
        );
    }
}
