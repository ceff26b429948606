use crate::{
    adjust::AdjustmentController,
    commit::CommitForm,
    config::DisplaySettings,
    display::DisplayModel,
    error::UpstreamError,
    live::LiveState,
    types::{Celsius, SessionId},
    weather::WeatherReport,
};

#[derive(Debug, Clone, PartialEq)]
pub enum SyncAction {
    FetchLiveState(u64),
    FetchWeather,
    RefreshClock,
    Commit(CommitForm),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivePoll {
    Active,
    Suspended,
}

#[derive(Debug, Clone)]
pub struct SyncClient {
    settings: DisplaySettings,
    session: SessionId,
    adjuster: AdjustmentController,
    model: DisplayModel,
    live_poll: LivePoll,
    live_generation: u64,
    commit_in_flight: bool,
    next_live_poll_ms: Option<u64>,
    next_weather_ms: Option<u64>,
    next_clock_ms: Option<u64>,
}

impl SyncClient {
    pub fn new(mut settings: DisplaySettings, session: SessionId) -> Self {
        settings.timings.sanitize();
        let adjuster = AdjustmentController::new(settings.adjustment, settings.operation_mode);
        Self {
            settings,
            session,
            adjuster,
            model: DisplayModel::default(),
            live_poll: LivePoll::Active,
            live_generation: 0,
            commit_in_flight: false,
            next_live_poll_ms: None,
            next_weather_ms: None,
            next_clock_ms: None,
        }
    }

    pub fn settings(&self) -> &DisplaySettings {
        &self.settings
    }

    pub fn model(&self) -> &DisplayModel {
        &self.model
    }

    pub fn live_poll(&self) -> LivePoll {
        self.live_poll
    }

    pub fn is_commit_in_flight(&self) -> bool {
        self.commit_in_flight
    }

    pub fn start(&mut self, now_ms: u64) -> Vec<SyncAction> {
        self.next_live_poll_ms = Some(now_ms);
        self.next_clock_ms = Some(now_ms);
        self.next_weather_ms = self.settings.weather.is_some().then_some(now_ms);
        self.tick(now_ms)
    }

    pub fn tick(&mut self, now_ms: u64) -> Vec<SyncAction> {
        let mut actions = Vec::new();
        let timings = self.settings.timings;

        for session in self.adjuster.expired_sessions(now_ms) {
            if let Some(commit) = self.adjuster.on_debounce_expiry(&session, now_ms) {
                self.commit_in_flight = true;
                actions.push(SyncAction::Commit(commit.to_form()));
            }
        }

        if self.live_poll == LivePoll::Active && due(self.next_live_poll_ms, now_ms) {
            self.next_live_poll_ms = Some(now_ms + timings.live_poll_ms);
            actions.push(SyncAction::FetchLiveState(self.live_generation));
        }

        if due(self.next_weather_ms, now_ms) {
            self.next_weather_ms = Some(now_ms + timings.weather_poll_ms);
            actions.push(SyncAction::FetchWeather);
        }

        if due(self.next_clock_ms, now_ms) {
            self.next_clock_ms = Some(now_ms + timings.clock_tick_ms);
            actions.push(SyncAction::RefreshClock);
        }

        actions
    }

    pub fn next_wakeup_ms(&self) -> Option<u64> {
        let live = match self.live_poll {
            LivePoll::Active => self.next_live_poll_ms,
            LivePoll::Suspended => None,
        };

        [
            self.adjuster.next_deadline_ms(),
            live,
            self.next_weather_ms,
            self.next_clock_ms,
        ]
        .into_iter()
        .flatten()
        .min()
    }

    pub fn on_gesture(&mut self, delta_steps: i32, now_ms: u64) -> Celsius {
        self.live_poll = LivePoll::Suspended;
        // Polls dispatched before this press carry an older generation.
        self.live_generation = self.live_generation.wrapping_add(1);
        let shown = self.model.target.value();
        let candidate = self
            .adjuster
            .submit_adjustment(&self.session, delta_steps, shown, now_ms);
        self.model.show_candidate(candidate);
        candidate
    }

    pub fn on_live_state(
        &mut self,
        generation: u64,
        result: Result<LiveState, UpstreamError>,
    ) -> bool {
        if self.live_poll == LivePoll::Suspended || generation != self.live_generation {
            return false;
        }

        match result {
            Ok(live) => self.model.apply_live_state(&live, self.settings.controls),
            Err(_) => false,
        }
    }

    pub fn on_weather(&mut self, result: Result<WeatherReport, UpstreamError>) -> bool {
        let (Ok(report), Some(lookup)) = (result, self.settings.weather.as_ref()) else {
            return false;
        };
        self.model.apply_weather(&report, &lookup.icon_base_url)
    }

    pub fn on_clock(&mut self, hour: u32, minute: u32) -> bool {
        self.model.set_clock(hour, minute)
    }

    pub fn on_commit_complete(&mut self, now_ms: u64) -> bool {
        self.commit_in_flight = false;
        if self.adjuster.is_pending(&self.session) {
            return false;
        }
        self.resume_live_poll(now_ms)
    }

    pub fn end_session(&mut self, now_ms: u64) -> bool {
        self.adjuster.end_session(&self.session);
        if self.commit_in_flight {
            return false;
        }
        self.resume_live_poll(now_ms)
    }

    fn resume_live_poll(&mut self, now_ms: u64) -> bool {
        self.live_poll = LivePoll::Active;
        self.next_live_poll_ms = Some(now_ms + self.settings.timings.live_poll_ms);
        self.model.finish_editing()
    }
}

fn due(deadline_ms: Option<u64>, now_ms: u64) -> bool {
    deadline_ms.is_some_and(|deadline_ms| now_ms >= deadline_ms)
}
