//! Access window resolver.
//!
//! Fetches the schedule description, substitutes solar anchors, caches the
//! resolved window and answers "is now inside the window". All remote work is
//! a [`RemoteCall`] polled from [`WindowResolver::handle`], so a slow endpoint
//! never holds up a tick.
//!
//! Fetch timing:
//! - The first attempt happens on the first tick that is not inside a fade.
//!   A twilight lookup that follows the schedule is held back the same way.
//! - While nothing is loaded, retry every `retry_interval`.
//! - Once loaded, refetch once per local calendar day, at or after
//!   `refresh_hour`, and only with a synchronised clock.
//!
//! A failed fetch never touches the cached window.

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use std::time::Duration;

use super::description::ScheduleDescription;
use super::solar::{SolarSource, SolarTimes};
use super::window::{EqualBoundsPolicy, ResolvedWindow, WindowState};
use crate::error::{FetchStage, LampError, TransportError};
use crate::time_source::{LocalZone, is_synchronized};
use crate::transport::{RemoteCall, Request, Transport};

/// Where the schedule description comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleSource {
    Remote(String),
    Static(ScheduleDescription),
    /// No schedule configured; the window stays blocked and only arming
    /// enables the light.
    Unconfigured,
}

#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub retry_interval: Duration,
    pub eval_interval: Duration,
    pub refresh_hour: u32,
    pub http_timeout: Duration,
    pub equal_bounds: EqualBoundsPolicy,
}

/// Per-tick inputs.
pub struct FetchContext<'a> {
    pub now: DateTime<Utc>,
    pub uptime: Duration,
    pub fade_active: bool,
    pub network_up: bool,
    pub transport: &'a mut dyn Transport,
}

/// Outcome of a finished fetch, turned into a lifecycle event by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolverEvent {
    Loaded { summary: String },
    Failed { stage: FetchStage },
}

impl ResolverEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            ResolverEvent::Loaded { .. } => "schedule_loaded",
            ResolverEvent::Failed { .. } => "schedule_error",
        }
    }

    pub fn message(&self) -> String {
        match self {
            ResolverEvent::Loaded { summary } => summary.clone(),
            ResolverEvent::Failed { stage } => stage.as_str().to_string(),
        }
    }
}

enum FetchJob {
    Idle,
    Schedule(RemoteCall),
    /// Schedule parsed; the twilight lookup waits for the fade to finish.
    TwilightDeferred(ScheduleDescription),
    Twilight {
        description: ScheduleDescription,
        call: RemoteCall,
    },
}

pub struct WindowResolver {
    schedule_source: ScheduleSource,
    solar_source: SolarSource,
    zone: LocalZone,
    settings: ResolverSettings,
    resolved: Option<ResolvedWindow>,
    last_fetch_day: Option<NaiveDate>,
    last_attempt: Option<Duration>,
    last_eval: Option<Duration>,
    state: WindowState,
    job: FetchJob,
}

impl WindowResolver {
    pub fn new(
        schedule_source: ScheduleSource,
        solar_source: SolarSource,
        zone: LocalZone,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            schedule_source,
            solar_source,
            zone,
            settings,
            resolved: None,
            last_fetch_day: None,
            last_attempt: None,
            last_eval: None,
            state: WindowState::Unknown,
            job: FetchJob::Idle,
        }
    }

    /// Advance fetches and re-evaluate the window. Called once per tick.
    pub fn handle(&mut self, ctx: &mut FetchContext<'_>) -> Option<ResolverEvent> {
        let synced = is_synchronized(ctx.now);
        if !synced {
            self.state = WindowState::Unknown;
            self.last_eval = None;
        }

        let mut event = self.advance_job(ctx);

        if event.is_none() && matches!(self.job, FetchJob::Idle) && self.fetch_due(ctx) {
            event = self.start_fetch(ctx);
        }

        if synced {
            self.evaluate(ctx.now, ctx.uptime);
        }

        event
    }

    fn fetch_due(&self, ctx: &FetchContext<'_>) -> bool {
        if self.schedule_source == ScheduleSource::Unconfigured || ctx.fade_active {
            return false;
        }

        let retry_elapsed = self
            .last_attempt
            .is_none_or(|last| ctx.uptime.saturating_sub(last) >= self.settings.retry_interval);

        if self.resolved.is_none() {
            return retry_elapsed;
        }

        if !is_synchronized(ctx.now) {
            return false;
        }

        let local = self.zone.localize(ctx.now);
        retry_elapsed
            && self.last_fetch_day != Some(local.date())
            && local.hour() >= self.settings.refresh_hour
    }

    fn start_fetch(&mut self, ctx: &mut FetchContext<'_>) -> Option<ResolverEvent> {
        self.last_attempt = Some(ctx.uptime);

        match &self.schedule_source {
            ScheduleSource::Static(description) => {
                let description = description.clone();
                self.continue_with(description, ctx)
            }
            ScheduleSource::Remote(url) => {
                if !ctx.network_up {
                    return self.fail(LampError::fetch(
                        FetchStage::ScheduleHttp,
                        TransportError::Offline.to_string(),
                    ));
                }
                let request = Request::get(url.clone(), self.settings.http_timeout);
                self.job = FetchJob::Schedule(RemoteCall::start(ctx.transport, request, ctx.uptime));
                None
            }
            ScheduleSource::Unconfigured => None,
        }
    }

    /// Second stage: resolve directly, or look up solar times first.
    fn continue_with(
        &mut self,
        description: ScheduleDescription,
        ctx: &mut FetchContext<'_>,
    ) -> Option<ResolverEvent> {
        if !description.needs_solar() {
            return self.finish(description.resolve(None), ctx.now);
        }

        match &self.solar_source {
            SolarSource::Remote(_) if ctx.fade_active => {
                self.job = FetchJob::TwilightDeferred(description);
                None
            }
            SolarSource::Remote(url) => {
                if !ctx.network_up {
                    return self.fail(LampError::fetch(
                        FetchStage::TwilightHttp,
                        TransportError::Offline.to_string(),
                    ));
                }
                let request = Request::get(url.clone(), self.settings.http_timeout);
                let call = RemoteCall::start(ctx.transport, request, ctx.uptime);
                self.job = FetchJob::Twilight { description, call };
                None
            }
            SolarSource::Local {
                latitude,
                longitude,
            } => {
                let date = self.zone.localize(ctx.now).date();
                match SolarTimes::compute(*latitude, *longitude, date, &self.zone) {
                    Some(times) => self.finish(description.resolve(Some(&times)), ctx.now),
                    None => self.fail(LampError::fetch(
                        FetchStage::TwilightUnavailable,
                        "solar times could not be computed",
                    )),
                }
            }
            SolarSource::Unavailable => self.fail(LampError::fetch(
                FetchStage::TwilightUnavailable,
                "no twilight_url or coordinates configured",
            )),
        }
    }

    fn advance_job(&mut self, ctx: &mut FetchContext<'_>) -> Option<ResolverEvent> {
        match std::mem::replace(&mut self.job, FetchJob::Idle) {
            FetchJob::Idle => None,
            FetchJob::Schedule(mut call) => {
                call.poll(ctx.uptime);
                match call.take_result() {
                    None => {
                        self.job = FetchJob::Schedule(call);
                        None
                    }
                    Some(Ok(response)) => match ScheduleDescription::from_response(&response.body) {
                        Ok(description) => self.continue_with(description, ctx),
                        Err(e) => self.fail(e),
                    },
                    Some(Err(e)) => self.fail(LampError::fetch(FetchStage::ScheduleHttp, e.to_string())),
                }
            }
            FetchJob::TwilightDeferred(description) => {
                if ctx.fade_active {
                    self.job = FetchJob::TwilightDeferred(description);
                    None
                } else {
                    self.continue_with(description, ctx)
                }
            }
            FetchJob::Twilight {
                description,
                mut call,
            } => {
                call.poll(ctx.uptime);
                match call.take_result() {
                    None => {
                        self.job = FetchJob::Twilight { description, call };
                        None
                    }
                    Some(Ok(response)) => match SolarTimes::from_response(&response.body) {
                        Ok(times) => self.finish(description.resolve(Some(&times)), ctx.now),
                        Err(e) => self.fail(e),
                    },
                    Some(Err(e)) => self.fail(LampError::fetch(FetchStage::TwilightHttp, e.to_string())),
                }
            }
        }
    }

    fn finish(
        &mut self,
        result: Result<ResolvedWindow, LampError>,
        now: DateTime<Utc>,
    ) -> Option<ResolverEvent> {
        let window = match result {
            Ok(window) => window,
            Err(e) => return self.fail(e),
        };

        let summary = window.summary();
        self.resolved = Some(window);
        if is_synchronized(now) {
            self.last_fetch_day = Some(self.zone.localize(now).date());
        }
        self.last_eval = None;

        log_info!("Schedule loaded: {}", summary);
        Some(ResolverEvent::Loaded { summary })
    }

    fn fail(&mut self, error: LampError) -> Option<ResolverEvent> {
        let stage = error.fetch_stage().unwrap_or(FetchStage::ScheduleHttp);
        if self.resolved.is_some() {
            log_warning!("{}; keeping cached window", error);
        } else {
            log_warning!("{}", error);
        }
        Some(ResolverEvent::Failed { stage })
    }

    fn evaluate(&mut self, now: DateTime<Utc>, uptime: Duration) {
        if let Some(last) = self.last_eval
            && uptime.saturating_sub(last) < self.settings.eval_interval
        {
            return;
        }
        self.last_eval = Some(uptime);

        let next = match &self.resolved {
            None => WindowState::Blocked,
            Some(window) => window.state_at(self.zone.localize(now).time(), self.settings.equal_bounds),
        };

        if next != self.state {
            log_decorated!("Access window {}", next.as_str());
            self.state = next;
        }
    }

    /// The cached evaluation.
    pub fn state(&self) -> WindowState {
        self.state
    }

    /// Evaluate the loaded window at `now` directly, bypassing the cache.
    pub fn is_within_window(&self, now: DateTime<Utc>) -> bool {
        is_synchronized(now)
            && self.resolved.as_ref().is_some_and(|window| {
                window.state_at(self.zone.localize(now).time(), self.settings.equal_bounds)
                    == WindowState::Allowed
            })
    }

    pub fn window(&self) -> Option<&ResolvedWindow> {
        self.resolved.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.resolved.is_some()
    }

    pub fn is_fetching(&self) -> bool {
        !matches!(self.job, FetchJob::Idle)
    }

    pub fn zone(&self) -> &LocalZone {
        &self.zone
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use crate::transport::Response;
    use chrono::{Duration as ChronoDuration, TimeZone};

    const SCHEDULE_URL: &str = "http://lamp.local/api/schedule";
    const TWILIGHT_URL: &str = "http://lamp.local/api/twilight";
    const OVERNIGHT: &str = r#"{"schedule":{"start_time":"22:00","end_time":"06:00",
        "start_type":"fixed","end_type":"fixed","enabled":true}}"#;

    fn settings() -> ResolverSettings {
        ResolverSettings {
            retry_interval: Duration::from_secs(30),
            eval_interval: Duration::from_secs(30),
            refresh_hour: 3,
            http_timeout: Duration::from_secs(10),
            equal_bounds: EqualBoundsPolicy::AlwaysOn,
        }
    }

    fn create_test_resolver(solar: SolarSource) -> WindowResolver {
        WindowResolver::new(
            ScheduleSource::Remote(SCHEDULE_URL.to_string()),
            solar,
            LocalZone::Named(chrono_tz::UTC),
            settings(),
        )
    }

    /// Drives a resolver with an explicit wall clock and uptime.
    struct Harness {
        transport: ScriptedTransport,
        now: DateTime<Utc>,
        uptime: Duration,
        fade_active: bool,
        network_up: bool,
    }

    impl Harness {
        fn at(now: DateTime<Utc>) -> Self {
            Self {
                transport: ScriptedTransport::new(),
                now,
                uptime: Duration::ZERO,
                fade_active: false,
                network_up: true,
            }
        }

        fn tick(&mut self, resolver: &mut WindowResolver) -> Option<ResolverEvent> {
            let mut ctx = FetchContext {
                now: self.now,
                uptime: self.uptime,
                fade_active: self.fade_active,
                network_up: self.network_up,
                transport: &mut self.transport,
            };
            resolver.handle(&mut ctx)
        }

        fn advance(&mut self, secs: u64) {
            self.uptime += Duration::from_secs(secs);
            self.now += ChronoDuration::seconds(secs as i64);
        }

        /// Tick until an event arrives, advancing 50ms per tick.
        fn tick_until_event(&mut self, resolver: &mut WindowResolver) -> ResolverEvent {
            for _ in 0..100 {
                if let Some(event) = self.tick(resolver) {
                    return event;
                }
                self.uptime += Duration::from_millis(50);
            }
            panic!("resolver produced no event");
        }
    }

    fn evening() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 3, 23, 30, 0).unwrap()
    }

    #[test]
    fn test_first_fetch_loads_window() {
        let mut resolver = create_test_resolver(SolarSource::Unavailable);
        let mut harness = Harness::at(evening());
        harness.transport.respond_ok(200, OVERNIGHT);

        let event = harness.tick_until_event(&mut resolver);

        assert_eq!(
            event,
            ResolverEvent::Loaded {
                summary: "Start: 22:00 (fixed), End: 06:00 (fixed)".to_string()
            }
        );
        assert_eq!(resolver.state(), WindowState::Allowed);
        assert_eq!(harness.transport.requests()[0].url, SCHEDULE_URL);
    }

    #[test]
    fn test_unloaded_window_is_blocked() {
        let mut resolver = WindowResolver::new(
            ScheduleSource::Unconfigured,
            SolarSource::Unavailable,
            LocalZone::Named(chrono_tz::UTC),
            settings(),
        );
        let mut harness = Harness::at(evening());

        assert_eq!(harness.tick(&mut resolver), None);
        assert_eq!(resolver.state(), WindowState::Blocked);
        assert_eq!(harness.transport.request_count(), 0);
    }

    #[test]
    fn test_unsynced_clock_is_unknown() {
        let mut resolver = create_test_resolver(SolarSource::Unavailable);
        let mut harness = Harness::at(DateTime::<Utc>::UNIX_EPOCH);
        harness.transport.respond_ok(200, OVERNIGHT);

        harness.tick_until_event(&mut resolver);
        assert!(resolver.is_loaded());
        assert_eq!(resolver.state(), WindowState::Unknown);

        // Clock syncs: evaluation happens on the very next tick.
        harness.now = evening();
        harness.tick(&mut resolver);
        assert_eq!(resolver.state(), WindowState::Allowed);
    }

    #[test]
    fn test_retry_while_unresolved() {
        let mut resolver = create_test_resolver(SolarSource::Unavailable);
        let mut harness = Harness::at(evening());
        harness.transport.respond_err(TransportError::Status(502));

        let event = harness.tick_until_event(&mut resolver);
        assert_eq!(
            event,
            ResolverEvent::Failed {
                stage: FetchStage::ScheduleHttp
            }
        );
        assert_eq!(harness.transport.request_count(), 1);

        // Nothing new before the retry interval.
        harness.advance(20);
        assert_eq!(harness.tick(&mut resolver), None);
        assert_eq!(harness.transport.request_count(), 1);

        harness.transport.respond_ok(200, OVERNIGHT);
        harness.advance(10);
        let event = harness.tick_until_event(&mut resolver);
        assert_eq!(event.event_name(), "schedule_loaded");
        assert_eq!(harness.transport.request_count(), 2);
    }

    #[test]
    fn test_offline_fetch_fails_immediately() {
        let mut resolver = create_test_resolver(SolarSource::Unavailable);
        let mut harness = Harness::at(evening());
        harness.network_up = false;

        let event = harness.tick(&mut resolver);
        assert_eq!(event.unwrap().message(), "schedule_http");
        assert_eq!(harness.transport.request_count(), 0);
    }

    #[test]
    fn test_no_fetch_during_fade() {
        let mut resolver = create_test_resolver(SolarSource::Unavailable);
        let mut harness = Harness::at(evening());
        harness.fade_active = true;

        assert_eq!(harness.tick(&mut resolver), None);
        assert_eq!(harness.transport.request_count(), 0);

        harness.fade_active = false;
        harness.transport.respond_ok(200, OVERNIGHT);
        harness.tick_until_event(&mut resolver);
        assert!(resolver.is_loaded());
    }

    #[test]
    fn test_failure_keeps_cached_window() {
        let mut resolver = create_test_resolver(SolarSource::Unavailable);
        // 02:00 on day one
        let mut harness = Harness::at(Utc.with_ymd_and_hms(2025, 11, 3, 2, 0, 0).unwrap());
        harness.transport.respond_ok(200, OVERNIGHT);
        harness.tick_until_event(&mut resolver);
        let loaded = resolver.window().cloned();

        // Next day, after the refresh hour: refetch fails.
        harness.advance(60);
        harness.now = Utc.with_ymd_and_hms(2025, 11, 4, 3, 0, 0).unwrap();
        harness.transport.respond_ok(200, r#"{"schedule":{}}"#);
        let event = harness.tick_until_event(&mut resolver);

        assert_eq!(event.message(), "schedule_parse");
        assert_eq!(resolver.window().cloned(), loaded);
        assert_eq!(resolver.state(), WindowState::Allowed);
    }

    #[test]
    fn test_daily_refresh_waits_for_refresh_hour() {
        let mut resolver = create_test_resolver(SolarSource::Unavailable);
        let mut harness = Harness::at(evening());
        harness.transport.respond_ok(200, OVERNIGHT);
        harness.tick_until_event(&mut resolver);
        assert_eq!(harness.transport.request_count(), 1);

        // Same day, later: no refetch.
        harness.advance(60);
        harness.tick(&mut resolver);
        assert_eq!(harness.transport.request_count(), 1);

        // Past midnight but before 03:00: still no refetch.
        harness.advance(60);
        harness.now = Utc.with_ymd_and_hms(2025, 11, 4, 2, 59, 0).unwrap();
        harness.tick(&mut resolver);
        assert_eq!(harness.transport.request_count(), 1);

        // 03:00: refetch once.
        harness.now = Utc.with_ymd_and_hms(2025, 11, 4, 3, 0, 0).unwrap();
        harness.transport.respond_ok(
            200,
            r#"{"schedule":{"start_time":"21:00","end_time":"05:00",
            "start_type":"fixed","end_type":"fixed","enabled":true}}"#,
        );
        harness.tick_until_event(&mut resolver);
        assert_eq!(harness.transport.request_count(), 2);
        assert_eq!(
            resolver.window().unwrap().summary(),
            "Start: 21:00 (fixed), End: 05:00 (fixed)"
        );

        harness.advance(3600);
        harness.tick(&mut resolver);
        assert_eq!(harness.transport.request_count(), 2);
    }

    #[test]
    fn test_solar_anchors_use_twilight_endpoint() {
        let mut resolver = create_test_resolver(SolarSource::Remote(TWILIGHT_URL.to_string()));
        let mut harness = Harness::at(evening());
        harness.transport.respond_ok(
            200,
            r#"{"schedule":{"start_type":"civil_dusk","end_type":"civil_dawn","enabled":true}}"#,
        );
        harness
            .transport
            .respond_ok(200, r#"{"civil_dawn":"06:41","civil_dusk":"17:22"}"#);

        let event = harness.tick_until_event(&mut resolver);

        assert_eq!(
            event.message(),
            "Start: 17:22 (civil_dusk), End: 06:41 (civil_dawn)"
        );
        let urls: Vec<String> = harness.transport.requests().into_iter().map(|r| r.url).collect();
        assert_eq!(urls, vec![SCHEDULE_URL.to_string(), TWILIGHT_URL.to_string()]);
    }

    #[test]
    fn test_twilight_lookup_waits_for_fade() {
        let mut resolver = create_test_resolver(SolarSource::Remote(TWILIGHT_URL.to_string()));
        let mut harness = Harness::at(evening());
        harness.transport.respond_pending();
        assert_eq!(harness.tick(&mut resolver), None);
        assert_eq!(harness.transport.request_count(), 1);

        // A fade starts while the schedule request is in flight.
        harness.fade_active = true;
        harness.transport.complete_pending(Ok(Response {
            status: 200,
            body: r#"{"schedule":{"start_type":"civil_dusk","end_type":"civil_dawn","enabled":true}}"#
                .to_string(),
        }));
        for _ in 0..5 {
            assert_eq!(harness.tick(&mut resolver), None);
            harness.uptime += Duration::from_millis(50);
        }
        assert_eq!(harness.transport.request_count(), 1);
        assert!(resolver.is_fetching());

        harness.fade_active = false;
        harness
            .transport
            .respond_ok(200, r#"{"civil_dawn":"06:41","civil_dusk":"17:22"}"#);
        let event = harness.tick_until_event(&mut resolver);

        assert_eq!(event.event_name(), "schedule_loaded");
        assert_eq!(harness.transport.requests()[1].url, TWILIGHT_URL);
    }

    #[test]
    fn test_offline_twilight_lookup_fails_without_request() {
        let mut resolver = create_test_resolver(SolarSource::Remote(TWILIGHT_URL.to_string()));
        let mut harness = Harness::at(evening());
        harness.transport.respond_pending();
        harness.tick(&mut resolver);

        harness.network_up = false;
        harness.transport.complete_pending(Ok(Response {
            status: 200,
            body: r#"{"schedule":{"start_type":"civil_dusk","end_type":"civil_dawn","enabled":true}}"#
                .to_string(),
        }));
        let event = harness.tick(&mut resolver);

        assert_eq!(event.unwrap().message(), "twilight_http");
        assert_eq!(harness.transport.request_count(), 1);
    }

    #[test]
    fn test_twilight_failures_report_stage() {
        let mut resolver = create_test_resolver(SolarSource::Remote(TWILIGHT_URL.to_string()));
        let mut harness = Harness::at(evening());
        let solar_schedule =
            r#"{"schedule":{"start_type":"civil_dusk","end_type":"fixed","end_time":"06:00","enabled":true}}"#;

        harness.transport.respond_ok(200, solar_schedule);
        harness.transport.respond_err(TransportError::Timeout);
        assert_eq!(harness.tick_until_event(&mut resolver).message(), "twilight_http");

        harness.advance(30);
        harness.transport.respond_ok(200, solar_schedule);
        harness.transport.respond_ok(200, r#"{"civil_dawn":"06:41"}"#);
        assert_eq!(harness.tick_until_event(&mut resolver).message(), "twilight_parse");
        assert!(!resolver.is_loaded());
    }

    #[test]
    fn test_solar_anchor_without_source() {
        let mut resolver = create_test_resolver(SolarSource::Unavailable);
        let mut harness = Harness::at(evening());
        harness.transport.respond_ok(
            200,
            r#"{"schedule":{"start_type":"civil_dusk","end_type":"fixed","end_time":"06:00","enabled":true}}"#,
        );

        assert_eq!(
            harness.tick_until_event(&mut resolver).message(),
            "twilight_unavailable"
        );
    }

    #[test]
    fn test_missing_literal_time() {
        let mut resolver = create_test_resolver(SolarSource::Unavailable);
        let mut harness = Harness::at(evening());
        harness.transport.respond_ok(
            200,
            r#"{"schedule":{"start_time":"22:00","start_type":"fixed","end_type":"fixed","enabled":true}}"#,
        );

        assert_eq!(harness.tick_until_event(&mut resolver).message(), "time_missing");
    }

    #[test]
    fn test_static_schedule_with_local_solar() {
        let description = ScheduleDescription {
            start_time: None,
            end_time: Some("06:00".to_string()),
            start_type: "civil_dusk".to_string(),
            end_type: "fixed".to_string(),
            enabled: true,
        };
        let mut resolver = WindowResolver::new(
            ScheduleSource::Static(description),
            SolarSource::Local {
                latitude: 52.52,
                longitude: 13.405,
            },
            LocalZone::Named(chrono_tz::Europe::Berlin),
            settings(),
        );
        let mut harness = Harness::at(evening());

        let event = harness.tick(&mut resolver).unwrap();

        assert_eq!(event.event_name(), "schedule_loaded");
        assert!(event.message().ends_with("End: 06:00 (fixed)"));
        assert_eq!(harness.transport.request_count(), 0);
        // 00:30 in Berlin is after dusk and before 06:00.
        assert_eq!(resolver.state(), WindowState::Allowed);
    }

    #[test]
    fn test_evaluation_is_cached_for_eval_interval() {
        let mut resolver = create_test_resolver(SolarSource::Unavailable);
        // 21:59:45, just before the window opens
        let mut harness = Harness::at(Utc.with_ymd_and_hms(2025, 11, 3, 21, 59, 45).unwrap());
        harness.transport.respond_ok(200, OVERNIGHT);
        harness.tick_until_event(&mut resolver);
        assert_eq!(resolver.state(), WindowState::Blocked);

        // Window opens at 22:00 but the cached result holds for 30s.
        harness.advance(29);
        harness.tick(&mut resolver);
        assert_eq!(resolver.state(), WindowState::Blocked);
        assert!(resolver.is_within_window(harness.now));

        harness.advance(1);
        harness.tick(&mut resolver);
        assert_eq!(resolver.state(), WindowState::Allowed);
    }

    #[test]
    fn test_disabled_schedule_is_blocked() {
        let mut resolver = create_test_resolver(SolarSource::Unavailable);
        let mut harness = Harness::at(evening());
        harness.transport.respond_ok(
            200,
            r#"{"schedule":{"start_time":"22:00","end_time":"06:00",
            "start_type":"fixed","end_type":"fixed","enabled":false}}"#,
        );

        harness.tick_until_event(&mut resolver);
        assert_eq!(resolver.state(), WindowState::Blocked);
    }
}
