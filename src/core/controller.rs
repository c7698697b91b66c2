//! The per-tick orchestration of every component.
//!
//! `Controller` owns all core state. One call to [`Controller::tick`] runs, in
//! order: arm expiry, schedule fetch and window evaluation, motion sampling,
//! the motion reaction, one fade step, the inactivity timeout, the live status
//! feed and one delivery attempt. Nothing in here blocks or sleeps.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::commands::ControlCommand;
use crate::config::Config;
use crate::constants::*;
use crate::error::LampError;
use crate::light::{FadeController, LightOutput, Rgb};
use crate::motion::MotionDebouncer;
use crate::network::NetworkStatus;
use crate::schedule::{
    ArmOverride, FetchContext, UnsyncedPolicy, WindowResolver, WindowState, should_react,
};
use crate::status::{
    ArmStatus, EventStatus, FeedStatus, LightStatus, MotionStatus, StatusSnapshot, WindowStatus,
};
use crate::telemetry::{
    EventPublisher, EventQueue, PublishContext, Snapshot, StatusFeed, StatusLink,
};
use crate::time_source::{LocalZone, TimeSource, is_synchronized};
use crate::transport::Transport;

/// The collaborators the controller talks to. Real hardware and HTTP in the
/// daemon, scripted fakes in tests.
pub struct Collaborators {
    pub clock: Box<dyn TimeSource>,
    pub motion: MotionDebouncer,
    pub light: Box<dyn LightOutput>,
    pub network: Box<dyn NetworkStatus>,
    pub transport: Box<dyn Transport>,
    /// Live status feed; none when no broker is configured.
    pub status_link: Option<Box<dyn StatusLink>>,
}

pub struct Controller {
    clock: Box<dyn TimeSource>,
    motion: MotionDebouncer,
    light: Box<dyn LightOutput>,
    network: Box<dyn NetworkStatus>,
    transport: Box<dyn Transport>,
    status_link: Option<Box<dyn StatusLink>>,

    fade: FadeController,
    resolver: WindowResolver,
    arm: ArmOverride,
    queue: EventQueue,
    publisher: EventPublisher,
    status_feed: StatusFeed,

    motion_timeout: Duration,
    unsynced_policy: UnsyncedPolicy,
    last_motion: Option<Duration>,
    motion_present: bool,
    light_failing: bool,
    debug_enabled: bool,
}

impl Controller {
    /// Build a controller from a loaded configuration.
    pub fn new(
        config: &Config,
        collaborators: Collaborators,
        debug_enabled: bool,
    ) -> anyhow::Result<Self> {
        let zone = LocalZone::from_config(config.timezone.as_deref())?;

        let fade = FadeController::new(
            config.max_brightness.unwrap_or(DEFAULT_MAX_BRIGHTNESS),
            config.fade_step.unwrap_or(DEFAULT_FADE_STEP),
            config.fade_step_interval(),
            config.color.unwrap_or(DEFAULT_COLOR),
        );
        let resolver = WindowResolver::new(
            config.schedule_source(),
            config.solar_source(),
            zone,
            config.resolver_settings(),
        );
        let queue = EventQueue::new(
            config
                .event_queue_capacity
                .unwrap_or(DEFAULT_EVENT_QUEUE_CAPACITY),
        );
        let publisher = EventPublisher::new(config.publisher_settings(), debug_enabled);

        let Collaborators {
            clock,
            motion,
            light,
            network,
            transport,
            status_link,
        } = collaborators;

        Ok(Self {
            clock,
            motion,
            light,
            network,
            transport,
            status_link,
            fade,
            resolver,
            arm: ArmOverride::new(),
            queue,
            publisher,
            status_feed: StatusFeed::new(config.status_heartbeat()),
            motion_timeout: config.motion_timeout(),
            unsynced_policy: config.unsynced_policy.unwrap_or_default(),
            last_motion: None,
            motion_present: false,
            light_failing: false,
            debug_enabled,
        })
    }

    /// Switch the light off and queue the startup event.
    pub fn start(&mut self) {
        let color = self.fade.color();
        self.show(0, color);
        self.log_event("startup", Some(env!("CARGO_PKG_VERSION").to_string()));
    }

    /// Run one control-loop iteration.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        let uptime = self.clock.uptime();
        let network_up = self.network.is_up();

        self.expire_arm(now);

        let resolver_event = {
            let mut ctx = FetchContext {
                now,
                uptime,
                fade_active: self.fade.is_transitioning(),
                network_up,
                transport: self.transport.as_mut(),
            };
            self.resolver.handle(&mut ctx)
        };
        if let Some(event) = resolver_event {
            self.log_event(event.event_name(), Some(event.message()));
        }

        self.motion_present = self.motion.poll();
        if self.motion_present && self.should_react(now) {
            self.last_motion = Some(uptime);
            if !self.fade.is_on() && self.fade.start_fade_in() {
                log_decorated!("Fading in");
                self.log_event("light_on", None);
            }
        }

        if let Some(done) = self.fade.tick(uptime) {
            if self.debug_enabled {
                log_debug!("{} at brightness {}", done.event_name(), self.fade.brightness());
            }
            self.log_event(done.event_name(), None);
        }
        self.push_frame();

        let timed_out = self
            .last_motion
            .is_none_or(|last| uptime.saturating_sub(last) > self.motion_timeout);
        if self.fade.is_on() && timed_out && self.fade.start_fade_out() {
            log_decorated!("No motion for {}s, fading out", self.motion_timeout.as_secs());
            self.log_event("light_off", None);
        }

        let snapshot = self.snapshot();
        if let Some(link) = self.status_link.as_deref_mut() {
            self.status_feed.tick(snapshot, uptime, link);
        }

        let mut ctx = PublishContext {
            uptime,
            network_up,
            fade_active: self.fade.is_transitioning(),
            transport: self.transport.as_mut(),
        };
        self.publisher.tick(&mut self.queue, &mut ctx);
    }

    fn expire_arm(&mut self, now: DateTime<Utc>) {
        if self.arm.refresh(now) {
            log_block_start!("Arm override expired");
            self.log_event("arm_expired", None);
        }
    }

    /// Whether motion right now should turn the light on.
    pub fn should_react(&mut self, now: DateTime<Utc>) -> bool {
        let armed = self.arm.is_active(now);
        should_react(armed, self.resolver.state(), self.unsynced_policy)
    }

    /// Apply a control command received from the CLI.
    pub fn apply(&mut self, command: ControlCommand) -> Result<(), LampError> {
        let now = self.clock.now();
        log_block_start!("Applying '{}'", command.describe());

        match command {
            ControlCommand::Arm { hours } => {
                let expiry = self.arm.arm_for(hours, now)?;
                self.log_armed(expiry);
            }
            ControlCommand::ArmTonight => {
                let expiry = self
                    .arm
                    .arm_until_end_of_local_day(now, self.resolver.zone())?;
                self.log_armed(expiry);
            }
            ControlCommand::Disarm => {
                if !self.arm.disarm() {
                    log_indented!("Override was not active");
                }
                self.log_event("disarmed", None);
            }
            ControlCommand::SetMaxBrightness { value } => {
                self.fade.set_max_brightness(value);
                self.push_frame();
                log_indented!("Max brightness: {}", value);
            }
            ControlCommand::SetColor { color } => {
                self.fade.set_color(color);
                self.push_frame();
                log_indented!("Colour: {}", color);
            }
            ControlCommand::SetMotionTimeout { seconds } => {
                let seconds = seconds.clamp(MINIMUM_MOTION_TIMEOUT, MAXIMUM_MOTION_TIMEOUT);
                self.motion_timeout = Duration::from_secs(seconds);
                log_indented!("Motion timeout: {} seconds", seconds);
            }
        }
        Ok(())
    }

    fn log_armed(&mut self, expiry: DateTime<Utc>) {
        let local = self
            .resolver
            .zone()
            .localize(expiry)
            .format("%Y-%m-%d %H:%M")
            .to_string();
        log_indented!("Armed until {}", local);
        self.log_event("armed", Some(local));
    }

    /// Queue a lifecycle event with the current light and motion state.
    pub fn log_event(&mut self, name: &str, message: Option<String>) {
        let now = self.clock.now();
        let timestamp = is_synchronized(now).then_some(now);
        let dropped = self.queue.dropped();

        self.queue.enqueue(name, self.snapshot(), message, timestamp);

        if self.debug_enabled && self.queue.dropped() > dropped {
            log_debug!("{}", LampError::QueueOverflow);
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            lights_on: self.fade.is_on(),
            brightness: self.fade.brightness(),
            motion: self.motion_present,
        }
    }

    fn push_frame(&mut self) {
        if let Some((brightness, color)) = self.fade.take_frame() {
            self.show(brightness, color);
        }
    }

    fn show(&mut self, brightness: u8, color: Rgb) {
        match self.light.show(brightness, color) {
            Ok(()) => {
                if self.light_failing {
                    log_info!("Light output recovered");
                    self.light_failing = false;
                }
            }
            Err(e) => {
                if !self.light_failing {
                    log_warning!("Light output failed: {:#}", e);
                    self.light_failing = true;
                }
            }
        }
    }

    /// Switch the light off immediately. Used on shutdown.
    pub fn shutdown(&mut self) {
        self.fade.force_off();
        self.push_frame();
    }

    pub fn status(&mut self) -> StatusSnapshot {
        let now = self.clock.now();
        self.expire_arm(now);
        let synced = is_synchronized(now);
        let zone = *self.resolver.zone();
        let window = self.resolver.window();

        let arm_active = self.arm.is_active(now);
        let expires = self
            .arm
            .expiry()
            .map(|expiry| zone.localize(expiry).format("%Y-%m-%d %H:%M").to_string());

        StatusSnapshot {
            pid: std::process::id(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            updated_at: synced.then_some(now),
            clock_synchronized: synced,
            network_up: self.network.is_up(),
            light: LightStatus {
                phase: self.fade.phase().as_str().to_string(),
                brightness: self.fade.brightness(),
                max_brightness: self.fade.max_brightness(),
                color: self.fade.color(),
            },
            motion: MotionStatus {
                present: self.motion_present,
                timeout_secs: self.motion_timeout.as_secs(),
                inputs: self.motion.input_count(),
            },
            window: WindowStatus {
                state: self.resolver.state().as_str().to_string(),
                loaded: self.resolver.is_loaded(),
                fetching: self.resolver.is_fetching(),
                bounds: window.map(|w| w.summary()),
                enabled: window.map(|w| w.enabled),
                timezone: zone.describe(),
            },
            arm: ArmStatus {
                active: arm_active,
                expires,
                remaining_minutes: self.arm.remaining_minutes(now),
            },
            events: EventStatus {
                endpoint_configured: self.publisher.is_configured(),
                queued: self.queue.len(),
                capacity: self.queue.capacity(),
                dropped: self.queue.dropped(),
                delivered: self.publisher.delivered(),
                consecutive_failures: self.publisher.consecutive_failures(),
            },
            feed: FeedStatus {
                configured: self.status_link.is_some(),
                connected: self.status_feed.is_connected(),
                published: self.status_feed.published(),
            },
        }
    }

    pub fn fade(&self) -> &FadeController {
        &self.fade
    }

    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    pub fn window_state(&self) -> WindowState {
        self.resolver.state()
    }

    pub fn is_armed(&mut self) -> bool {
        let now = self.clock.now();
        self.expire_arm(now);
        self.arm.is_active(now)
    }
}
