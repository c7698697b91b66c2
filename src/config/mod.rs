//! Configuration system for raillamp.
//!
//! Settings live in `raillamp.toml`, found in `$XDG_CONFIG_HOME/raillamp/` or in
//! the directory passed with `--config`. A commented default file is written on
//! first run.
//!
//! ```toml
//! #[Control loop]
//! tick_interval_ms = 50        # Loop cadence (10-1000) ms
//! motion_timeout = 30          # Seconds without motion before fading out (1-300)
//!
//! #[Hardware]
//! motion_inputs = ["/sys/class/gpio/gpio17/value"]
//! light_output = "/run/raillamp/strip"
//!
//! #[Light]
//! max_brightness = 30          # Steady-on brightness (0-255)
//! fade_step = 5                # Brightness change per fade step (1-255)
//! fade_step_interval_ms = 30   # Time between fade steps (1-1000) ms
//! color = [255, 140, 60]       # RGB colour
//!
//! #[Schedule]
//! schedule_url = "https://example.org/schedule"
//! twilight_url = "https://example.org/twilight"
//! latitude = 52.52             # Local solar computation when no twilight_url is set
//! longitude = 13.405
//! timezone = "Europe/Berlin"   # IANA zone; system zone when omitted
//!
//! #[Events]
//! event_url = "https://example.org/events"
//! event_token = "secret"
//!
//! #[Status feed]
//! mqtt_host = "broker.local"   # Live status over MQTT; off when unset
//! mqtt_topic = "raillamp/status"
//! status_heartbeat = 5         # Seconds between unchanged messages (1-300)
//! ```
//!
//! Instead of `schedule_url`, a fixed description may be given inline:
//!
//! ```toml
//! [schedule]
//! start_time = "22:00"
//! end_time = "06:00"
//! start_type = "fixed"
//! end_type = "fixed"
//! enabled = true
//! ```
//!
//! Every value is validated at load time, so a config that loads can be turned
//! into runtime settings without further checks.

pub mod builder;
pub mod loading;
pub mod validation;

use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::*;
use crate::light::Rgb;
use crate::schedule::{
    EqualBoundsPolicy, ResolverSettings, ScheduleDescription, ScheduleSource, SolarSource,
    UnsyncedPolicy,
};
use crate::telemetry::{MqttSettings, PublisherSettings};

pub use builder::create_default_config;
pub use loading::{
    get_config_path, get_custom_config_dir, load, load_from_path, private_path, set_config_dir,
};

/// Configuration structure for raillamp.
///
/// Every field is optional in the file. After [`load_from_path`] the fields
/// that have a default are always `Some`.
#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
pub struct Config {
    pub tick_interval_ms: Option<u64>,
    pub motion_timeout: Option<u64>, // seconds
    /// Paths of GPIO-style value files; any one reading "1" means motion.
    pub motion_inputs: Option<Vec<String>>,
    /// File or FIFO receiving `brightness r g b` frames. Frames are only logged
    /// when unset.
    pub light_output: Option<String>,

    pub max_brightness: Option<u8>,
    pub fade_step: Option<u8>,
    pub fade_step_interval_ms: Option<u64>,
    pub color: Option<Rgb>,

    pub timezone: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub schedule_url: Option<String>,
    pub twilight_url: Option<String>,
    /// Inline schedule description, used when `schedule_url` is not set.
    pub schedule: Option<ScheduleDescription>,
    pub schedule_retry_interval: Option<u64>, // seconds
    pub schedule_eval_interval: Option<u64>,  // seconds
    pub schedule_refresh_hour: Option<u32>,
    pub http_timeout: Option<u64>, // seconds
    pub unsynced_policy: Option<UnsyncedPolicy>,
    pub equal_bounds: Option<EqualBoundsPolicy>,

    pub event_url: Option<String>,
    pub event_token: Option<String>,
    pub event_queue_capacity: Option<usize>,
    pub event_min_interval_ms: Option<u64>,

    pub status_interval: Option<u64>, // seconds

    pub mqtt_host: Option<String>,
    /// 1883, or 8883 with `mqtt_tls`.
    pub mqtt_port: Option<u16>,
    pub mqtt_tls: Option<bool>,
    pub mqtt_username: Option<String>,
    pub mqtt_password: Option<String>,
    pub mqtt_topic: Option<String>,
    pub status_heartbeat: Option<u64>, // seconds
}

impl Config {
    /// Load configuration using the module's load function
    pub fn load() -> Result<Self> {
        load()
    }

    /// Load from path using the module's load_from_path function
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        load_from_path(path)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        get_config_path()
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.unwrap_or(DEFAULT_TICK_INTERVAL_MS))
    }

    pub fn motion_timeout(&self) -> Duration {
        Duration::from_secs(self.motion_timeout.unwrap_or(DEFAULT_MOTION_TIMEOUT))
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.status_interval.unwrap_or(DEFAULT_STATUS_INTERVAL))
    }

    pub fn fade_step_interval(&self) -> Duration {
        Duration::from_millis(
            self.fade_step_interval_ms
                .unwrap_or(DEFAULT_FADE_STEP_INTERVAL_MS),
        )
    }

    /// Remote endpoint first, then the inline description.
    pub fn schedule_source(&self) -> ScheduleSource {
        match (&self.schedule_url, &self.schedule) {
            (Some(url), _) => ScheduleSource::Remote(url.clone()),
            (None, Some(description)) => ScheduleSource::Static(description.clone()),
            (None, None) => ScheduleSource::Unconfigured,
        }
    }

    /// Twilight endpoint first, then local computation from coordinates.
    pub fn solar_source(&self) -> SolarSource {
        match (&self.twilight_url, self.latitude, self.longitude) {
            (Some(url), _, _) => SolarSource::Remote(url.clone()),
            (None, Some(latitude), Some(longitude)) => SolarSource::Local {
                latitude,
                longitude,
            },
            _ => SolarSource::Unavailable,
        }
    }

    pub fn resolver_settings(&self) -> ResolverSettings {
        ResolverSettings {
            retry_interval: Duration::from_secs(
                self.schedule_retry_interval
                    .unwrap_or(DEFAULT_SCHEDULE_RETRY_INTERVAL),
            ),
            eval_interval: Duration::from_secs(
                self.schedule_eval_interval
                    .unwrap_or(DEFAULT_SCHEDULE_EVAL_INTERVAL),
            ),
            refresh_hour: self
                .schedule_refresh_hour
                .unwrap_or(DEFAULT_SCHEDULE_REFRESH_HOUR),
            http_timeout: self.http_timeout(),
            equal_bounds: self.equal_bounds.unwrap_or_default(),
        }
    }

    pub fn publisher_settings(&self) -> PublisherSettings {
        PublisherSettings {
            endpoint: self.event_url.clone(),
            token: self.event_token.clone(),
            min_interval: Duration::from_millis(
                self.event_min_interval_ms
                    .unwrap_or(DEFAULT_EVENT_MIN_INTERVAL_MS),
            ),
            timeout: self.http_timeout(),
        }
    }

    /// Broker connection for the live status feed, when `mqtt_host` is set.
    pub fn mqtt_settings(&self) -> Option<MqttSettings> {
        let host = self.mqtt_host.clone()?;
        let tls = self.mqtt_tls.unwrap_or(false);
        Some(MqttSettings {
            host,
            port: self.mqtt_port.unwrap_or(if tls {
                DEFAULT_MQTT_TLS_PORT
            } else {
                DEFAULT_MQTT_PORT
            }),
            tls,
            client_id: format!("raillamp-{}", std::process::id()),
            username: self.mqtt_username.clone(),
            password: self.mqtt_password.clone(),
            topic: self
                .mqtt_topic
                .clone()
                .unwrap_or_else(|| DEFAULT_MQTT_TOPIC.to_string()),
        })
    }

    pub fn status_heartbeat(&self) -> Duration {
        Duration::from_secs(self.status_heartbeat.unwrap_or(DEFAULT_STATUS_HEARTBEAT))
    }

    fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout.unwrap_or(DEFAULT_HTTP_TIMEOUT))
    }

    pub fn log_config(&self) {
        log_block_start!("Loaded configuration");

        let inputs = self.motion_inputs.as_deref().unwrap_or_default();
        if inputs.is_empty() {
            log_indented!("Motion inputs: none");
        } else {
            log_indented!("Motion inputs: {}", inputs.join(", "));
        }
        log_indented!(
            "Light output: {}",
            self.light_output.as_deref().unwrap_or("log only")
        );
        log_indented!(
            "Light: max {} @ colour {}, step {} every {}ms",
            self.max_brightness.unwrap_or(DEFAULT_MAX_BRIGHTNESS),
            self.color.unwrap_or(DEFAULT_COLOR),
            self.fade_step.unwrap_or(DEFAULT_FADE_STEP),
            self.fade_step_interval_ms
                .unwrap_or(DEFAULT_FADE_STEP_INTERVAL_MS)
        );
        log_indented!(
            "Motion timeout: {} seconds",
            self.motion_timeout.unwrap_or(DEFAULT_MOTION_TIMEOUT)
        );

        match self.schedule_source() {
            ScheduleSource::Remote(url) => log_indented!("Schedule: {}", url),
            ScheduleSource::Static(_) => log_indented!("Schedule: inline"),
            ScheduleSource::Unconfigured => {
                log_indented!("Schedule: none (light only reacts while armed)")
            }
        }
        match self.solar_source() {
            SolarSource::Remote(url) => log_indented!("Twilight: {}", url),
            SolarSource::Local {
                latitude,
                longitude,
            } => {
                let lat_dir = if latitude >= 0.0 { "N" } else { "S" };
                let lon_dir = if longitude >= 0.0 { "E" } else { "W" };
                log_indented!(
                    "Twilight: computed for {:.3}°{}, {:.3}°{}",
                    latitude.abs(),
                    lat_dir,
                    longitude.abs(),
                    lon_dir
                );
            }
            SolarSource::Unavailable => {}
        }
        log_indented!(
            "Timezone: {}",
            self.timezone.as_deref().unwrap_or("system")
        );

        if let Some(ref url) = self.event_url {
            log_indented!(
                "Events: {} (queue {}, every {}ms)",
                url,
                self.event_queue_capacity
                    .unwrap_or(DEFAULT_EVENT_QUEUE_CAPACITY),
                self.event_min_interval_ms
                    .unwrap_or(DEFAULT_EVENT_MIN_INTERVAL_MS)
            );
        }

        if let Some(mqtt) = self.mqtt_settings() {
            log_indented!(
                "Status feed: {}{}:{} topic {} (heartbeat {}s)",
                if mqtt.tls { "mqtts://" } else { "mqtt://" },
                mqtt.host,
                mqtt.port,
                mqtt.topic,
                self.status_heartbeat().as_secs()
            );
        }
    }
}
