//! Default configuration file generation.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::constants::*;

/// Write a commented default configuration to `path`.
///
/// Optional settings (hardware paths, endpoints, coordinates) are written as
/// comments so the generated file loads as-is.
pub fn create_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    fs::write(path, default_config_content())
        .with_context(|| format!("Failed to write default config to {}", path.display()))
}

pub(crate) fn default_config_content() -> String {
    ConfigBuilder::new()
        .add_section("Control loop")
        .add_setting(
            "tick_interval_ms",
            &DEFAULT_TICK_INTERVAL_MS.to_string(),
            &format!(
                "Loop cadence ({MINIMUM_TICK_INTERVAL_MS}-{MAXIMUM_TICK_INTERVAL_MS}) ms"
            ),
        )
        .add_setting(
            "motion_timeout",
            &DEFAULT_MOTION_TIMEOUT.to_string(),
            &format!(
                "Seconds without motion before fading out ({MINIMUM_MOTION_TIMEOUT}-{MAXIMUM_MOTION_TIMEOUT})"
            ),
        )
        .add_section("Hardware")
        .add_setting(
            "motion_inputs",
            "[]",
            "Sensor value files, e.g. [\"/sys/class/gpio/gpio17/value\"]",
        )
        .add_comment("light_output = \"/run/raillamp/strip\"  # File or FIFO receiving frames")
        .add_section("Light")
        .add_setting(
            "max_brightness",
            &DEFAULT_MAX_BRIGHTNESS.to_string(),
            "Steady-on brightness (0-255)",
        )
        .add_setting(
            "fade_step",
            &DEFAULT_FADE_STEP.to_string(),
            "Brightness change per fade step (1-255)",
        )
        .add_setting(
            "fade_step_interval_ms",
            &DEFAULT_FADE_STEP_INTERVAL_MS.to_string(),
            &format!(
                "Time between fade steps ({MINIMUM_FADE_STEP_INTERVAL_MS}-{MAXIMUM_FADE_STEP_INTERVAL_MS}) ms"
            ),
        )
        .add_setting(
            "color",
            &format!(
                "[{}, {}, {}]",
                DEFAULT_COLOR.r, DEFAULT_COLOR.g, DEFAULT_COLOR.b
            ),
            "RGB colour of the light",
        )
        .add_section("Schedule")
        .add_comment("schedule_url = \"https://example.org/schedule\"")
        .add_comment("twilight_url = \"https://example.org/twilight\"")
        .add_comment("latitude = 52.52")
        .add_comment("longitude = 13.405")
        .add_comment("timezone = \"Europe/Berlin\"")
        .add_setting(
            "schedule_retry_interval",
            &DEFAULT_SCHEDULE_RETRY_INTERVAL.to_string(),
            &format!(
                "Seconds between fetch attempts until a schedule loads ({MINIMUM_SCHEDULE_RETRY_INTERVAL}-{MAXIMUM_SCHEDULE_RETRY_INTERVAL})"
            ),
        )
        .add_setting(
            "schedule_eval_interval",
            &DEFAULT_SCHEDULE_EVAL_INTERVAL.to_string(),
            &format!(
                "Seconds between window evaluations ({MINIMUM_SCHEDULE_EVAL_INTERVAL}-{MAXIMUM_SCHEDULE_EVAL_INTERVAL})"
            ),
        )
        .add_setting(
            "schedule_refresh_hour",
            &DEFAULT_SCHEDULE_REFRESH_HOUR.to_string(),
            "Local hour of the daily refetch (0-23)",
        )
        .add_setting(
            "http_timeout",
            &DEFAULT_HTTP_TIMEOUT.to_string(),
            &format!(
                "Request timeout in seconds ({MINIMUM_HTTP_TIMEOUT}-{MAXIMUM_HTTP_TIMEOUT}, below the retry interval)"
            ),
        )
        .add_setting(
            "unsynced_policy",
            "\"block\"",
            "Before the clock is synchronised: \"block\" or \"allow\"",
        )
        .add_setting(
            "equal_bounds",
            "\"always_on\"",
            "Window with start == end: \"always_on\" or \"always_off\"",
        )
        .add_section("Events")
        .add_comment("event_url = \"https://example.org/events\"")
        .add_comment("event_token = \"secret\"")
        .add_setting(
            "event_queue_capacity",
            &DEFAULT_EVENT_QUEUE_CAPACITY.to_string(),
            &format!(
                "Events kept while offline ({MINIMUM_EVENT_QUEUE_CAPACITY}-{MAXIMUM_EVENT_QUEUE_CAPACITY})"
            ),
        )
        .add_setting(
            "event_min_interval_ms",
            &DEFAULT_EVENT_MIN_INTERVAL_MS.to_string(),
            &format!(
                "Minimum time between deliveries ({MINIMUM_EVENT_MIN_INTERVAL_MS}-{MAXIMUM_EVENT_MIN_INTERVAL_MS}) ms"
            ),
        )
        .add_section("Status")
        .add_setting(
            "status_interval",
            &DEFAULT_STATUS_INTERVAL.to_string(),
            &format!(
                "Seconds between status file updates ({MINIMUM_STATUS_INTERVAL}-{MAXIMUM_STATUS_INTERVAL})"
            ),
        )
        .add_section("Status feed")
        .add_comment("mqtt_host = \"broker.local\"  # Live status over MQTT; off when unset")
        .add_comment(&format!("mqtt_port = {DEFAULT_MQTT_PORT}"))
        .add_comment("mqtt_tls = true")
        .add_comment("mqtt_username = \"raillamp\"")
        .add_comment("mqtt_password = \"secret\"")
        .add_setting(
            "mqtt_topic",
            &format!("\"{DEFAULT_MQTT_TOPIC}\""),
            "Retained topic for the live status",
        )
        .add_setting(
            "status_heartbeat",
            &DEFAULT_STATUS_HEARTBEAT.to_string(),
            &format!(
                "Seconds between unchanged status messages ({MINIMUM_STATUS_HEARTBEAT}-{MAXIMUM_STATUS_HEARTBEAT})"
            ),
        )
        .build()
}

/// Builds a config file with setting comments aligned in one column.
struct ConfigBuilder {
    entries: Vec<Entry>,
}

enum Entry {
    Section(String),
    Setting { line: String, comment: String },
    Comment(String),
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(Entry::Section(format!("#[{title}]")));
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(Entry::Setting {
            line: format!("{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    /// A commented-out example line.
    fn add_comment(mut self, text: &str) -> Self {
        self.entries.push(Entry::Comment(format!("#{text}")));
        self
    }

    fn build(self) -> String {
        let width = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                Entry::Setting { line, .. } => Some(line.len()),
                _ => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut lines = Vec::new();
        for (index, entry) in self.entries.into_iter().enumerate() {
            match entry {
                Entry::Section(title) => {
                    if index > 0 {
                        lines.push(String::new());
                    }
                    lines.push(title);
                }
                Entry::Setting { line, comment } => {
                    let padding = " ".repeat(width - line.len());
                    lines.push(format!("{line}{padding}{comment}"));
                }
                Entry::Comment(text) => lines.push(text),
            }
        }

        let mut content = lines.join("\n");
        content.push('\n');
        content
    }
}
