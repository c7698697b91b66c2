//! Application-wide constants: defaults, validation limits and fixed values.

use std::time::Duration;

use crate::light::Rgb;

// # Control loop
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 50;
pub const MINIMUM_TICK_INTERVAL_MS: u64 = 10;
pub const MAXIMUM_TICK_INTERVAL_MS: u64 = 1000;

// # Motion
pub const DEFAULT_MOTION_TIMEOUT: u64 = 30; // seconds
pub const MINIMUM_MOTION_TIMEOUT: u64 = 1;
pub const MAXIMUM_MOTION_TIMEOUT: u64 = 300;

// # Light and fades
pub const DEFAULT_MAX_BRIGHTNESS: u8 = 30;
pub const DEFAULT_FADE_STEP: u8 = 5;
pub const MINIMUM_FADE_STEP: u8 = 1;
pub const DEFAULT_FADE_STEP_INTERVAL_MS: u64 = 30;
pub const MINIMUM_FADE_STEP_INTERVAL_MS: u64 = 1;
pub const MAXIMUM_FADE_STEP_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_COLOR: Rgb = Rgb::new(255, 140, 60);

// # Schedule
pub const DEFAULT_SCHEDULE_RETRY_INTERVAL: u64 = 30; // seconds
pub const MINIMUM_SCHEDULE_RETRY_INTERVAL: u64 = 5;
pub const MAXIMUM_SCHEDULE_RETRY_INTERVAL: u64 = 3600;
pub const DEFAULT_SCHEDULE_EVAL_INTERVAL: u64 = 30; // seconds
pub const MINIMUM_SCHEDULE_EVAL_INTERVAL: u64 = 1;
pub const MAXIMUM_SCHEDULE_EVAL_INTERVAL: u64 = 600;
pub const DEFAULT_SCHEDULE_REFRESH_HOUR: u32 = 3;
pub const DEFAULT_HTTP_TIMEOUT: u64 = 10; // seconds
pub const MINIMUM_HTTP_TIMEOUT: u64 = 1;
pub const MAXIMUM_HTTP_TIMEOUT: u64 = 60;

/// Wall-clock readings before this epoch second (2023-11-14) mean the clock has
/// not been synchronised yet.
pub const MIN_SYNCED_EPOCH_SECS: i64 = 1_700_000_000;

// # Arming
pub const MINIMUM_ARM_HOURS: u32 = 1;
pub const MAXIMUM_ARM_HOURS: u32 = 24;

// # Telemetry
pub const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 32;
pub const MINIMUM_EVENT_QUEUE_CAPACITY: usize = 1;
pub const MAXIMUM_EVENT_QUEUE_CAPACITY: usize = 1024;
pub const DEFAULT_EVENT_MIN_INTERVAL_MS: u64 = 1000;
pub const MINIMUM_EVENT_MIN_INTERVAL_MS: u64 = 100;
pub const MAXIMUM_EVENT_MIN_INTERVAL_MS: u64 = 600_000;

// # Status surface
pub const DEFAULT_STATUS_INTERVAL: u64 = 2; // seconds
pub const MINIMUM_STATUS_INTERVAL: u64 = 1;
pub const MAXIMUM_STATUS_INTERVAL: u64 = 60;

// # Live status feed (MQTT)
pub const DEFAULT_MQTT_PORT: u16 = 1883;
pub const DEFAULT_MQTT_TLS_PORT: u16 = 8883;
pub const DEFAULT_MQTT_TOPIC: &str = "raillamp/status";
pub const MQTT_KEEP_ALIVE_SECS: u64 = 30;
pub const MQTT_REQUEST_CAPACITY: usize = 10;
pub const MQTT_RECONNECT_DELAY: Duration = Duration::from_secs(5);
pub const DEFAULT_STATUS_HEARTBEAT: u64 = 5; // seconds
pub const MINIMUM_STATUS_HEARTBEAT: u64 = 1;
pub const MAXIMUM_STATUS_HEARTBEAT: u64 = 300;

// # Files
pub const CONFIG_FILE_NAME: &str = "raillamp.toml";
pub const LOCK_FILE_NAME: &str = "raillamp.lock";
pub const STATUS_FILE_NAME: &str = "raillamp-status.json";

// # Exit codes
pub const EXIT_FAILURE: i32 = 1;
