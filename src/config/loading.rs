//! Locating, reading and normalising the configuration file.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::Config;
use super::validation::validate_config;
use crate::constants::*;

/// Custom configuration directory from `--config`, set once at startup.
static CONFIG_DIR: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Set the configuration directory for the lifetime of the process.
///
/// Fails if it has already been set.
pub fn set_config_dir(dir: Option<String>) -> Result<()> {
    CONFIG_DIR
        .set(dir.map(PathBuf::from))
        .map_err(|_| anyhow::anyhow!("Configuration directory already set"))
}

pub fn get_custom_config_dir() -> Option<PathBuf> {
    CONFIG_DIR.get().and_then(|d| d.clone())
}

/// Path of `raillamp.toml`, honouring a custom directory.
pub fn get_config_path() -> Result<PathBuf> {
    if let Some(custom_dir) = get_custom_config_dir() {
        return Ok(custom_dir.join(CONFIG_FILE_NAME));
    }

    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join("raillamp").join(CONFIG_FILE_NAME))
}

/// Replace the home directory prefix with `~` for display.
pub fn private_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(rest) = path.strip_prefix(&home)
    {
        return format!("~/{}", rest.display());
    }
    path.display().to_string()
}

/// Load the configuration, creating a commented default file on first run.
pub fn load() -> Result<Config> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        super::builder::create_default_config(&config_path)
            .context("Failed to create default config during load")?;
        log_block_start!(
            "Created default configuration at {}",
            private_path(&config_path)
        );
    }

    load_from_path(&config_path).with_context(|| {
        format!(
            "Failed to load configuration from {}",
            private_path(&config_path)
        )
    })
}

/// Read, validate and complete a configuration file.
pub fn load_from_path(path: &PathBuf) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!("Configuration file not found: {}", private_path(path));
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", private_path(path)))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", private_path(path)))?;

    validate_config(&config)?;
    apply_defaults(&mut config);

    Ok(config)
}

/// Fill every field that has a default. Runs after validation.
pub(crate) fn apply_defaults(config: &mut Config) {
    config.tick_interval_ms.get_or_insert(DEFAULT_TICK_INTERVAL_MS);
    config.motion_timeout.get_or_insert(DEFAULT_MOTION_TIMEOUT);
    config.motion_inputs.get_or_insert_with(Vec::new);

    config.max_brightness.get_or_insert(DEFAULT_MAX_BRIGHTNESS);
    config.fade_step.get_or_insert(DEFAULT_FADE_STEP);
    config
        .fade_step_interval_ms
        .get_or_insert(DEFAULT_FADE_STEP_INTERVAL_MS);
    config.color.get_or_insert(DEFAULT_COLOR);

    config
        .schedule_retry_interval
        .get_or_insert(DEFAULT_SCHEDULE_RETRY_INTERVAL);
    config
        .schedule_eval_interval
        .get_or_insert(DEFAULT_SCHEDULE_EVAL_INTERVAL);
    config
        .schedule_refresh_hour
        .get_or_insert(DEFAULT_SCHEDULE_REFRESH_HOUR);
    config.http_timeout.get_or_insert(DEFAULT_HTTP_TIMEOUT);
    config.unsynced_policy.get_or_insert_with(Default::default);
    config.equal_bounds.get_or_insert_with(Default::default);

    config
        .event_queue_capacity
        .get_or_insert(DEFAULT_EVENT_QUEUE_CAPACITY);
    config
        .event_min_interval_ms
        .get_or_insert(DEFAULT_EVENT_MIN_INTERVAL_MS);

    config.status_interval.get_or_insert(DEFAULT_STATUS_INTERVAL);

    let tls = *config.mqtt_tls.get_or_insert(false);
    config.mqtt_port.get_or_insert(if tls {
        DEFAULT_MQTT_TLS_PORT
    } else {
        DEFAULT_MQTT_PORT
    });
    config
        .mqtt_topic
        .get_or_insert_with(|| DEFAULT_MQTT_TOPIC.to_string());
    config.status_heartbeat.get_or_insert(DEFAULT_STATUS_HEARTBEAT);
}
