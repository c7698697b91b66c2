//! Daemon status snapshot, shared with `raillamp status` through a JSON file in
//! the runtime directory.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::STATUS_FILE_NAME;
use crate::light::Rgb;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub pid: u32,
    pub version: String,
    /// Wall-clock time of the snapshot, absent while unsynchronised.
    pub updated_at: Option<DateTime<Utc>>,
    pub clock_synchronized: bool,
    pub network_up: bool,
    pub light: LightStatus,
    pub motion: MotionStatus,
    pub window: WindowStatus,
    pub arm: ArmStatus,
    pub events: EventStatus,
    pub feed: FeedStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightStatus {
    pub phase: String,
    pub brightness: u8,
    pub max_brightness: u8,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionStatus {
    pub present: bool,
    pub timeout_secs: u64,
    pub inputs: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowStatus {
    pub state: String,
    pub loaded: bool,
    pub fetching: bool,
    /// `Start: HH:MM (type), End: HH:MM (type)` once loaded.
    pub bounds: Option<String>,
    pub enabled: Option<bool>,
    pub timezone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmStatus {
    pub active: bool,
    /// Local expiry as `YYYY-MM-DD HH:MM`.
    pub expires: Option<String>,
    pub remaining_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventStatus {
    pub endpoint_configured: bool,
    pub queued: usize,
    pub capacity: usize,
    pub dropped: u64,
    pub delivered: u64,
    pub consecutive_failures: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedStatus {
    pub configured: bool,
    pub connected: bool,
    pub published: u64,
}

/// `$XDG_RUNTIME_DIR/raillamp-status.json`, falling back to `/tmp`.
pub fn status_path() -> PathBuf {
    crate::io::lock::runtime_dir().join(STATUS_FILE_NAME)
}

/// Replace the status file atomically so readers never see a partial write.
pub fn write_status(path: &Path, snapshot: &StatusSnapshot) -> Result<()> {
    let json = serde_json::to_string_pretty(snapshot).context("Failed to serialize status")?;
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, json)
        .with_context(|| format!("Failed to write {}", temp_path.display()))?;
    fs::rename(&temp_path, path).with_context(|| format!("Failed to replace {}", path.display()))
}

pub fn read_status(path: &Path) -> Result<StatusSnapshot> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Malformed status in {}", path.display()))
}

pub fn remove_status(path: &Path) {
    let _ = fs::remove_file(path);
}

#[cfg(test)]
pub(crate) fn sample_snapshot() -> StatusSnapshot {
    StatusSnapshot {
        pid: 4242,
        version: "0.3.0".to_string(),
        updated_at: None,
        clock_synchronized: false,
        network_up: true,
        light: LightStatus {
            phase: "fading_in".to_string(),
            brightness: 15,
            max_brightness: 30,
            color: Rgb::new(255, 140, 60),
        },
        motion: MotionStatus {
            present: true,
            timeout_secs: 30,
            inputs: 1,
        },
        window: WindowStatus {
            state: "unknown".to_string(),
            loaded: false,
            fetching: false,
            bounds: None,
            enabled: None,
            timezone: "system".to_string(),
        },
        arm: ArmStatus {
            active: false,
            expires: None,
            remaining_minutes: 0,
        },
        events: EventStatus {
            endpoint_configured: false,
            queued: 2,
            capacity: 32,
            dropped: 0,
            delivered: 0,
            consecutive_failures: 0,
        },
        feed: FeedStatus {
            configured: false,
            connected: false,
            published: 0,
        },
    }
}
