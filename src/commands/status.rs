//! `raillamp status`: print the running daemon's last status snapshot.

use anyhow::Result;
use chrono::Utc;

use crate::io::instance;
use crate::status::{self, StatusSnapshot};

/// Snapshots older than this are flagged as stale.
const STALE_AFTER_SECS: i64 = 120;

pub fn handle_status_command(json: bool) -> Result<()> {
    let Some(running) = instance::get_running_instance()? else {
        log_version!();
        log_pipe!();
        log_error!("No raillamp instance running");
        log_indented!("Start it with 'raillamp' or 'raillamp --debug'");
        log_end!();
        return Ok(());
    };

    let snapshot = status::read_status(&status::status_path())?;
    if snapshot.pid != running.pid {
        anyhow::bail!(
            "Status file belongs to PID {}, but PID {} holds the lock",
            snapshot.pid,
            running.pid
        );
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        display_human_readable(&snapshot);
    }
    Ok(())
}

fn display_human_readable(snapshot: &StatusSnapshot) {
    log_version!();
    log_block_start!("Daemon PID {} (v{})", snapshot.pid, snapshot.version);

    match snapshot.updated_at {
        Some(at) => {
            let age = (Utc::now() - at).num_seconds();
            log_indented!("Updated {}s ago", age.max(0));
            if age > STALE_AFTER_SECS {
                log_pipe!();
                log_warning!("Status is stale; the daemon may be stuck");
            }
        }
        None => log_indented!("Clock not synchronised"),
    }
    log_indented!("Network: {}", if snapshot.network_up { "up" } else { "down" });

    let light = &snapshot.light;
    log_block_start!("Light: {}", light.phase);
    log_indented!("Brightness: {}/{}", light.brightness, light.max_brightness);
    log_indented!("Color: {}", light.color);

    let motion = &snapshot.motion;
    log_block_start!(
        "Motion: {}",
        if motion.present { "present" } else { "none" }
    );
    log_indented!("Timeout: {}s across {} input(s)", motion.timeout_secs, motion.inputs);

    let window = &snapshot.window;
    log_block_start!("Window: {}", window.state);
    match window.bounds {
        Some(ref bounds) => log_indented!("{}", bounds),
        None if window.fetching => log_indented!("Fetching schedule..."),
        None => log_indented!("No schedule loaded"),
    }
    if window.enabled == Some(false) {
        log_indented!("Schedule disabled");
    }
    log_indented!("Timezone: {}", window.timezone);

    let arm = &snapshot.arm;
    if arm.active {
        log_block_start!("Armed");
        if let Some(ref expires) = arm.expires {
            log_indented!("Until {} ({} min left)", expires, arm.remaining_minutes);
        }
    } else {
        log_block_start!("Not armed");
    }

    let events = &snapshot.events;
    if events.endpoint_configured {
        log_block_start!("Events: {}/{} queued", events.queued, events.capacity);
        log_indented!(
            "Delivered {}, dropped {}",
            events.delivered,
            events.dropped
        );
        if events.consecutive_failures > 0 {
            log_indented!("{} consecutive delivery failures", events.consecutive_failures);
        }
    } else {
        log_block_start!("Events: no endpoint configured");
    }

    let feed = &snapshot.feed;
    if feed.configured {
        log_block_start!(
            "Status feed: {}",
            if feed.connected { "connected" } else { "disconnected" }
        );
        log_indented!("{} messages published", feed.published);
    }
    log_end!();
}
