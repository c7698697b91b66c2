//! Live status feed.
//!
//! Publishes `{"lightsOn", "brightness", "motion"}` as a retained message
//! whenever one of the values changes, at least once per heartbeat while
//! nothing changes, and unconditionally right after the link (re)connects.
//! Nothing is published while the link is down; the latest state goes out as
//! soon as it comes back.

use anyhow::Result;
use serde::Serialize;
use std::time::Duration;

use super::event::Snapshot;

/// Link state observed by [`StatusLink::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Down,
    Up,
    /// Connected since the previous poll.
    Reconnected,
}

/// Where the feed goes. `publish` must not block.
pub trait StatusLink {
    fn poll(&mut self) -> LinkState;
    fn publish(&mut self, payload: &str) -> Result<()>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FeedPayload {
    lights_on: bool,
    brightness: u8,
    motion: bool,
}

pub fn feed_payload(snapshot: &Snapshot) -> serde_json::Result<String> {
    serde_json::to_string(&FeedPayload {
        lights_on: snapshot.lights_on,
        brightness: snapshot.brightness,
        motion: snapshot.motion,
    })
}

pub struct StatusFeed {
    heartbeat: Duration,
    last_sent: Option<Snapshot>,
    last_publish: Option<Duration>,
    force_pending: bool,
    connected: bool,
    published: u64,
    failing: bool,
}

impl StatusFeed {
    pub fn new(heartbeat: Duration) -> Self {
        Self {
            heartbeat,
            last_sent: None,
            last_publish: None,
            force_pending: false,
            connected: false,
            published: 0,
            failing: false,
        }
    }

    /// Publish `snapshot` if it is due. Returns whether a message went out.
    pub fn tick(
        &mut self,
        snapshot: Snapshot,
        uptime: Duration,
        link: &mut dyn StatusLink,
    ) -> bool {
        match link.poll() {
            LinkState::Down => {
                self.connected = false;
                return false;
            }
            LinkState::Up => self.connected = true,
            LinkState::Reconnected => {
                self.connected = true;
                self.force_pending = true;
            }
        }

        let changed = self.last_sent != Some(snapshot);
        let heartbeat_due = self
            .last_publish
            .is_none_or(|last| uptime.saturating_sub(last) >= self.heartbeat);
        if !self.force_pending && !changed && !heartbeat_due {
            return false;
        }

        let payload = match feed_payload(&snapshot) {
            Ok(payload) => payload,
            Err(e) => {
                log_warning!("Failed to encode status message: {}", e);
                return false;
            }
        };

        match link.publish(&payload) {
            Ok(()) => {
                if self.failing {
                    log_info!("Status feed recovered");
                    self.failing = false;
                }
                self.last_sent = Some(snapshot);
                self.last_publish = Some(uptime);
                self.force_pending = false;
                self.published += 1;
                true
            }
            Err(e) => {
                if !self.failing {
                    log_warning!("Status feed publish failed: {:#}", e);
                    self.failing = true;
                }
                false
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn published(&self) -> u64 {
        self.published
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingStatusLink;

    const HEARTBEAT: Duration = Duration::from_secs(5);

    fn state(lights_on: bool, brightness: u8, motion: bool) -> Snapshot {
        Snapshot {
            lights_on,
            brightness,
            motion,
        }
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_nothing_is_published_while_down() {
        let mut link = RecordingStatusLink::new();
        let mut feed = StatusFeed::new(HEARTBEAT);

        assert!(!feed.tick(state(true, 10, true), ms(0), &mut link));
        assert!(!feed.tick(state(true, 20, true), ms(10_000), &mut link));
        assert!(link.messages().is_empty());
        assert!(!feed.is_connected());
    }

    #[test]
    fn test_payload_uses_feed_field_names() {
        let value: serde_json::Value =
            serde_json::from_str(&feed_payload(&state(true, 25, false)).unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"lightsOn": true, "brightness": 25, "motion": false})
        );
    }

    #[test]
    fn test_changes_publish_immediately() {
        let mut link = RecordingStatusLink::new();
        link.connect();
        let mut feed = StatusFeed::new(HEARTBEAT);

        assert!(feed.tick(state(false, 0, false), ms(0), &mut link));
        assert!(!feed.tick(state(false, 0, false), ms(50), &mut link));
        assert!(feed.tick(state(true, 0, true), ms(100), &mut link));
        assert!(feed.tick(state(true, 5, true), ms(150), &mut link));

        assert_eq!(link.messages().len(), 3);
        assert_eq!(feed.published(), 3);
    }

    #[test]
    fn test_heartbeat_repeats_unchanged_state() {
        let mut link = RecordingStatusLink::new();
        link.connect();
        let mut feed = StatusFeed::new(HEARTBEAT);
        let idle = state(false, 0, false);

        assert!(feed.tick(idle, ms(0), &mut link));
        assert!(!feed.tick(idle, ms(4_950), &mut link));
        assert!(feed.tick(idle, ms(5_000), &mut link));
        assert!(!feed.tick(idle, ms(9_950), &mut link));
        assert!(feed.tick(idle, ms(10_000), &mut link));
    }

    #[test]
    fn test_reconnect_forces_a_publish() {
        let mut link = RecordingStatusLink::new();
        link.connect();
        let mut feed = StatusFeed::new(HEARTBEAT);
        let idle = state(false, 0, false);

        assert!(feed.tick(idle, ms(0), &mut link));

        link.disconnect();
        assert!(!feed.tick(idle, ms(1_000), &mut link));

        link.connect();
        assert!(feed.tick(idle, ms(1_050), &mut link));
        assert_eq!(link.messages().len(), 2);
    }

    #[test]
    fn test_failed_publish_is_retried() {
        let mut link = RecordingStatusLink::new();
        link.connect();
        link.set_failing(true);
        let mut feed = StatusFeed::new(HEARTBEAT);
        let idle = state(false, 0, false);

        assert!(!feed.tick(idle, ms(0), &mut link));
        assert_eq!(feed.published(), 0);

        link.set_failing(false);
        assert!(feed.tick(idle, ms(50), &mut link));
        assert_eq!(
            link.messages(),
            vec![r#"{"lightsOn":false,"brightness":0,"motion":false}"#.to_string()]
        );
    }
}
