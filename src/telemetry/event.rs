use chrono::{DateTime, Utc};
use serde::Serialize;

/// Light and motion state at the moment an event was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub lights_on: bool,
    pub brightness: u8,
    pub motion: bool,
}

/// A queued lifecycle event. Immutable once enqueued.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    /// Assigned by the queue, strictly increasing.
    pub seq: u64,
    pub event: String,
    pub snapshot: Snapshot,
    pub message: Option<String>,
    /// Emission time, only when the wall clock was synchronised.
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct Payload<'a> {
    event: &'a str,
    #[serde(flatten)]
    snapshot: &'a Snapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
}

impl EventRecord {
    /// JSON body for the collector.
    pub fn payload(&self) -> serde_json::Result<String> {
        serde_json::to_string(&Payload {
            event: &self.event,
            snapshot: &self.snapshot,
            message: self.message.as_deref(),
            timestamp: self.timestamp.map(|ts| ts.to_rfc3339()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(message: Option<&str>) -> EventRecord {
        EventRecord {
            seq: 7,
            event: "light_on".to_string(),
            snapshot: Snapshot {
                lights_on: true,
                brightness: 0,
                motion: true,
            },
            message: message.map(str::to_string),
            timestamp: None,
        }
    }

    #[test]
    fn test_payload_without_message() {
        let value: serde_json::Value = serde_json::from_str(&record(None).payload().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "event": "light_on",
                "lights_on": true,
                "brightness": 0,
                "motion": true
            })
        );
    }

    #[test]
    fn test_payload_with_message_and_timestamp() {
        let mut record = record(Some("schedule_http"));
        record.timestamp = Some(Utc.with_ymd_and_hms(2025, 11, 3, 22, 0, 0).unwrap());

        let value: serde_json::Value = serde_json::from_str(&record.payload().unwrap()).unwrap();
        assert_eq!(value["message"], "schedule_http");
        assert_eq!(value["timestamp"], "2025-11-03T22:00:00+00:00");
        assert!(value.get("seq").is_none());
    }
}
