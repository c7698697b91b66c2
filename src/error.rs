//! Domain error taxonomy.
//!
//! None of these are fatal to the control loop. Each is absorbed where it
//! happens and surfaces as a lifecycle event, a log line or a distinct state.
//! Startup and CLI paths use `anyhow` instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LampError {
    /// The wall clock has not been synchronised yet.
    #[error("wall clock is not synchronised")]
    ClockUnsynced,

    /// A schedule or solar-time lookup failed. The cached window is kept.
    #[error("schedule fetch failed at {stage}: {detail}")]
    FetchFailed { stage: FetchStage, detail: String },

    /// An event delivery attempt failed. The head record is kept.
    #[error("event delivery failed: {0}")]
    DeliveryFailed(#[from] TransportError),

    /// The event queue was full and evicted its oldest record.
    #[error("event queue full, oldest record dropped")]
    QueueOverflow,
}

impl LampError {
    pub fn fetch(stage: FetchStage, detail: impl Into<String>) -> Self {
        LampError::FetchFailed {
            stage,
            detail: detail.into(),
        }
    }

    pub fn fetch_stage(&self) -> Option<FetchStage> {
        match self {
            LampError::FetchFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Where in the schedule pipeline a fetch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    ScheduleHttp,
    ScheduleParse,
    TwilightHttp,
    TwilightParse,
    TimeMissing,
    TwilightUnavailable,
}

impl FetchStage {
    /// The detail string carried by `schedule_error` events.
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchStage::ScheduleHttp => "schedule_http",
            FetchStage::ScheduleParse => "schedule_parse",
            FetchStage::TwilightHttp => "twilight_http",
            FetchStage::TwilightParse => "twilight_parse",
            FetchStage::TimeMissing => "time_missing",
            FetchStage::TwilightUnavailable => "twilight_unavailable",
        }
    }
}

impl std::fmt::Display for FetchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("network unavailable")]
    Offline,

    #[error("request timed out")]
    Timeout,

    #[error("request failed: {0}")]
    Http(String),

    #[error("unexpected status {0}")]
    Status(u16),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_message_names_stage() {
        let err = LampError::fetch(FetchStage::TwilightParse, "missing civil_dusk");
        assert_eq!(
            err.to_string(),
            "schedule fetch failed at twilight_parse: missing civil_dusk"
        );
    }

    #[test]
    fn test_delivery_error_from_transport() {
        let err: LampError = TransportError::Status(503).into();
        assert!(matches!(err, LampError::DeliveryFailed(TransportError::Status(503))));
        assert_eq!(err.to_string(), "event delivery failed: unexpected status 503");
    }
}
