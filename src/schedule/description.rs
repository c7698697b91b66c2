//! Schedule descriptions and their resolution into clock times.
//!
//! The same description arrives either from the schedule endpoint as
//! `{"schedule": {...}}` or from the `[schedule]` table in the config file:
//!
//! ```toml
//! [schedule]
//! start_type = "civil_dusk"
//! end_type = "fixed"
//! end_time = "06:30"
//! enabled = true
//! ```
//!
//! A boundary whose type is `civil_dawn` or `civil_dusk` is anchored to that
//! solar event and its `*_time` is ignored. Any other type means the `*_time`
//! field is a literal `HH:MM` or `HH:MM:SS` clock time.

use chrono::NaiveTime;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use super::solar::SolarTimes;
use super::window::ResolvedWindow;
use crate::error::{FetchStage, LampError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolarAnchor {
    CivilDawn,
    CivilDusk,
}

impl SolarAnchor {
    pub fn from_type(boundary_type: &str) -> Option<Self> {
        match boundary_type {
            "civil_dawn" => Some(SolarAnchor::CivilDawn),
            "civil_dusk" => Some(SolarAnchor::CivilDusk),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDescription {
    #[serde(default, deserialize_with = "lenient_time")]
    pub start_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_time")]
    pub end_time: Option<String>,
    pub start_type: String,
    pub end_type: String,
    pub enabled: bool,
}

#[derive(Deserialize)]
struct ScheduleEnvelope {
    schedule: ScheduleDescription,
}

/// Time fields that are present but not strings count as absent.
fn lenient_time<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Field {
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Option::<Field>::deserialize(deserializer)? {
        Some(Field::Text(text)) => Some(text),
        Some(Field::Other(_)) | None => None,
    })
}

impl ScheduleDescription {
    /// Parse a schedule endpoint response body.
    pub fn from_response(body: &str) -> Result<Self, LampError> {
        serde_json::from_str::<ScheduleEnvelope>(body)
            .map(|envelope| envelope.schedule)
            .map_err(|e| LampError::fetch(FetchStage::ScheduleParse, e.to_string()))
    }

    pub fn start_anchor(&self) -> Option<SolarAnchor> {
        SolarAnchor::from_type(&self.start_type)
    }

    pub fn end_anchor(&self) -> Option<SolarAnchor> {
        SolarAnchor::from_type(&self.end_type)
    }

    /// Whether resolving this description requires solar event times.
    pub fn needs_solar(&self) -> bool {
        self.start_anchor().is_some() || self.end_anchor().is_some()
    }

    /// Substitute solar anchors and parse literal times.
    ///
    /// Fails with [`FetchStage::TimeMissing`] unless both boundaries end up as
    /// well-formed clock times.
    pub fn resolve(&self, solar: Option<&SolarTimes>) -> Result<ResolvedWindow, LampError> {
        let start = resolve_boundary(self.start_anchor(), self.start_time.as_deref(), solar)
            .ok_or_else(|| LampError::fetch(FetchStage::TimeMissing, "start boundary"))?;
        let end = resolve_boundary(self.end_anchor(), self.end_time.as_deref(), solar)
            .ok_or_else(|| LampError::fetch(FetchStage::TimeMissing, "end boundary"))?;

        Ok(ResolvedWindow {
            start,
            end,
            start_type: self.start_type.clone(),
            end_type: self.end_type.clone(),
            enabled: self.enabled,
        })
    }
}

fn resolve_boundary(
    anchor: Option<SolarAnchor>,
    literal: Option<&str>,
    solar: Option<&SolarTimes>,
) -> Option<NaiveTime> {
    match anchor {
        Some(anchor) => solar.map(|times| times.time_of(anchor)),
        None => literal.and_then(parse_clock_time),
    }
}

/// Parse `HH:MM` or `HH:MM:SS`.
pub fn parse_clock_time(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    NaiveTime::parse_from_str(text, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .ok()
}
