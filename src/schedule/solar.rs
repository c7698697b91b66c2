//! Civil dawn and dusk for the current day.
//!
//! Either fetched from a twilight endpoint returning
//! `{"civil_dawn": "HH:MM", "civil_dusk": "HH:MM"}`, or computed locally from
//! configured coordinates with the `sunrise` crate.

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use sunrise::{Coordinates, DawnType, SolarDay, SolarEvent};

use super::description::{SolarAnchor, parse_clock_time};
use crate::error::{FetchStage, LampError};
use crate::time_source::LocalZone;

/// Where solar times come from.
#[derive(Debug, Clone, PartialEq)]
pub enum SolarSource {
    Remote(String),
    Local { latitude: f64, longitude: f64 },
    /// Neither an endpoint nor coordinates are configured.
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolarTimes {
    pub civil_dawn: NaiveTime,
    pub civil_dusk: NaiveTime,
}

#[derive(Deserialize)]
struct TwilightResponse {
    civil_dawn: String,
    civil_dusk: String,
}

impl SolarTimes {
    pub fn time_of(&self, anchor: SolarAnchor) -> NaiveTime {
        match anchor {
            SolarAnchor::CivilDawn => self.civil_dawn,
            SolarAnchor::CivilDusk => self.civil_dusk,
        }
    }

    /// Parse a twilight endpoint response body.
    pub fn from_response(body: &str) -> Result<Self, LampError> {
        let parsed: TwilightResponse = serde_json::from_str(body)
            .map_err(|e| LampError::fetch(FetchStage::TwilightParse, e.to_string()))?;

        let parse = |field: &str, value: &str| {
            parse_clock_time(value).ok_or_else(|| {
                LampError::fetch(FetchStage::TwilightParse, format!("{field}: '{value}'"))
            })
        };

        Ok(SolarTimes {
            civil_dawn: parse("civil_dawn", &parsed.civil_dawn)?,
            civil_dusk: parse("civil_dusk", &parsed.civil_dusk)?,
        })
    }

    /// Compute civil twilight for `date` at the given coordinates, expressed
    /// as local clock times in `zone`.
    pub fn compute(latitude: f64, longitude: f64, date: NaiveDate, zone: &LocalZone) -> Option<Self> {
        let coordinates = Coordinates::new(latitude, longitude)?;
        let solar_day = SolarDay::new(coordinates, date);

        let dawn_utc = solar_day.event_time(SolarEvent::Dawn(DawnType::Civil));
        let dusk_utc = solar_day.event_time(SolarEvent::Dusk(DawnType::Civil));

        Some(SolarTimes {
            civil_dawn: zone.localize(dawn_utc).time(),
            civil_dusk: zone.localize(dusk_utc).time(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_twilight_response() {
        let times =
            SolarTimes::from_response(r#"{"civil_dawn":"05:12","civil_dusk":"21:48:30"}"#).unwrap();
        assert_eq!(times.civil_dawn, NaiveTime::from_hms_opt(5, 12, 0).unwrap());
        assert_eq!(times.civil_dusk, NaiveTime::from_hms_opt(21, 48, 30).unwrap());
        assert_eq!(times.time_of(SolarAnchor::CivilDusk), times.civil_dusk);
    }

    #[test]
    fn test_twilight_parse_failures() {
        let cases = [
            "",
            r#"{"civil_dawn":"05:12"}"#,
            r#"{"civil_dawn":512,"civil_dusk":"21:48"}"#,
            r#"{"civil_dawn":"dawn","civil_dusk":"21:48"}"#,
        ];

        for body in cases {
            let err = SolarTimes::from_response(body).unwrap_err();
            assert!(
                matches!(
                    err,
                    LampError::FetchFailed {
                        stage: FetchStage::TwilightParse,
                        ..
                    }
                ),
                "expected twilight_parse for {body:?}"
            );
        }
    }

    #[test]
    fn test_compute_berlin_midsummer() {
        let zone = LocalZone::Named(chrono_tz::Europe::Berlin);
        let date = NaiveDate::from_ymd_opt(2025, 6, 21).unwrap();
        let times = SolarTimes::compute(52.52, 13.405, date, &zone).unwrap();

        // Civil dawn around 03:50, civil dusk around 22:15 (CEST)
        assert!((3..=4).contains(&times.civil_dawn.hour()));
        assert!((21..=22).contains(&times.civil_dusk.hour()));
        assert!(times.civil_dawn < times.civil_dusk);
    }

    #[test]
    fn test_compute_rejects_invalid_coordinates() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 21).unwrap();
        assert!(SolarTimes::compute(123.0, 13.0, date, &LocalZone::System).is_none());
    }
}
