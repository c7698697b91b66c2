//! Time source abstraction: wall clock, monotonic uptime and local-time zone.
//!
//! The controller needs two different clocks. Fades, retry intervals and
//! delivery pacing run on monotonic uptime, which never jumps. Schedule
//! evaluation and arming use the wall clock, which starts out wrong on a device
//! without a battery-backed RTC and only becomes trustworthy after NTP has done
//! its job. [`is_synchronized`] is the single place that decides when that is.
//!
//! Components never read the clock themselves; the controller reads one
//! [`TimeSource`] per tick and hands the readings down.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::time::{Duration, Instant};

use crate::constants::MIN_SYNCED_EPOCH_SECS;

/// Trait for abstracting time operations.
pub trait TimeSource {
    /// Current wall-clock time. May be far in the past before synchronisation.
    fn now(&self) -> DateTime<Utc>;

    /// Monotonic time since the source was created.
    fn uptime(&self) -> Duration;
}

/// Whether a wall-clock reading looks like real, synchronised time.
pub fn is_synchronized(now: DateTime<Utc>) -> bool {
    now.timestamp() >= MIN_SYNCED_EPOCH_SECS
}

/// Real-time implementation backed by the system clock.
pub struct RealTimeSource {
    boot: Instant,
}

impl RealTimeSource {
    pub fn new() -> Self {
        Self {
            boot: Instant::now(),
        }
    }
}

impl Default for RealTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn uptime(&self) -> Duration {
        self.boot.elapsed()
    }
}

/// The zone used to turn wall-clock instants into local clock times.
///
/// DST is handled by the zone database, so "22:00" always means 22:00 on the
/// wall regardless of the season.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocalZone {
    /// The host's configured local zone.
    System,
    /// An explicit IANA zone from the configuration.
    Named(Tz),
}

impl LocalZone {
    /// Parse an optional IANA zone name; `None` selects the system zone.
    pub fn from_config(name: Option<&str>) -> Result<Self> {
        match name {
            None => Ok(LocalZone::System),
            Some(name) => name
                .parse::<Tz>()
                .map(LocalZone::Named)
                .map_err(|e| anyhow::anyhow!("{e}"))
                .with_context(|| format!("Unknown timezone '{name}'")),
        }
    }

    /// Convert a UTC instant into naive local date and time.
    pub fn localize(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        match self {
            LocalZone::System => instant.with_timezone(&Local).naive_local(),
            LocalZone::Named(tz) => instant.with_timezone(tz).naive_local(),
        }
    }

    /// Convert a naive local date and time back to UTC.
    ///
    /// Ambiguous times (DST fall-back) resolve to the earlier instant; times
    /// inside a DST gap are shifted forward by an hour.
    pub fn to_utc(&self, local: NaiveDateTime) -> DateTime<Utc> {
        let resolved = match self {
            LocalZone::System => Local
                .from_local_datetime(&local)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
            LocalZone::Named(tz) => tz
                .from_local_datetime(&local)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
        };

        resolved.unwrap_or_else(|| self.to_utc_after_gap(local))
    }

    fn to_utc_after_gap(&self, local: NaiveDateTime) -> DateTime<Utc> {
        let shifted = local + ChronoDuration::hours(1);
        match self {
            LocalZone::System => Local
                .from_local_datetime(&shifted)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
            LocalZone::Named(tz) => tz
                .from_local_datetime(&shifted)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
        }
        .unwrap_or_else(|| Utc.from_utc_datetime(&local))
    }

    /// The first instant of the next local calendar day after `instant`.
    pub fn next_midnight(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        let local = self.localize(instant);
        let tomorrow = local
            .date()
            .succ_opt()
            .unwrap_or(local.date())
            .and_hms_opt(0, 0, 0)
            .unwrap_or(local);
        self.to_utc(tomorrow)
    }

    pub fn describe(&self) -> String {
        match self {
            LocalZone::System => "system".to_string(),
            LocalZone::Named(tz) => tz.to_string(),
        }
    }
}

/// A manually driven clock for tests and dry runs.
///
/// Clones share the same underlying time, so a test can keep a handle after
/// moving the source into a controller.
#[cfg(any(test, feature = "testing-support"))]
#[derive(Clone)]
pub struct ManualTimeSource {
    inner: std::rc::Rc<ManualInner>,
}

#[cfg(any(test, feature = "testing-support"))]
struct ManualInner {
    now: std::cell::Cell<DateTime<Utc>>,
    uptime: std::cell::Cell<Duration>,
}

#[cfg(any(test, feature = "testing-support"))]
impl ManualTimeSource {
    /// Start at the given wall-clock time with zero uptime.
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            inner: std::rc::Rc::new(ManualInner {
                now: std::cell::Cell::new(now),
                uptime: std::cell::Cell::new(Duration::ZERO),
            }),
        }
    }

    /// A clock that has never been synchronised (reads 1970).
    pub fn unsynchronized() -> Self {
        Self::starting_at(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// Advance both wall clock and uptime.
    pub fn advance(&self, by: Duration) {
        self.inner.uptime.set(self.inner.uptime.get() + by);
        let step = ChronoDuration::from_std(by).unwrap_or(ChronoDuration::zero());
        self.inner.now.set(self.inner.now.get() + step);
    }

    /// Jump the wall clock only, as an NTP sync would.
    pub fn set_now(&self, now: DateTime<Utc>) {
        self.inner.now.set(now);
    }
}

#[cfg(any(test, feature = "testing-support"))]
impl TimeSource for ManualTimeSource {
    fn now(&self) -> DateTime<Utc> {
        self.inner.now.get()
    }

    fn uptime(&self) -> Duration {
        self.inner.uptime.get()
    }
}
