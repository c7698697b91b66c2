//! Manual override ("arming").
//!
//! While armed, motion is acted on regardless of the access window. The
//! override is an absolute wall-clock expiry, so it needs a synchronised clock
//! to be set at all. Expiry is lazy: the first query at or after the expiry
//! clears it.

use chrono::{DateTime, Duration, Utc};

use crate::constants::{MAXIMUM_ARM_HOURS, MINIMUM_ARM_HOURS};
use crate::error::LampError;
use crate::time_source::{LocalZone, is_synchronized};

#[derive(Debug, Default)]
pub struct ArmOverride {
    expiry: Option<DateTime<Utc>>,
}

impl ArmOverride {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm for a number of hours, clamped to 1–24. Returns the new expiry.
    pub fn arm_for(&mut self, hours: u32, now: DateTime<Utc>) -> Result<DateTime<Utc>, LampError> {
        if !is_synchronized(now) {
            return Err(LampError::ClockUnsynced);
        }

        let hours = hours.clamp(MINIMUM_ARM_HOURS, MAXIMUM_ARM_HOURS);
        let expiry = now + Duration::hours(hours as i64);
        self.expiry = Some(expiry);
        Ok(expiry)
    }

    /// Arm until the next local midnight. Returns the new expiry.
    pub fn arm_until_end_of_local_day(
        &mut self,
        now: DateTime<Utc>,
        zone: &LocalZone,
    ) -> Result<DateTime<Utc>, LampError> {
        if !is_synchronized(now) {
            return Err(LampError::ClockUnsynced);
        }

        let expiry = zone.next_midnight(now);
        self.expiry = Some(expiry);
        Ok(expiry)
    }

    /// Clear the override. Returns whether it was set.
    pub fn disarm(&mut self) -> bool {
        self.expiry.take().is_some()
    }

    /// Apply lazy expiry. Returns `true` only on the call that clears an
    /// expired override.
    pub fn refresh(&mut self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) if now >= expiry => {
                self.expiry = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_active(&mut self, now: DateTime<Utc>) -> bool {
        self.refresh(now);
        self.expiry.is_some()
    }

    /// Whole minutes until expiry, rounded down. Zero when inactive.
    pub fn remaining_minutes(&mut self, now: DateTime<Utc>) -> i64 {
        if !self.is_active(now) {
            return 0;
        }
        self.expiry
            .map(|expiry| (expiry - now).num_minutes().max(0))
            .unwrap_or(0)
    }

    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.expiry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn synced_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 3, 18, 0, 0).unwrap()
    }

    #[test]
    fn test_arm_for_two_hours_counts_down() {
        let now = synced_now();
        let mut arm = ArmOverride::new();
        arm.arm_for(2, now).unwrap();

        assert!(arm.is_active(now));
        assert_eq!(arm.remaining_minutes(now + Duration::minutes(61)), 59);

        let later = now + Duration::minutes(121);
        assert!(!arm.is_active(later));
        assert_eq!(arm.remaining_minutes(later), 0);
        assert_eq!(arm.expiry(), None);
    }

    #[test]
    fn test_remaining_minutes_rounds_down() {
        let now = synced_now();
        let mut arm = ArmOverride::new();
        arm.arm_for(1, now).unwrap();

        assert_eq!(arm.remaining_minutes(now + Duration::seconds(30)), 59);
        assert_eq!(arm.remaining_minutes(now + Duration::seconds(3599)), 0);
        assert!(arm.is_active(now + Duration::seconds(3599)));
    }

    #[test]
    fn test_expires_exactly_at_expiry() {
        let now = synced_now();
        let mut arm = ArmOverride::new();
        let expiry = arm.arm_for(1, now).unwrap();

        assert!(arm.refresh(expiry));
        assert!(!arm.refresh(expiry));
    }

    #[test]
    fn test_arming_requires_synced_clock() {
        let unsynced = DateTime::<Utc>::UNIX_EPOCH + Duration::minutes(5);
        let mut arm = ArmOverride::new();

        assert!(matches!(arm.arm_for(2, unsynced), Err(LampError::ClockUnsynced)));
        assert!(matches!(
            arm.arm_until_end_of_local_day(unsynced, &LocalZone::System),
            Err(LampError::ClockUnsynced)
        ));
        assert!(!arm.is_active(unsynced));
    }

    #[test]
    fn test_hours_are_clamped() {
        let now = synced_now();
        let mut arm = ArmOverride::new();

        assert_eq!(arm.arm_for(0, now).unwrap(), now + Duration::hours(1));
        assert_eq!(arm.arm_for(100, now).unwrap(), now + Duration::hours(24));
    }

    #[test]
    fn test_arm_until_end_of_local_day() {
        let zone = LocalZone::Named(chrono_tz::Europe::Berlin);
        // 19:00 local (CET)
        let now = synced_now();
        let mut arm = ArmOverride::new();

        let expiry = arm.arm_until_end_of_local_day(now, &zone).unwrap();
        assert_eq!(expiry, Utc.with_ymd_and_hms(2025, 11, 3, 23, 0, 0).unwrap());
        assert_eq!(arm.remaining_minutes(now), 300);
    }

    #[test]
    fn test_disarm_clears_unconditionally() {
        let now = synced_now();
        let mut arm = ArmOverride::new();

        assert!(!arm.disarm());
        arm.arm_for(3, now).unwrap();
        assert!(arm.disarm());
        assert!(!arm.is_active(now));
    }
}
