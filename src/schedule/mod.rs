//! When motion is allowed to turn the light on.
//!
//! Two inputs decide: the daily access window (fetched, possibly anchored to
//! civil dawn or dusk) and the manual arm override. The override wins while it
//! is active.

pub mod arm;
pub mod description;
pub mod resolver;
pub mod solar;
pub mod window;

pub use arm::ArmOverride;
pub use description::{ScheduleDescription, SolarAnchor, parse_clock_time};
pub use resolver::{FetchContext, ResolverEvent, ResolverSettings, ScheduleSource, WindowResolver};
pub use solar::{SolarSource, SolarTimes};
pub use window::{EqualBoundsPolicy, ResolvedWindow, UnsyncedPolicy, WindowState, is_within_window};

/// Combined reactivity policy: an active override, or a window that permits.
pub fn should_react(arm_active: bool, window: WindowState, unsynced: UnsyncedPolicy) -> bool {
    arm_active || unsynced.permits(window)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arm_bypasses_window() {
        assert!(should_react(true, WindowState::Blocked, UnsyncedPolicy::Block));
        assert!(should_react(true, WindowState::Unknown, UnsyncedPolicy::Block));
    }

    #[test]
    fn test_window_decides_when_unarmed() {
        assert!(should_react(false, WindowState::Allowed, UnsyncedPolicy::Block));
        assert!(!should_react(false, WindowState::Blocked, UnsyncedPolicy::Allow));
        assert!(!should_react(false, WindowState::Unknown, UnsyncedPolicy::Block));
        assert!(should_react(false, WindowState::Unknown, UnsyncedPolicy::Allow));
    }
}
