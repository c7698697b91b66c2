use chrono::NaiveTime;
use proptest::prelude::*;
use std::time::Duration;

use raillamp::constants::DEFAULT_COLOR;
use raillamp::light::FadeController;
use raillamp::schedule::{EqualBoundsPolicy, is_within_window};

fn clock_time() -> impl Strategy<Value = NaiveTime> {
    (0u32..24, 0u32..60).prop_map(|(h, m)| NaiveTime::from_hms_opt(h, m, 0).unwrap())
}

/// Property tests for the access window
#[cfg(test)]
mod window_math_tests {
    use super::*;

    proptest! {
        /// A window and its complement partition the day
        #[test]
        fn test_window_and_complement_partition_the_day(
            start in clock_time(),
            end in clock_time(),
            now in clock_time()
        ) {
            prop_assume!(start != end);
            let inside = is_within_window(start, end, now, EqualBoundsPolicy::AlwaysOn);
            let outside = is_within_window(end, start, now, EqualBoundsPolicy::AlwaysOn);
            prop_assert!(inside != outside);
        }

        /// The start minute is inside, the end minute is not
        #[test]
        fn test_bounds_are_half_open(start in clock_time(), end in clock_time()) {
            prop_assume!(start != end);
            prop_assert!(is_within_window(start, end, start, EqualBoundsPolicy::AlwaysOn));
            prop_assert!(!is_within_window(start, end, end, EqualBoundsPolicy::AlwaysOn));
        }

        /// Equal bounds follow the policy regardless of the time
        #[test]
        fn test_equal_bounds_follow_policy(bound in clock_time(), now in clock_time()) {
            prop_assert!(is_within_window(bound, bound, now, EqualBoundsPolicy::AlwaysOn));
            prop_assert!(!is_within_window(bound, bound, now, EqualBoundsPolicy::AlwaysOff));
        }

        /// Seconds never change the answer
        #[test]
        fn test_minute_granularity(
            start in clock_time(),
            end in clock_time(),
            now in clock_time(),
            seconds in 0u32..60
        ) {
            let with_seconds = NaiveTime::from_hms_opt(
                chrono::Timelike::hour(&now),
                chrono::Timelike::minute(&now),
                seconds,
            ).unwrap();
            prop_assert_eq!(
                is_within_window(start, end, now, EqualBoundsPolicy::AlwaysOn),
                is_within_window(start, end, with_seconds, EqualBoundsPolicy::AlwaysOn)
            );
        }
    }
}

#[derive(Debug, Clone)]
enum FadeOp {
    In,
    Out,
    Tick(u64),
    SetMax(u8),
}

fn fade_op() -> impl Strategy<Value = FadeOp> {
    prop_oneof![
        Just(FadeOp::In),
        Just(FadeOp::Out),
        (1u64..200).prop_map(FadeOp::Tick),
        any::<u8>().prop_map(FadeOp::SetMax),
    ]
}

/// Property tests for the fade controller
#[cfg(test)]
mod fade_bound_tests {
    use super::*;

    proptest! {
        /// Brightness never exceeds the current maximum, whatever the sequence
        #[test]
        fn test_brightness_stays_within_max(
            initial_max in any::<u8>(),
            step in 1u8..=64,
            ops in prop::collection::vec(fade_op(), 0..200)
        ) {
            let mut fade = FadeController::new(
                initial_max,
                step,
                Duration::from_millis(30),
                DEFAULT_COLOR,
            );
            let mut uptime = Duration::ZERO;

            for op in ops {
                match op {
                    FadeOp::In => { fade.start_fade_in(); }
                    FadeOp::Out => { fade.start_fade_out(); }
                    FadeOp::Tick(ms) => {
                        uptime += Duration::from_millis(ms);
                        fade.tick(uptime);
                    }
                    FadeOp::SetMax(max) => fade.set_max_brightness(max),
                }
                prop_assert!(fade.brightness() <= fade.max_brightness());
            }
        }

        /// Starting a fade-in twice is the same as starting it once
        #[test]
        fn test_fade_in_is_idempotent(ticks in 1usize..40) {
            let mut once = FadeController::new(30, 5, Duration::from_millis(30), DEFAULT_COLOR);
            let mut twice = FadeController::new(30, 5, Duration::from_millis(30), DEFAULT_COLOR);
            once.start_fade_in();
            twice.start_fade_in();
            twice.start_fade_in();

            for i in 1..=ticks {
                let uptime = Duration::from_millis(50 * i as u64);
                prop_assert_eq!(once.tick(uptime), twice.tick(uptime));
                prop_assert_eq!(once.brightness(), twice.brightness());
            }
        }
    }
}
