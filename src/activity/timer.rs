//! Elapsed time and threshold status for running activities
//!
//! Everything here is a pure function of the start time, the current time
//! and the effective definition. Callers recompute on every tick instead of
//! counting, so a timer can never drift from `started_at`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::types::{ActivityTypeDefinition, TimerStatus};

const MILLIS_PER_MINUTE: i64 = 60_000;

/// Whole minutes since `started_at`, floored. Start times in the future count as zero.
pub fn elapsed_minutes(started_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (now - started_at).num_milliseconds();
    millis.max(0).div_euclid(MILLIS_PER_MINUTE)
}

/// Whole seconds since `started_at`, never negative
pub fn elapsed_seconds(started_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - started_at).num_seconds().max(0)
}

/// Threshold status for an elapsed minute count.
///
/// Reaching a threshold counts as crossing it. A definition with a
/// non-positive max or a warning at/above the max is urgent as soon as any
/// time has elapsed.
pub fn status(elapsed_minutes: i64, def: &ActivityTypeDefinition) -> TimerStatus {
    if !def.has_valid_thresholds() {
        return if elapsed_minutes > 0 {
            TimerStatus::Urgent
        } else {
            TimerStatus::Normal
        };
    }

    if elapsed_minutes >= def.max_minutes {
        TimerStatus::Urgent
    } else if elapsed_minutes >= def.warning_minutes {
        TimerStatus::Warning
    } else {
        TimerStatus::Normal
    }
}

/// Share of the max duration used so far, in `[0, 1]`
pub fn progress_fraction(elapsed_minutes: i64, def: &ActivityTypeDefinition) -> f64 {
    let elapsed = elapsed_minutes.max(0);
    if !def.has_valid_thresholds() {
        return if elapsed > 0 { 1.0 } else { 0.0 };
    }
    (elapsed as f64 / def.max_minutes as f64).min(1.0)
}

/// Minutes left until the next threshold; `None` once urgent
pub fn minutes_until_next_threshold(
    elapsed_minutes: i64,
    def: &ActivityTypeDefinition,
) -> Option<i64> {
    match status(elapsed_minutes, def) {
        TimerStatus::Normal if def.has_valid_thresholds() => {
            Some(def.warning_minutes - elapsed_minutes.max(0))
        }
        TimerStatus::Warning => Some(def.max_minutes - elapsed_minutes),
        _ => None,
    }
}

/// Minutes past the max, zero until then
pub fn overdue_minutes(elapsed_minutes: i64, def: &ActivityTypeDefinition) -> i64 {
    if def.max_minutes <= 0 {
        return elapsed_minutes.max(0);
    }
    (elapsed_minutes - def.max_minutes).max(0)
}

/// Derived timer state for one tick
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub elapsed_seconds: i64,
    pub elapsed_minutes: i64,
    pub status: TimerStatus,
    pub progress: f64,
    pub minutes_to_next_threshold: Option<i64>,
    pub overdue_minutes: i64,
}

impl TimerSnapshot {
    pub fn compute(
        started_at: DateTime<Utc>,
        now: DateTime<Utc>,
        def: &ActivityTypeDefinition,
    ) -> Self {
        let elapsed_seconds = elapsed_seconds(started_at, now);
        let elapsed_minutes = elapsed_minutes(started_at, now);

        // A broken definition alerts within the first minute too
        let status = if !def.has_valid_thresholds() && elapsed_seconds > 0 {
            TimerStatus::Urgent
        } else {
            status(elapsed_minutes, def)
        };
        let progress = if !def.has_valid_thresholds() && elapsed_seconds > 0 {
            1.0
        } else {
            progress_fraction(elapsed_minutes, def)
        };

        TimerSnapshot {
            elapsed_seconds,
            elapsed_minutes,
            status,
            progress,
            minutes_to_next_threshold: minutes_until_next_threshold(elapsed_minutes, def),
            overdue_minutes: overdue_minutes(elapsed_minutes, def),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::defaults::find_built_in;
    use chrono::Duration;

    fn potty() -> ActivityTypeDefinition {
        find_built_in("potty").unwrap().to_definition()
    }

    fn with_thresholds(warning: i64, max: i64) -> ActivityTypeDefinition {
        ActivityTypeDefinition {
            warning_minutes: warning,
            max_minutes: max,
            ..potty()
        }
    }

    fn at(minutes: i64, seconds: i64) -> (DateTime<Utc>, DateTime<Utc>) {
        let now = Utc::now();
        (
            now - Duration::minutes(minutes) - Duration::seconds(seconds),
            now,
        )
    }

    #[test]
    fn test_elapsed_minutes_floors() {
        let (start, now) = at(4, 59);
        assert_eq!(elapsed_minutes(start, now), 4);
        let (start, now) = at(0, 59);
        assert_eq!(elapsed_minutes(start, now), 0);
        let (start, now) = at(5, 0);
        assert_eq!(elapsed_minutes(start, now), 5);
    }

    #[test]
    fn test_future_start_is_zero() {
        let now = Utc::now();
        assert_eq!(elapsed_minutes(now + Duration::minutes(3), now), 0);
        assert_eq!(elapsed_seconds(now + Duration::minutes(3), now), 0);
    }

    #[test]
    fn test_status_bands() {
        let def = potty();
        for m in 0..20 {
            assert_eq!(status(m, &def), TimerStatus::Normal, "minute {}", m);
        }
        for m in 20..30 {
            assert_eq!(status(m, &def), TimerStatus::Warning, "minute {}", m);
        }
        for m in [30, 31, 60, 1_000, 1_000_000] {
            assert_eq!(status(m, &def), TimerStatus::Urgent, "minute {}", m);
        }
    }

    #[test]
    fn test_status_is_monotonic() {
        let def = with_thresholds(45, 60);
        let mut previous = TimerStatus::Normal;
        for m in 0..500 {
            let current = status(m, &def);
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn test_progress_is_clamped_and_non_decreasing() {
        let def = potty();
        let mut previous = 0.0;
        for m in -5..10_000 {
            let p = progress_fraction(m, &def);
            assert!((0.0..=1.0).contains(&p));
            assert!(p >= previous);
            previous = p;
        }
        assert_eq!(progress_fraction(10_000, &def), 1.0);
    }

    #[test]
    fn test_potty_at_25_minutes() {
        let (start, now) = at(25, 0);
        let snap = TimerSnapshot::compute(start, now, &potty());
        assert_eq!(snap.status, TimerStatus::Warning);
        assert!((snap.progress - 0.8333).abs() < 0.001);
        assert_eq!(snap.minutes_to_next_threshold, Some(5));
        assert_eq!(snap.overdue_minutes, 0);
    }

    #[test]
    fn test_potty_at_31_minutes() {
        let (start, now) = at(31, 0);
        let snap = TimerSnapshot::compute(start, now, &potty());
        assert_eq!(snap.status, TimerStatus::Urgent);
        assert_eq!(snap.progress, 1.0);
        assert_eq!(snap.minutes_to_next_threshold, None);
        assert_eq!(snap.overdue_minutes, 1);
    }

    #[test]
    fn test_exactly_at_max_is_urgent() {
        assert_eq!(status(30, &potty()), TimerStatus::Urgent);
        assert_eq!(status(20, &potty()), TimerStatus::Warning);
    }

    #[test]
    fn test_misconfigured_definitions_fail_safe() {
        for def in [
            with_thresholds(30, 20),
            with_thresholds(30, 30),
            with_thresholds(0, 0),
            with_thresholds(-5, -1),
        ] {
            assert_eq!(status(0, &def), TimerStatus::Normal);
            assert_eq!(status(1, &def), TimerStatus::Urgent);
            assert_eq!(progress_fraction(1, &def), 1.0);

            let (start, now) = at(0, 10);
            let snap = TimerSnapshot::compute(start, now, &def);
            assert_eq!(snap.status, TimerStatus::Urgent);
            assert_eq!(snap.progress, 1.0);
        }
    }

    #[test]
    fn test_countdown_to_warning() {
        assert_eq!(minutes_until_next_threshold(5, &potty()), Some(15));
    }
}
