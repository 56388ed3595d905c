//! Hours/minutes/seconds formatting for timer durations

use chrono::Duration;

/// Split whole seconds into hours, minutes and seconds
pub fn hms(total_seconds: i64) -> (i64, i64, i64) {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    (hours, minutes, seconds)
}

/// `HH:MM:SS`, dropping any fractional second
pub fn hms_string(duration: Duration) -> String {
    let (h, m, s) = hms(duration.num_seconds());
    format!("{:02}:{:02}:{:02}", h, m, s)
}

/// `HH:MM:SS` rounded up to the next whole second, never negative
///
/// This is what a countdown display shows: 299.2s left reads `00:05:00`
/// and an expired timer reads `00:00:00`.
pub fn countdown_string(remaining: Duration) -> String {
    let millis = remaining.num_milliseconds().max(0);
    let seconds = (millis + 999) / 1000;
    hms_string(Duration::seconds(seconds))
}

/// Seconds as a float, millisecond resolution
pub fn as_seconds_f64(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 1000.0
}

/// Inverse of [`as_seconds_f64`]
///
/// `None` for NaN, infinities and anything a `Duration` cannot hold.
pub fn from_seconds_f64(seconds: f64) -> Option<Duration> {
    let millis = (seconds * 1000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    Duration::try_milliseconds(millis as i64)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn formats_hours_minutes_seconds() {
        assert_eq!(hms_string(Duration::seconds(300)), "00:05:00");
        assert_eq!(hms_string(Duration::seconds(5400 + 7)), "01:30:07");
        assert_eq!(hms_string(Duration::milliseconds(59_900)), "00:00:59");
    }

    #[test]
    fn countdown_rounds_up_and_clamps() {
        assert_eq!(countdown_string(Duration::milliseconds(299_200)), "00:05:00");
        assert_eq!(countdown_string(Duration::seconds(300)), "00:05:00");
        assert_eq!(countdown_string(Duration::milliseconds(1)), "00:00:01");
        assert_eq!(countdown_string(Duration::seconds(-3)), "00:00:00");
    }

    #[test]
    fn seconds_conversion_keeps_milliseconds() {
        assert_eq!(from_seconds_f64(1.5), Some(Duration::milliseconds(1500)));
        assert_eq!(from_seconds_f64(-0.25), Some(Duration::milliseconds(-250)));
        assert_eq!(as_seconds_f64(Duration::milliseconds(200_250)), 200.25);
    }

    #[test]
    fn seconds_conversion_rejects_unrepresentable_values() {
        for seconds in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 1e300, -1e300, 1e16] {
            assert_eq!(from_seconds_f64(seconds), None, "{}", seconds);
        }
    }
}
