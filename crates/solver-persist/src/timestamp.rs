//! Canonical time representation: epoch milliseconds, UTC.

use chrono::Utc;

/// Current time in epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Values below this are treated as epoch seconds rather than milliseconds
/// (1e11 ms is March 1973, 1e11 s is far beyond any stored date).
pub const SECONDS_THRESHOLD: i64 = 100_000_000_000;

/// Interpret a bare numeric epoch that may be seconds or milliseconds
pub fn from_numeric_epoch(value: f64) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    if value.abs() < SECONDS_THRESHOLD as f64 {
        Some((value * 1000.0).round() as i64)
    } else {
        Some(value.round() as i64)
    }
}

/// Combine a `{seconds, nanoseconds}` pair into milliseconds
pub fn from_seconds_nanos(seconds: i64, nanos: i64) -> i64 {
    seconds * 1000 + nanos / 1_000_000
}

/// Parse an RFC 3339 string
pub fn from_rfc3339(value: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_seconds_and_millis() {
        assert_eq!(from_numeric_epoch(1_700_000_000.0), Some(1_700_000_000_000));
        assert_eq!(from_numeric_epoch(1_700_000_000_123.0), Some(1_700_000_000_123));
        assert_eq!(from_numeric_epoch(f64::NAN), None);
    }

    #[test]
    fn test_seconds_nanos() {
        assert_eq!(from_seconds_nanos(1_700_000_000, 250_000_000), 1_700_000_000_250);
    }

    #[test]
    fn test_rfc3339() {
        assert_eq!(from_rfc3339("1970-01-01T00:00:01Z"), Some(1000));
        assert_eq!(from_rfc3339("yesterday"), None);
    }
}
