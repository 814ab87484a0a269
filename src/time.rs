use std::fmt::Display;
use chrono::{
    DateTime, Local, TimeZone
};

pub const INVALID_DATE: &str = "Invalid Date";

// e.g. "19 Jan, 09:18:26"
const DISPLAY_FORMAT: &str = "%-d %b, %H:%M:%S";

/// Render a Unix timestamp (seconds, possibly fractional) in the local zone.
pub fn format_timestamp(ts: f64) -> String {
    format_timestamp_in(ts, &Local)
}

/// Same as [`format_timestamp`] for an explicit zone. Fractional seconds are truncated.
pub fn format_timestamp_in<Tz>(ts: f64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if !ts.is_finite() {
        return INVALID_DATE.to_string();
    }
    match DateTime::from_timestamp(ts.floor() as i64, 0) {
        Some(utc) => utc
            .with_timezone(tz)
            .format(DISPLAY_FORMAT)
            .to_string(),

        None => INVALID_DATE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn test_format_utc() {
        // 2026-01-19 09:18:26.787851 UTC
        assert_eq!(format_timestamp_in(1768814306.787851, &Utc), "19 Jan, 09:18:26");
    }

    #[test]
    fn test_fraction_is_truncated_not_rounded() {
        assert_eq!(format_timestamp_in(59.999, &Utc), "1 Jan, 00:00:59");
    }

    #[test]
    fn test_fixed_offset_zone() {
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        assert_eq!(format_timestamp_in(1768814306.0, &ist), "19 Jan, 14:48:26");
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(format_timestamp_in(f64::NAN, &Utc), INVALID_DATE);
        assert_eq!(format_timestamp_in(f64::INFINITY, &Utc), INVALID_DATE);
        assert_eq!(format_timestamp_in(1e300, &Utc), INVALID_DATE);
    }

    #[test]
    fn test_local_is_deterministic() {
        assert_eq!(format_timestamp(1768814306.5), format_timestamp(1768814306.1));
    }
}
