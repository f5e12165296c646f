//! Reporting time zone handling.
//!
//! Reported timestamps use a fixed UTC offset (Asia/Taipei civil time,
//! `+08:00`, by default). The zone has no daylight saving, so a fixed offset
//! is exact.

use crate::utils::{ResourceError, Result};
use chrono::{DateTime, FixedOffset, SecondsFormat};

/// Parse `+HH:MM`, `-HH:MM`, `+HHMM` or `Z`.
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset> {
    let raw = raw.trim();
    let invalid = || ResourceError::Config(format!("invalid UTC offset '{}'", raw));

    if raw.eq_ignore_ascii_case("z") || raw == "UTC" {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = match raw.as_bytes().first() {
        Some(b'+') => (1, &raw[1..]),
        Some(b'-') => (-1, &raw[1..]),
        _ => return Err(invalid()),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// Re-express an instant in the reporting offset.
pub fn normalize(time: DateTime<FixedOffset>, offset: &FixedOffset) -> DateTime<FixedOffset> {
    time.with_timezone(offset)
}

/// RFC3339 at second precision; the empty string for an absent instant.
pub fn format_rfc3339(time: Option<&DateTime<FixedOffset>>) -> String {
    time.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taipei() -> FixedOffset {
        parse_utc_offset("+08:00").unwrap()
    }

    #[test]
    fn test_parse_offsets() {
        assert_eq!(taipei().local_minus_utc(), 28_800);
        assert_eq!(parse_utc_offset("-0530").unwrap().local_minus_utc(), -19_800);
        assert_eq!(parse_utc_offset("Z").unwrap().local_minus_utc(), 0);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for raw in ["", "08:00", "+8", "+24:00", "+08:61", "Asia/Taipei"] {
            assert!(parse_utc_offset(raw).is_err(), "accepted {:?}", raw);
        }
    }

    #[test]
    fn test_normalize_end_time() {
        let end = DateTime::parse_from_rfc3339("2024-01-01T04:00:00Z").unwrap();
        let local = normalize(end, &taipei());

        assert_eq!(local, end);
        assert_eq!(format_rfc3339(Some(&local)), "2024-01-01T12:00:00+08:00");
    }

    #[test]
    fn test_format_drops_fraction() {
        let t = DateTime::parse_from_rfc3339("2024-03-05T23:59:59.731Z").unwrap();
        assert_eq!(
            format_rfc3339(Some(&normalize(t, &taipei()))),
            "2024-03-06T07:59:59+08:00"
        );
    }

    #[test]
    fn test_format_absent() {
        assert_eq!(format_rfc3339(None), "");
    }
}
