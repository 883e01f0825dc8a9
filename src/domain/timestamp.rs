use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};

pub const KECO_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

// Upstream timestamps are Korea local time, which has no DST.
const KOREA_UTC_OFFSET_SECONDS: i32 = 9 * 3600;
const KECO_TIMESTAMP_LEN: usize = 14;

pub fn korea_offset() -> Option<FixedOffset> {
    FixedOffset::east_opt(KOREA_UTC_OFFSET_SECONDS)
}

/// Parses a `YYYYMMDDHHMMSS` value. Blank, all-zero and malformed input
/// yield `None`.
pub fn parse_keco_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.len() != KECO_TIMESTAMP_LEN || !raw.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    if raw.bytes().all(|byte| byte == b'0') {
        return None;
    }

    let naive = NaiveDateTime::parse_from_str(raw, KECO_TIMESTAMP_FORMAT).ok()?;
    korea_offset()?.from_local_datetime(&naive).single()
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::parse_keco_timestamp;

    #[test]
    fn parses_korea_local_timestamp() {
        let parsed = parse_keco_timestamp("20240101093000").expect("timestamp should parse");

        assert_eq!(parsed.to_rfc3339(), "2024-01-01T09:30:00+09:00");
        assert_eq!(parsed.year(), 2024);
        assert_eq!(parsed.hour(), 9);
        assert_eq!(parsed.offset().local_minus_utc(), 9 * 3600);
    }

    #[test]
    fn sentinel_values_are_absent() {
        assert_eq!(parse_keco_timestamp(""), None);
        assert_eq!(parse_keco_timestamp("0"), None);
        assert_eq!(parse_keco_timestamp("00000000000000"), None);
        assert_eq!(parse_keco_timestamp("   "), None);
    }

    #[test]
    fn malformed_values_are_absent() {
        assert_eq!(parse_keco_timestamp("not-a-date"), None);
        assert_eq!(parse_keco_timestamp("20241301093000"), None);
        assert_eq!(parse_keco_timestamp("2024010109300"), None);
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        assert!(parse_keco_timestamp(" 20240101093000 ").is_some());
    }
}
