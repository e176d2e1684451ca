//! Human-readable formatting for the file listing.

use chrono::{DateTime, Utc};

const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
const BASE: u64 = 1024;

/// Format a byte count with two decimals, binary units, trailing zeros trimmed.
///
/// `0` -> `"0 Bytes"`, `1024` -> `"1 KB"`, `1536` -> `"1.5 KB"`.
pub fn format_bytes(bytes: u64) -> String {
    format_bytes_with(bytes, 2)
}

/// Format a byte count with at most `decimals` fractional digits.
pub fn format_bytes_with(bytes: u64, decimals: usize) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut divisor = 1u64;
    while unit < UNITS.len() - 1 && bytes / divisor >= BASE {
        divisor *= BASE;
        unit += 1;
    }

    let value = bytes as f64 / divisor as f64;
    let fixed = format!("{:.*}", decimals, value);
    format!("{} {}", trim_fraction(&fixed), UNITS[unit])
}

/// Format the upload date column. Records without a server timestamp yet
/// (or with a zero timestamp) read "Just now".
pub fn format_upload_date(created_at: Option<DateTime<Utc>>) -> String {
    match created_at {
        Some(ts) if ts.timestamp() != 0 => ts.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        _ => "Just now".to_string(),
    }
}

fn trim_fraction(fixed: &str) -> &str {
    if !fixed.contains('.') {
        return fixed;
    }
    fixed.trim_end_matches('0').trim_end_matches('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_bytes_reference_values() {
        assert_eq!(format_bytes(0), "0 Bytes");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(500_000), "488.28 KB");
    }

    #[test]
    fn test_format_bytes_unit_boundaries() {
        assert_eq!(format_bytes(1), "1 Bytes");
        assert_eq!(format_bytes(1023), "1023 Bytes");
        assert_eq!(format_bytes(1024 * 1024), "1 MB");
        assert_eq!(format_bytes(1024 * 1024 * 1024), "1 GB");
        assert_eq!(format_bytes(5 * 1024u64.pow(4)), "5 TB");
    }

    #[test]
    fn test_format_bytes_caps_at_terabytes() {
        assert_eq!(format_bytes(2048 * 1024u64.pow(4)), "2048 TB");
    }

    #[test]
    fn test_format_bytes_with_zero_decimals() {
        assert_eq!(format_bytes_with(1536, 0), "2 KB");
    }

    #[test]
    fn test_format_upload_date() {
        assert_eq!(format_upload_date(None), "Just now");
        assert_eq!(
            format_upload_date(Some(Utc.timestamp_opt(0, 0).unwrap())),
            "Just now"
        );
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        assert_eq!(format_upload_date(Some(ts)), "2024-03-09 14:05:00 UTC");
    }
}
