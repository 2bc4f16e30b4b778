// Tolerant field parsers and basic statistics.
//
// This module centralizes all the "dirty" CSV value handling so the rest of
// the code can assume clean, typed values. Every parser returns `Option`:
// a value that cannot be parsed becomes missing and is skipped by the
// aggregations, it never aborts the pipeline.
use chrono::{Duration, NaiveDate, NaiveTime};
use num_format::{Locale, ToFormattedString};

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in CSV exports (commas, spaces, text).
///
/// - Accepts `Option<&str>` so callers can pass through optional fields.
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters.
/// - Strips thousands separators like `","` before parsing.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(",", "");
    s.parse::<f64>().ok()
}

pub fn parse_i64_safe(s: Option<&str>) -> Option<i64> {
    // `?` propagates `None` early if the option is missing.
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<i64>().ok()
}

pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    // CSV dates are expected in `YYYY-MM-DD` format.
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Parse a wall-clock time, accepting both `H:MM` and `H:MM:SS`.
pub fn parse_time_safe(s: Option<&str>) -> Option<NaiveTime> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

/// Parse a string-encoded elapsed time.
///
/// Rota durations come in two shapes: `H:MM` and `H:MM:SS`. A two-component
/// string is normalized by appending `:00` before parsing, so `"1:30"` and
/// `"1:30:00"` are the same duration. Anything else (wrong component count,
/// non-numeric parts, minutes or seconds >= 60) is missing, never a crash.
pub fn parse_duration_safe(s: Option<&str>) -> Option<Duration> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let normalized = if s.split(':').count() == 2 {
        format!("{}:00", s)
    } else {
        s.to_string()
    };
    let parts: Vec<&str> = normalized.split(':').collect();
    if parts.len() != 3 {
        return None;
    }
    let hours: i64 = parts[0].trim().parse().ok()?;
    let minutes: i64 = parts[1].trim().parse().ok()?;
    let seconds: i64 = parts[2].trim().parse().ok()?;
    if hours < 0 || !(0..60).contains(&minutes) || !(0..60).contains(&seconds) {
        return None;
    }
    Some(Duration::seconds(hours * 3600 + minutes * 60 + seconds))
}

pub fn average(v: &[f64]) -> f64 {
    // Standard arithmetic mean; returns 0 for an empty slice to avoid NaNs.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - locale-aware thousands separators (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative();
    let abs_n = n.abs();
    // First, format to a plain fixed-decimal string like `1234567.89`.
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    // Use `num-format` to insert commas into the integer portion.
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    } else if decimals > 0 {
        res.push('.');
        res.push_str(&"0".repeat(decimals));
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for integer-like values, used for row
    // counts in console messages (e.g., `9,855 rows loaded`).
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_two_components_normalizes() {
        assert_eq!(
            parse_duration_safe(Some("1:30")),
            Some(Duration::minutes(90))
        );
    }

    #[test]
    fn duration_three_components_unchanged() {
        assert_eq!(
            parse_duration_safe(Some("1:30:00")),
            Some(Duration::minutes(90))
        );
        assert_eq!(
            parse_duration_safe(Some("0:00:45")),
            Some(Duration::seconds(45))
        );
    }

    #[test]
    fn duration_invalid_is_missing_not_a_crash() {
        assert_eq!(parse_duration_safe(Some("abc")), None);
        assert_eq!(parse_duration_safe(Some("1")), None);
        assert_eq!(parse_duration_safe(Some("1:75")), None);
        assert_eq!(parse_duration_safe(Some("1:2:3:4")), None);
        assert_eq!(parse_duration_safe(Some("")), None);
        assert_eq!(parse_duration_safe(None), None);
    }

    #[test]
    fn time_accepts_both_shapes() {
        let t = NaiveTime::from_hms_opt(9, 30, 0).unwrap();
        assert_eq!(parse_time_safe(Some("09:30")), Some(t));
        assert_eq!(parse_time_safe(Some("09:30:00")), Some(t));
        assert_eq!(parse_time_safe(Some("not a time")), None);
    }

    #[test]
    fn f64_strips_separators_and_rejects_text() {
        assert_eq!(parse_f64_safe(Some("1,250.50")), Some(1250.5));
        assert_eq!(parse_f64_safe(Some(" 10 ")), Some(10.0));
        assert_eq!(parse_f64_safe(Some("ten")), None);
        assert_eq!(parse_f64_safe(Some("")), None);
    }

    #[test]
    fn average_of_empty_is_zero() {
        assert_eq!(average(&[]), 0.0);
        assert_eq!(average(&[2.0, 4.0]), 3.0);
    }

    #[test]
    fn format_number_two_decimals() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(10.0, 2), "10.00");
        assert_eq!(format_number(-42.5, 2), "-42.50");
    }
}
