//! Date rendering shared by every view (`YYYY-MM-DD HH:mm:ss`).

use std::fmt::Display;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};

/// Output pattern in `chrono` notation.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Text shown in place of unparsable input.
pub const INVALID_DATE: &str = "Invalid date";

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a date-like string into `tz`.
///
/// Accepts RFC 3339 timestamps (converted into `tz`), naive date-times and
/// plain dates (interpreted as local time in `tz`), and epoch milliseconds.
#[must_use]
pub fn parse_date_in<Tz: TimeZone>(input: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Some(parsed.with_timezone(tz));
    }
    if input.bytes().all(|b| b.is_ascii_digit()) {
        let millis = input.parse::<i64>().ok()?;
        return tz.timestamp_millis_opt(millis).single();
    }
    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;
    tz.from_local_datetime(&naive).earliest()
}

/// Format `input` as `YYYY-MM-DD HH:mm:ss` in `tz`; `None` when unparsable.
#[must_use]
pub fn format_date_in<Tz>(input: &str, tz: &Tz) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    parse_date_in(input, tz).map(|moment| moment.format(DISPLAY_FORMAT).to_string())
}

/// Format `input` in the process-local timezone.
#[must_use]
pub fn format_date(input: &str) -> Option<String> {
    format_date_in(input, &Local)
}

/// Format `input` in the local timezone, rendering [`INVALID_DATE`] on failure.
#[must_use]
pub fn display_date(input: &str) -> String {
    format_date(input).unwrap_or_else(|| INVALID_DATE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn utc_timestamps_render_in_utc() {
        assert_eq!(
            format_date_in("2022-12-17T15:38:36Z", &Utc).as_deref(),
            Some("2022-12-17 15:38:36")
        );
    }

    #[test]
    fn offsets_are_converted_into_the_target_zone() {
        let shanghai = FixedOffset::east_opt(8 * 3600).expect("valid offset");
        assert_eq!(
            format_date_in("2022-12-17T15:38:36Z", &shanghai).as_deref(),
            Some("2022-12-17 23:38:36")
        );
        assert_eq!(
            format_date_in("2022-12-17T15:38:36.123+08:00", &Utc).as_deref(),
            Some("2022-12-17 07:38:36")
        );
    }

    #[test]
    fn naive_inputs_are_local_to_the_target_zone() {
        let shanghai = FixedOffset::east_opt(8 * 3600).expect("valid offset");
        for input in [
            "2022-12-17 15:38:36",
            "2022-12-17T15:38:36",
            "2022-12-17T15:38:36.250",
        ] {
            assert_eq!(
                format_date_in(input, &shanghai).as_deref(),
                Some("2022-12-17 15:38:36"),
                "{input}"
            );
        }
        assert_eq!(
            format_date_in("2022-12-17", &Utc).as_deref(),
            Some("2022-12-17 00:00:00")
        );
        assert_eq!(
            format_date_in("2022-12-17 15:38", &Utc).as_deref(),
            Some("2022-12-17 15:38:00")
        );
    }

    #[test]
    fn epoch_milliseconds_are_accepted() {
        assert_eq!(
            format_date_in("1671291516000", &Utc).as_deref(),
            Some("2022-12-17 15:38:36")
        );
    }

    #[test]
    fn malformed_input_is_rejected() {
        for input in ["", "   ", "yesterday", "2022-13-40", "17/12/2022"] {
            assert_eq!(format_date_in(input, &Utc), None, "{input}");
        }
        assert_eq!(display_date("not a date"), INVALID_DATE);
    }

    #[test]
    fn local_helpers_agree_with_explicit_zone() {
        assert_eq!(
            format_date("2022-12-17T15:38:36Z"),
            format_date_in("2022-12-17T15:38:36Z", &Local)
        );
    }
}
