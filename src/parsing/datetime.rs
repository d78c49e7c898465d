//! # Temporal Text Formats
//!
//! Date and date-time columns accept several textual layouts. The layout is
//! sniffed once from the first non-empty row of a batch and then reused for
//! every row, so a batch mixing layouts fails at the first row that does not
//! match the sniffed one.
//!
//! ## Candidate Layouts (tried in order)
//!
//! | Layout                         | Example                          |
//! |--------------------------------|----------------------------------|
//! | integer                        | `1700000000` (Unix seconds)      |
//! | `%Y-%m-%d %H:%M:%S%.f`         | `2024-01-15 10:30:00.250`        |
//! | `%Y-%m-%dT%H:%M:%S%.f`         | `2024-01-15T10:30:00`            |
//! | `%Y/%m/%d %H:%M:%S%.f`         | `2024/01/15 10:30:00`            |
//! | RFC 3339                       | `2024-01-15T10:30:00+02:00`      |
//! | `%Y-%m-%d`                     | `2024-01-15`                     |
//! | `%Y/%m/%d`                     | `2024/01/15`                     |
//!
//! Layouts without an offset are interpreted in the column's time zone. In a
//! daylight-saving gap there is no such local time and the row fails; in an
//! overlap the earlier instant wins.
//!
//! ## Time of Day
//!
//! `Time(S)` values are seconds since midnight written as `[-]H:MM:SS[.f]` or
//! as a plain decimal number of seconds. Hours are not limited to 23.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use eyre::{bail, Result};

use crate::error::CodecError;
use crate::parsing::literal::unquote;

const DATETIME_PATTERNS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
];

const DATE_PATTERNS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// A layout sniffed from the first row of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalFormat {
    UnixSeconds,
    DateTime(&'static str),
    Rfc3339,
    Date(&'static str),
}

fn is_integer(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

impl TemporalFormat {
    /// Pick the first layout that parses `sample`.
    pub fn sniff(sample: &str, kind: &'static str) -> Result<Self> {
        let t = unquote(sample.trim());
        if is_integer(t) {
            return Ok(TemporalFormat::UnixSeconds);
        }
        if let Some(fmt) = DATETIME_PATTERNS
            .iter()
            .find(|fmt| NaiveDateTime::parse_from_str(t, fmt).is_ok())
        {
            return Ok(TemporalFormat::DateTime(fmt));
        }
        if DateTime::parse_from_rfc3339(t).is_ok() {
            return Ok(TemporalFormat::Rfc3339);
        }
        if let Some(fmt) = DATE_PATTERNS
            .iter()
            .find(|fmt| NaiveDate::parse_from_str(t, fmt).is_ok())
        {
            return Ok(TemporalFormat::Date(fmt));
        }
        bail!(CodecError::parse(kind, sample))
    }

    /// Parse `text` as an instant, reading offset-free layouts in `tz`.
    pub fn parse_instant(&self, text: &str, tz: &Tz, kind: &'static str) -> Result<DateTime<Tz>> {
        let t = unquote(text.trim());
        let parsed = match self {
            TemporalFormat::UnixSeconds => t
                .parse::<i64>()
                .ok()
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
                .map(|utc| utc.with_timezone(tz)),
            TemporalFormat::DateTime(fmt) => NaiveDateTime::parse_from_str(t, fmt)
                .ok()
                .and_then(|naive| tz.from_local_datetime(&naive).earliest()),
            TemporalFormat::Rfc3339 => DateTime::parse_from_rfc3339(t)
                .ok()
                .map(|fixed| fixed.with_timezone(tz)),
            TemporalFormat::Date(fmt) => NaiveDate::parse_from_str(t, fmt)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .and_then(|naive| tz.from_local_datetime(&naive).earliest()),
        };
        match parsed {
            Some(instant) => Ok(instant),
            None => bail!(CodecError::parse(kind, text)),
        }
    }

    /// Parse `text` as a calendar date. Instants are reduced to their UTC date.
    pub fn parse_date(&self, text: &str, kind: &'static str) -> Result<NaiveDate> {
        let t = unquote(text.trim());
        let parsed = match self {
            TemporalFormat::Date(fmt) => NaiveDate::parse_from_str(t, fmt).ok(),
            TemporalFormat::DateTime(fmt) => {
                NaiveDateTime::parse_from_str(t, fmt).ok().map(|dt| dt.date())
            }
            TemporalFormat::UnixSeconds | TemporalFormat::Rfc3339 => {
                return self
                    .parse_instant(text, &Tz::UTC, kind)
                    .map(|dt| dt.date_naive());
            }
        };
        match parsed {
            Some(date) => Ok(date),
            None => bail!(CodecError::parse(kind, text)),
        }
    }
}

/// Convert time-of-day text to a decimal seconds literal (`"01:02:03.5"` to
/// `"3723.5"`). Plain numbers pass through unchanged.
pub fn time_of_day_to_seconds(text: &str) -> Result<String> {
    let t = unquote(text.trim());
    if !t.contains(':') {
        return Ok(t.to_string());
    }
    let (negative, body) = match t.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, t),
    };
    let mut parts = body.splitn(3, ':');
    let (Some(h), Some(m), Some(s)) = (parts.next(), parts.next(), parts.next()) else {
        bail!(CodecError::parse("Time", text));
    };
    let (s, frac) = match s.split_once('.') {
        Some((whole, frac)) => (whole, Some(frac)),
        None => (s, None),
    };
    let all_digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(h) || !all_digits(m) || !all_digits(s) || frac.is_some_and(|f| !all_digits(f)) {
        bail!(CodecError::parse("Time", text));
    }
    let parse = |p: &str| p.parse::<u64>().ok();
    let (Some(h), Some(m), Some(s)) = (parse(h), parse(m), parse(s)) else {
        bail!(CodecError::overflow(format!("time '{}' out of range", text)));
    };
    if m >= 60 || s >= 60 {
        bail!(CodecError::parse("Time", text));
    }
    let Some(total) = h.checked_mul(3600).and_then(|v| v.checked_add(m * 60 + s)) else {
        bail!(CodecError::overflow(format!("time '{}' out of range", text)));
    };

    let mut out = String::with_capacity(24);
    if negative {
        out.push('-');
    }
    out.push_str(&total.to_string());
    if let Some(frac) = frac {
        out.push('.');
        out.push_str(frac);
    }
    Ok(out)
}

/// Render `ticks` units of `10^-scale` seconds as `[-]HH:MM:SS[.f]`.
pub fn format_time_of_day(ticks: i64, scale: u8) -> String {
    let divisor = 10u64.pow(u32::from(scale));
    let magnitude = ticks.unsigned_abs();
    let seconds = magnitude / divisor;
    let frac = magnitude % divisor;

    let mut out = String::with_capacity(20);
    if ticks < 0 {
        out.push('-');
    }
    out.push_str(&format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds / 60) % 60,
        seconds % 60
    ));
    if scale > 0 {
        out.push_str(&format!(".{:0width$}", frac, width = usize::from(scale)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn sniff_prefers_integers_then_patterns() {
        assert_eq!(
            TemporalFormat::sniff("1700000000", "DateTime").unwrap(),
            TemporalFormat::UnixSeconds
        );
        assert_eq!(
            TemporalFormat::sniff("2024-01-15 10:30:00", "DateTime").unwrap(),
            TemporalFormat::DateTime("%Y-%m-%d %H:%M:%S%.f")
        );
        assert_eq!(
            TemporalFormat::sniff("2024-01-15T10:30:00.5", "DateTime").unwrap(),
            TemporalFormat::DateTime("%Y-%m-%dT%H:%M:%S%.f")
        );
        assert_eq!(
            TemporalFormat::sniff("2024-01-15T10:30:00+02:00", "DateTime").unwrap(),
            TemporalFormat::Rfc3339
        );
        assert_eq!(
            TemporalFormat::sniff("'2024/01/15'", "Date").unwrap(),
            TemporalFormat::Date("%Y/%m/%d")
        );
        assert!(TemporalFormat::sniff("yesterday", "Date").is_err());
    }

    #[test]
    fn instants_use_column_zone() {
        let tz: Tz = "Europe/Berlin".parse().unwrap();
        let fmt = TemporalFormat::sniff("2024-01-15 10:30:00", "DateTime").unwrap();
        let dt = fmt.parse_instant("2024-01-15 10:30:00", &tz, "DateTime").unwrap();
        assert_eq!(dt.timestamp(), 1705311000);
        assert_eq!(dt.hour(), 10);
    }

    #[test]
    fn unix_seconds_mode() {
        let fmt = TemporalFormat::UnixSeconds;
        let dt = fmt.parse_instant("86400", &Tz::UTC, "DateTime").unwrap();
        assert_eq!(dt.timestamp(), 86400);
        assert!(fmt.parse_instant("2024-01-01", &Tz::UTC, "DateTime").is_err());
    }

    #[test]
    fn dates_from_every_layout() {
        let date = TemporalFormat::Date("%Y-%m-%d")
            .parse_date("2024-02-29", "Date")
            .unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2024, 2, 29));

        let date = TemporalFormat::DateTime("%Y-%m-%d %H:%M:%S%.f")
            .parse_date("2024-02-29 23:59:59", "Date")
            .unwrap();
        assert_eq!(date.day(), 29);

        let date = TemporalFormat::UnixSeconds.parse_date("0", "Date").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(1970, 1, 1).unwrap());

        assert!(TemporalFormat::Date("%Y-%m-%d")
            .parse_date("2023-02-29", "Date")
            .is_err());
    }

    #[test]
    fn time_of_day_text() {
        assert_eq!(time_of_day_to_seconds("01:02:03").unwrap(), "3723");
        assert_eq!(time_of_day_to_seconds("-00:00:01.25").unwrap(), "-1.25");
        assert_eq!(time_of_day_to_seconds("100:00:00").unwrap(), "360000");
        assert_eq!(time_of_day_to_seconds("42.5").unwrap(), "42.5");
        assert!(time_of_day_to_seconds("01:60:00").is_err());
        assert!(time_of_day_to_seconds("01:02").is_err());
        assert!(time_of_day_to_seconds("aa:bb:cc").is_err());
    }

    #[test]
    fn time_of_day_rendering() {
        assert_eq!(format_time_of_day(3723, 0), "01:02:03");
        assert_eq!(format_time_of_day(-1250, 3), "-00:00:01.250");
        assert_eq!(format_time_of_day(0, 2), "00:00:00.00");
    }
}
