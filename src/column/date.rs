//! # Date and Date-Time Columns
//!
//! | Kind            | Row              | Unit                          |
//! |-----------------|------------------|-------------------------------|
//! | `Date`          | `u16`            | days since 1970-01-01         |
//! | `Date32`        | `i32`            | days, years 1900..=2299       |
//! | `DateTime`      | `u32`            | Unix seconds                  |
//! | `DateTime64(P)` | `i64`            | ticks of `10^-P` seconds      |
//!
//! Text layouts are sniffed from the first non-empty row of each batch (see
//! [`TemporalFormat`]). Date-time text without an offset is read in the
//! column's time zone, and rows are rendered back in that zone.
//!
//! Integer values are Unix seconds for every kind, matching how integer text
//! is read. `Date`/`Date32` keep the UTC date of the instant.

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use eyre::{bail, Result};

use super::int::convert_int;
use super::FixedKind;
use crate::config::{DATE32_MAX_YEAR, DATE32_MIN_YEAR};
use crate::error::CodecError;
use crate::parsing::TemporalFormat;
use crate::types::{KindGuard, Value, ValueKind};

const DATE_LAYOUT: &str = "%Y-%m-%d";
const DATETIME_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";

/// 1970-01-01.
fn epoch() -> NaiveDate {
    NaiveDate::default()
}

fn days_since_epoch(date: NaiveDate) -> i64 {
    date.signed_duration_since(epoch()).num_days()
}

fn date_from_days(days: i64) -> NaiveDate {
    TimeDelta::try_days(days)
        .and_then(|delta| epoch().checked_add_signed(delta))
        .unwrap_or_default()
}

fn sniffed(
    state: &mut Option<TemporalFormat>,
    text: &str,
    kind: &'static str,
) -> Result<TemporalFormat> {
    match state {
        Some(format) => Ok(*format),
        None => {
            let format = TemporalFormat::sniff(text, kind)?;
            *state = Some(format);
            Ok(format)
        }
    }
}

fn accepts_temporal(kind: ValueKind) -> bool {
    kind == ValueKind::Date || kind == ValueKind::DateTime || kind.is_native_integer()
}

/// Calendar date of a value, with integers read as Unix seconds.
fn value_date(value: &Value, column: &'static str) -> Result<NaiveDate> {
    match value {
        Value::Date(d) => Ok(*d),
        Value::DateTime(dt) => Ok(dt.date_naive()),
        other => {
            let secs = convert_int::<i64>(other)?;
            match DateTime::<Utc>::from_timestamp(secs, 0) {
                Some(utc) => Ok(utc.date_naive()),
                None => bail!(CodecError::overflow(format!(
                    "{} seconds is out of range for {}",
                    secs, column
                ))),
            }
        }
    }
}

/// Instant of a value in `tz`, with integers read as Unix seconds and dates
/// as local midnight.
fn value_instant(value: &Value, tz: &Tz, column: &'static str) -> Result<DateTime<Tz>> {
    let instant = match value {
        Value::DateTime(dt) => Some(dt.with_timezone(tz)),
        Value::Date(d) => d
            .and_hms_opt(0, 0, 0)
            .and_then(|naive| tz.from_local_datetime(&naive).earliest()),
        other => {
            let secs = convert_int::<i64>(other)?;
            DateTime::<Utc>::from_timestamp(secs, 0).map(|utc| utc.with_timezone(tz))
        }
    };
    match instant {
        Some(dt) => Ok(dt),
        None => bail!(CodecError::overflow(format!(
            "{:?} is out of range for {}",
            value, column
        ))),
    }
}

fn instant_from_seconds(secs: i64, tz: &Tz) -> DateTime<Tz> {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .unwrap_or_default()
        .with_timezone(tz)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DateKind;

impl DateKind {
    fn store(date: NaiveDate, out: &mut [u8]) -> Result<()> {
        let days = days_since_epoch(date);
        match u16::try_from(days) {
            Ok(d) => {
                out.copy_from_slice(&d.to_le_bytes());
                Ok(())
            }
            Err(_) => bail!(CodecError::overflow(format!("{} is out of range for Date", date))),
        }
    }

    fn load(row: &[u8]) -> NaiveDate {
        date_from_days(i64::from(u16::from_le_bytes([row[0], row[1]])))
    }
}

impl FixedKind for DateKind {
    type TextState = Option<TemporalFormat>;

    fn name(&self) -> &'static str {
        "Date"
    }

    fn width(&self) -> usize {
        2
    }

    fn parse_text(&self, text: &str, state: &mut Self::TextState, out: &mut [u8]) -> Result<()> {
        let date = sniffed(state, text, "Date")?.parse_date(text, "Date")?;
        Self::store(date, out)
    }

    fn encode_value(&self, value: &Value, guard: &mut KindGuard, out: &mut [u8]) -> Result<()> {
        guard.admit(value, "Date", accepts_temporal)?;
        Self::store(value_date(value, "Date")?, out)
    }

    fn decode_value(&self, row: &[u8]) -> Value {
        Value::Date(Self::load(row))
    }

    fn render(&self, row: &[u8]) -> String {
        Self::load(row).format(DATE_LAYOUT).to_string()
    }

    fn quoted(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Date32Kind;

impl Date32Kind {
    fn store(date: NaiveDate, out: &mut [u8]) -> Result<()> {
        if !(DATE32_MIN_YEAR..=DATE32_MAX_YEAR).contains(&date.year()) {
            bail!(CodecError::overflow(format!(
                "{} is outside Date32 years {}..={}",
                date, DATE32_MIN_YEAR, DATE32_MAX_YEAR
            )));
        }
        let days = days_since_epoch(date) as i32;
        out.copy_from_slice(&days.to_le_bytes());
        Ok(())
    }

    fn load(row: &[u8]) -> NaiveDate {
        date_from_days(i64::from(i32::from_le_bytes([row[0], row[1], row[2], row[3]])))
    }
}

impl FixedKind for Date32Kind {
    type TextState = Option<TemporalFormat>;

    fn name(&self) -> &'static str {
        "Date32"
    }

    fn width(&self) -> usize {
        4
    }

    fn parse_text(&self, text: &str, state: &mut Self::TextState, out: &mut [u8]) -> Result<()> {
        let date = sniffed(state, text, "Date32")?.parse_date(text, "Date32")?;
        Self::store(date, out)
    }

    fn encode_value(&self, value: &Value, guard: &mut KindGuard, out: &mut [u8]) -> Result<()> {
        guard.admit(value, "Date32", accepts_temporal)?;
        Self::store(value_date(value, "Date32")?, out)
    }

    fn decode_value(&self, row: &[u8]) -> Value {
        Value::Date(Self::load(row))
    }

    fn render(&self, row: &[u8]) -> String {
        Self::load(row).format(DATE_LAYOUT).to_string()
    }

    fn quoted(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DateTimeKind {
    tz: Tz,
}

impl DateTimeKind {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn time_zone(&self) -> Tz {
        self.tz
    }

    fn store(instant: &DateTime<Tz>, out: &mut [u8]) -> Result<()> {
        match u32::try_from(instant.timestamp()) {
            Ok(secs) => {
                out.copy_from_slice(&secs.to_le_bytes());
                Ok(())
            }
            Err(_) => bail!(CodecError::overflow(format!(
                "{} is out of range for DateTime",
                instant
            ))),
        }
    }

    fn load(&self, row: &[u8]) -> DateTime<Tz> {
        let secs = u32::from_le_bytes([row[0], row[1], row[2], row[3]]);
        instant_from_seconds(i64::from(secs), &self.tz)
    }
}

impl FixedKind for DateTimeKind {
    type TextState = Option<TemporalFormat>;

    fn name(&self) -> &'static str {
        "DateTime"
    }

    fn width(&self) -> usize {
        4
    }

    fn parse_text(&self, text: &str, state: &mut Self::TextState, out: &mut [u8]) -> Result<()> {
        let instant = sniffed(state, text, "DateTime")?.parse_instant(text, &self.tz, "DateTime")?;
        Self::store(&instant, out)
    }

    fn encode_value(&self, value: &Value, guard: &mut KindGuard, out: &mut [u8]) -> Result<()> {
        guard.admit(value, "DateTime", accepts_temporal)?;
        Self::store(&value_instant(value, &self.tz, "DateTime")?, out)
    }

    fn decode_value(&self, row: &[u8]) -> Value {
        Value::DateTime(self.load(row))
    }

    fn render(&self, row: &[u8]) -> String {
        self.load(row).format(DATETIME_LAYOUT).to_string()
    }

    fn quoted(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DateTime64Kind {
    precision: u8,
    tz: Tz,
}

impl DateTime64Kind {
    pub fn new(precision: u8, tz: Tz) -> Self {
        Self { precision, tz }
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    fn ticks_per_second(&self) -> i64 {
        10i64.pow(u32::from(self.precision))
    }

    fn nanos_per_tick(&self) -> i64 {
        10i64.pow(9 - u32::from(self.precision))
    }

    fn store(&self, instant: &DateTime<Tz>, out: &mut [u8]) -> Result<()> {
        let sub = i64::from(instant.timestamp_subsec_nanos()) / self.nanos_per_tick();
        let ticks = instant
            .timestamp()
            .checked_mul(self.ticks_per_second())
            .and_then(|t| t.checked_add(sub));
        match ticks {
            Some(t) => {
                out.copy_from_slice(&t.to_le_bytes());
                Ok(())
            }
            None => bail!(CodecError::overflow(format!(
                "{} is out of range for DateTime64({})",
                instant, self.precision
            ))),
        }
    }

    /// Whole seconds and sub-second ticks of a row.
    fn split(&self, row: &[u8]) -> (i64, i64) {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(row);
        let ticks = i64::from_le_bytes(buf);
        (
            ticks.div_euclid(self.ticks_per_second()),
            ticks.rem_euclid(self.ticks_per_second()),
        )
    }

    fn load(&self, row: &[u8]) -> DateTime<Tz> {
        let (secs, frac) = self.split(row);
        let nanos = (frac * self.nanos_per_tick()) as u32;
        DateTime::<Utc>::from_timestamp(secs, nanos)
            .unwrap_or_default()
            .with_timezone(&self.tz)
    }
}

impl FixedKind for DateTime64Kind {
    type TextState = Option<TemporalFormat>;

    fn name(&self) -> &'static str {
        "DateTime64"
    }

    fn width(&self) -> usize {
        8
    }

    fn parse_text(&self, text: &str, state: &mut Self::TextState, out: &mut [u8]) -> Result<()> {
        let instant =
            sniffed(state, text, "DateTime64")?.parse_instant(text, &self.tz, "DateTime64")?;
        self.store(&instant, out)
    }

    fn encode_value(&self, value: &Value, guard: &mut KindGuard, out: &mut [u8]) -> Result<()> {
        guard.admit(value, "DateTime64", accepts_temporal)?;
        self.store(&value_instant(value, &self.tz, "DateTime64")?, out)
    }

    fn decode_value(&self, row: &[u8]) -> Value {
        Value::DateTime(self.load(row))
    }

    fn render(&self, row: &[u8]) -> String {
        let (secs, frac) = self.split(row);
        let mut out = instant_from_seconds(secs, &self.tz)
            .format(DATETIME_LAYOUT)
            .to_string();
        if self.precision > 0 {
            out.push_str(&format!(
                ".{:0width$}",
                frac,
                width = usize::from(self.precision)
            ));
        }
        out
    }

    fn quoted(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{ColumnCodec, FixedColumn};
    use crate::error::ErrorKind;
    use crate::memory::BufferPool;

    fn pool() -> BufferPool {
        BufferPool::new(2)
    }

    #[test]
    fn date_days_and_rendering() {
        let mut col = FixedColumn::new(&pool(), 3, DateKind);
        col.fill_from_texts(&["2024-01-15", "'1970-01-02'", ""]).unwrap();
        assert_eq!(col.raw_row(0), &19737u16.to_le_bytes());
        assert_eq!(col.text(0), "2024-01-15");
        assert_eq!(col.text(1), "1970-01-02");
        assert_eq!(col.text(2), "1970-01-01");
        assert_eq!(col.nested_text(0), "'2024-01-15'");
    }

    #[test]
    fn date_range_is_enforced() {
        let mut col = FixedColumn::new(&pool(), 1, DateKind);
        let err = col.fill_from_texts(&["2200-01-01"]).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Overflow));

        let mut col = FixedColumn::new(&pool(), 2, Date32Kind);
        col.fill_from_texts(&["1900-01-01", "1969-12-31"]).unwrap();
        assert_eq!(col.raw_row(1), &(-1i32).to_le_bytes());
        let err = col.fill_from_texts(&["1899-12-31"]).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Overflow));
    }

    #[test]
    fn layout_is_sniffed_once_per_batch() {
        let mut col = FixedColumn::new(&pool(), 2, DateKind);
        let err = col.fill_from_texts(&["2024-01-15", "2024/01/16"]).unwrap_err();
        assert_eq!((err.committed, err.row), (1, 1));
        assert_eq!(err.kind(), Some(ErrorKind::Parse));

        col.fill_from_texts(&["2024/01/15", "2024/01/16"]).unwrap();
        assert_eq!(col.text(1), "2024-01-16");
    }

    #[test]
    fn datetime_reads_local_text_in_column_zone() {
        let tz: Tz = "Europe/Berlin".parse().unwrap();
        let mut col = FixedColumn::new(&pool(), 1, DateTimeKind::new(tz));
        col.fill_from_texts(&["2024-01-15 10:30:00"]).unwrap();
        assert_eq!(col.raw_row(0), &1705311000u32.to_le_bytes());
        assert_eq!(col.text(0), "2024-01-15 10:30:00");
    }

    #[test]
    fn integer_first_row_means_unix_seconds() {
        let mut col = FixedColumn::new(&pool(), 2, DateTimeKind::new(Tz::UTC));
        col.fill_from_texts(&["1700000000", "0"]).unwrap();
        assert_eq!(col.text(0), "2023-11-14 22:13:20");
        assert_eq!(col.text(1), "1970-01-01 00:00:00");

        let err = col
            .fill_from_texts(&["1700000000", "2024-01-15 10:30:00"])
            .unwrap_err();
        assert_eq!(err.row, 1);
    }

    #[test]
    fn integer_text_and_values_agree_for_dates() {
        let mut from_text = FixedColumn::new(&pool(), 2, DateKind);
        from_text.fill_from_texts(&["1705314600", "19737"]).unwrap();
        let mut from_values = FixedColumn::new(&pool(), 2, DateKind);
        from_values
            .fill_from_values(&[Value::Int64(1705314600), Value::Int64(19737)])
            .unwrap();
        assert_eq!(from_text.as_bytes(), from_values.as_bytes());
        assert_eq!(from_values.text(0), "2024-01-15");
        assert_eq!(from_values.text(1), "1970-01-01");
    }

    #[test]
    fn datetime_rejects_pre_epoch() {
        let mut col = FixedColumn::new(&pool(), 1, DateTimeKind::new(Tz::UTC));
        let err = col.fill_from_texts(&["1969-12-31 23:59:59"]).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Overflow));
    }

    #[test]
    fn datetime64_ticks() {
        let mut col = FixedColumn::new(&pool(), 2, DateTime64Kind::new(3, Tz::UTC));
        col.fill_from_texts(&["2024-01-15 10:30:00.250", "2024-01-15 10:30:00"])
            .unwrap();
        assert_eq!(col.raw_row(0), &1705314600250i64.to_le_bytes());
        assert_eq!(col.text(0), "2024-01-15 10:30:00.250");
        assert_eq!(col.text(1), "2024-01-15 10:30:00.000");
    }

    #[test]
    fn datetime64_before_epoch() {
        let mut col = FixedColumn::new(&pool(), 1, DateTime64Kind::new(1, Tz::UTC));
        col.fill_from_texts(&["1969-12-31 23:59:59.5"]).unwrap();
        assert_eq!(col.raw_row(0), &(-5i64).to_le_bytes());
        assert_eq!(col.text(0), "1969-12-31 23:59:59.5");
    }

    #[test]
    fn temporal_values() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let mut col = FixedColumn::new(&pool(), 2, DateKind);
        col.fill_from_values(&[Value::Date(date), Value::Date(date)]).unwrap();
        assert_eq!(col.value(0), Value::Date(date));

        let mut col = FixedColumn::new(&pool(), 1, DateTimeKind::new(Tz::UTC));
        col.fill_from_values(&[Value::Int64(1700000000)]).unwrap();
        assert_eq!(col.text(0), "2023-11-14 22:13:20");

        let mut col = FixedColumn::new(&pool(), 2, Date32Kind);
        col.fill_from_values(&[Value::Int64(1700000000), Value::Int64(-86400)])
            .unwrap();
        assert_eq!(col.text(0), "2023-11-14");
        assert_eq!(col.text(1), "1969-12-31");

        let instant = Tz::UTC.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let mut col = FixedColumn::new(&pool(), 1, DateTime64Kind::new(6, Tz::UTC));
        col.fill_from_values(&[Value::DateTime(instant)]).unwrap();
        assert_eq!(col.value(0), Value::DateTime(instant));

        let err = col.fill_from_values(&[Value::Text("x".into())]).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::TypeMismatch));
    }
}
