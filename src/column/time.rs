//! # Time-of-Day Columns
//!
//! `Time(S)` stores seconds since midnight in a `Decimal(18, S)` row, so
//! the wire form is an `i64` count of `10^-S` second ticks. Text is either
//! `[-]H:MM:SS[.f]` or a plain decimal number of seconds.

use chrono::TimeDelta;
use eyre::{bail, Result};
use num_bigint::BigInt;
use num_traits::ToPrimitive;

use super::{DecimalKind, FixedKind};
use crate::config::TIME_PRECISION;
use crate::error::CodecError;
use crate::parsing::{format_time_of_day, time_of_day_to_seconds};
use crate::types::{KindGuard, Value, ValueKind};

#[derive(Debug, Clone, Copy)]
pub struct TimeKind {
    decimal: DecimalKind,
}

impl TimeKind {
    pub fn new(scale: u8) -> Self {
        Self {
            decimal: DecimalKind::new(TIME_PRECISION, scale),
        }
    }

    pub fn scale(&self) -> u8 {
        self.decimal.scale()
    }

    fn nanos_per_tick(&self) -> i64 {
        10i64.pow(9 - u32::from(self.scale()))
    }

    fn ticks_per_second(&self) -> i64 {
        10i64.pow(u32::from(self.scale()))
    }

    fn ticks(&self, row: &[u8]) -> i64 {
        self.decimal.unscaled(row).to_i64().unwrap_or_default()
    }

    fn delta_ticks(&self, delta: &TimeDelta) -> Result<BigInt> {
        let sub = i64::from(delta.subsec_nanos()) / self.nanos_per_tick();
        match delta
            .num_seconds()
            .checked_mul(self.ticks_per_second())
            .and_then(|t| t.checked_add(sub))
        {
            Some(ticks) => Ok(BigInt::from(ticks)),
            None => bail!(CodecError::overflow(format!(
                "{} is out of range for Time({})",
                delta,
                self.scale()
            ))),
        }
    }
}

impl FixedKind for TimeKind {
    type TextState = ();

    fn name(&self) -> &'static str {
        "Time"
    }

    fn width(&self) -> usize {
        self.decimal.width()
    }

    fn parse_text(&self, text: &str, state: &mut (), out: &mut [u8]) -> Result<()> {
        let seconds = time_of_day_to_seconds(text)?;
        self.decimal.parse_text(&seconds, state, out)
    }

    fn encode_value(&self, value: &Value, guard: &mut KindGuard, out: &mut [u8]) -> Result<()> {
        guard.admit(value, "Time", |k| {
            matches!(k, ValueKind::Time | ValueKind::Decimal | ValueKind::BigInt)
                || k.is_native_integer()
        })?;
        let unscaled = match value {
            Value::Time(delta) => self.delta_ticks(delta)?,
            other => self.decimal.value_unscaled(other)?,
        };
        self.decimal.store(&unscaled, out)
    }

    fn decode_value(&self, row: &[u8]) -> Value {
        let ticks = self.ticks(row);
        let secs = ticks.div_euclid(self.ticks_per_second());
        let nanos = ticks.rem_euclid(self.ticks_per_second()) * self.nanos_per_tick();
        Value::Time(TimeDelta::new(secs, nanos as u32).unwrap_or_default())
    }

    fn render(&self, row: &[u8]) -> String {
        format_time_of_day(self.ticks(row), self.scale())
    }

    fn quoted(&self) -> bool {
        true
    }
}
