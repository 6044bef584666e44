//! Placeholder binding.
//!
//! Each parameter is converted to a [`mysql_async::Value`] and rendered by
//! the driver with [`Value::as_sql`], which knows both MySQL quoting styles.
//! Timestamps become wall-clock time in the time zone passed in, never in a
//! process-wide zone.

use crate::error::StoreError;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use chrono_tz::Tz;
use mysql_async::Value;
use replay_core::{placeholder_positions, SqlStatement, SqlValue};

/// How string literals are quoted for the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quoting {
    /// `'O\'Reilly'`: the server's default SQL mode.
    #[default]
    Backslash,
    /// `'O''Reilly'`: for servers running with `NO_BACKSLASH_ESCAPES`.
    NoBackslashEscapes,
}

impl Quoting {
    fn no_backslash_escape(self) -> bool {
        self == Self::NoBackslashEscapes
    }
}

/// Convert `value` to the driver's value type.
pub fn to_mysql_value(value: &SqlValue, tz: &Tz) -> Result<Value, StoreError> {
    let converted = match value {
        SqlValue::Null => Value::NULL,
        SqlValue::Bool(b) => Value::Int(i64::from(*b)),
        SqlValue::Int(i) => Value::Int(*i),
        SqlValue::UInt(u) => Value::UInt(*u),
        SqlValue::Float(f) => {
            if !f.is_finite() {
                return Err(StoreError::InvalidParameter(format!(
                    "{f} has no SQL literal"
                )));
            }
            Value::Double(*f)
        }
        SqlValue::Decimal(d) => Value::Bytes(d.clone().into_bytes()),
        SqlValue::Text(s) => Value::Bytes(s.clone().into_bytes()),
        SqlValue::Bytes(bytes) => Value::Bytes(bytes.clone()),
        SqlValue::Date(d) => date_value(d.and_time(NaiveTime::MIN))?,
        SqlValue::Time(t) => {
            let (h, m, s, us) = clock(t);
            Value::Time(false, 0, h, m, s, us)
        }
        SqlValue::DateTime(dt) => date_value(*dt)?,
        SqlValue::Timestamp(ts) => date_value(ts.with_timezone(tz).naive_local())?,
    };
    Ok(converted)
}

/// Render `value` as a literal the target will read back unchanged.
pub fn literal(value: &SqlValue, tz: &Tz, quoting: Quoting) -> Result<String, StoreError> {
    Ok(to_mysql_value(value, tz)?.as_sql(quoting.no_backslash_escape()))
}

/// Substitute every placeholder of `statement` with its parameter's literal.
///
/// Statements without parameters are returned unchanged, so raw statements
/// from the change log are never rewritten.
pub fn bind(statement: &SqlStatement, tz: &Tz, quoting: Quoting) -> Result<String, StoreError> {
    let sql = statement.sql();
    let params = statement.params();
    if params.is_empty() {
        return Ok(sql.to_string());
    }

    let positions = placeholder_positions(sql);
    if positions.len() != params.len() {
        return Err(StoreError::Bind(format!(
            "{} placeholder(s) for {} parameter(s)",
            positions.len(),
            params.len()
        )));
    }

    let mut out = String::with_capacity(sql.len() + params.len() * 8);
    let mut cursor = 0;
    for (pos, value) in positions.into_iter().zip(params) {
        out.push_str(&sql[cursor..pos]);
        out.push_str(&literal(value, tz, quoting)?);
        cursor = pos + 1;
    }
    out.push_str(&sql[cursor..]);
    Ok(out)
}

fn date_value(dt: NaiveDateTime) -> Result<Value, StoreError> {
    let year = u16::try_from(dt.year())
        .map_err(|_| StoreError::InvalidParameter(format!("year of {dt} is out of range")))?;
    let date: NaiveDate = dt.date();
    let (h, m, s, us) = clock(&dt.time());
    Ok(Value::Date(year, date.month() as u8, date.day() as u8, h, m, s, us))
}

/// Hour, minute, second and microsecond; a leap second's extra fraction
/// is clamped.
fn clock(t: &NaiveTime) -> (u8, u8, u8, u32) {
    (
        t.hour() as u8,
        t.minute() as u8,
        t.second() as u8,
        (t.nanosecond() / 1_000).min(999_999),
    )
}
