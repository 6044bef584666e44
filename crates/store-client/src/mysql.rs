//! MySQL-protocol connector built on `mysql_async`.
//!
//! Statements go over the text protocol, so column values arrive as bytes
//! and are converted into [`SqlValue`]s using the column metadata.

use crate::error::StoreError;
use crate::session::{Connector, QueryOutcome, Session};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use mysql_async::consts::{ColumnFlags, ColumnType};
use mysql_async::prelude::*;
use mysql_async::{Column, Conn, OptsBuilder, Row, Value};
use replay_core::{ResultSet, SqlValue};

/// The `binary` pseudo character set reported for BLOB and BINARY columns.
const BINARY_CHARSET: u16 = 63;

/// Where and as whom to connect.
#[derive(Debug, Clone)]
pub struct MySqlOpts {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

/// Opens `mysql_async` connections with [`MySqlOpts`].
#[derive(Debug, Clone)]
pub struct MySqlConnector {
    opts: MySqlOpts,
    time_zone: Tz,
}

impl MySqlConnector {
    /// `time_zone` must match the client's zone: TIMESTAMP columns are read
    /// back as wall-clock time in that zone.
    pub fn new(opts: MySqlOpts, time_zone: Tz) -> Self {
        Self { opts, time_zone }
    }
}

#[async_trait]
impl Connector for MySqlConnector {
    type Session = MySqlSession;

    async fn connect(&self) -> Result<MySqlSession, StoreError> {
        let builder = OptsBuilder::default()
            .ip_or_hostname(self.opts.host.clone())
            .tcp_port(self.opts.port)
            .user(Some(self.opts.user.clone()))
            .pass(Some(self.opts.password.clone()));

        let conn = Conn::new(builder).await.map_err(|e| {
            StoreError::connection(format!(
                "cannot connect to {}:{}: {e}",
                self.opts.host, self.opts.port
            ))
        })?;

        Ok(MySqlSession {
            conn,
            time_zone: self.time_zone,
        })
    }
}

/// One open `mysql_async` connection.
pub struct MySqlSession {
    conn: Conn,
    time_zone: Tz,
}

#[async_trait]
impl Session for MySqlSession {
    async fn execute(&mut self, sql: &str) -> Result<QueryOutcome, StoreError> {
        let tz = self.time_zone;
        let mut result = self.conn.query_iter(sql).await?;

        let columns = result.columns().filter(|cols| !cols.is_empty());
        let outcome = match columns {
            None => QueryOutcome::Affected(result.affected_rows()),
            Some(columns) => {
                let rows: Vec<Row> = result.collect().await?;
                let names = columns.iter().map(|c| c.name_str().into_owned()).collect();
                let values = rows
                    .into_iter()
                    .map(|row| convert_row(row, &columns, &tz))
                    .collect();
                QueryOutcome::Rows(ResultSet::new(names, values)?)
            }
        };

        // Discard any further result sets of a multi-statement batch.
        result.drop_result().await?;
        Ok(outcome)
    }

    async fn close(self) -> Result<(), StoreError> {
        self.conn.disconnect().await?;
        Ok(())
    }
}

fn convert_row(mut row: Row, columns: &[Column], tz: &Tz) -> Vec<SqlValue> {
    columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let value = row.take::<Value, usize>(i).unwrap_or(Value::NULL);
            convert_value(value, column, tz)
        })
        .collect()
}

/// Convert one column value according to the column's type and flags.
fn convert_value(value: Value, column: &Column, tz: &Tz) -> SqlValue {
    let bytes = match value {
        Value::NULL => return SqlValue::Null,
        Value::Int(i) => return SqlValue::Int(i),
        Value::UInt(u) => return SqlValue::UInt(u),
        Value::Float(f) => return SqlValue::Float(f64::from(f)),
        Value::Double(d) => return SqlValue::Float(d),
        Value::Date(y, mo, d, h, mi, s, us) => {
            return date_parts(y, mo, d, h, mi, s, us)
                .map(SqlValue::DateTime)
                .unwrap_or(SqlValue::Null)
        }
        Value::Time(neg, days, h, mi, s, us) => {
            let time = (!neg && days == 0)
                .then(|| NaiveTime::from_hms_micro_opt(h.into(), mi.into(), s.into(), us))
                .flatten();
            return match time {
                Some(t) => SqlValue::Time(t),
                None => SqlValue::Text(format!(
                    "{}{}:{mi:02}:{s:02}.{us:06}",
                    if neg { "-" } else { "" },
                    days * 24 + u32::from(h)
                )),
            };
        }
        Value::Bytes(bytes) => bytes,
    };

    use ColumnType::*;
    let text = std::str::from_utf8(&bytes).ok();
    let unsigned = column.flags().contains(ColumnFlags::UNSIGNED_FLAG);
    let converted = match column.column_type() {
        MYSQL_TYPE_TINY | MYSQL_TYPE_SHORT | MYSQL_TYPE_INT24 | MYSQL_TYPE_LONG
        | MYSQL_TYPE_LONGLONG | MYSQL_TYPE_YEAR => {
            if unsigned {
                text.and_then(|t| t.parse().ok()).map(SqlValue::UInt)
            } else {
                text.and_then(|t| t.parse().ok()).map(SqlValue::Int)
            }
        }
        MYSQL_TYPE_FLOAT | MYSQL_TYPE_DOUBLE => {
            text.and_then(|t| t.parse().ok()).map(SqlValue::Float)
        }
        MYSQL_TYPE_DECIMAL | MYSQL_TYPE_NEWDECIMAL => {
            text.map(|t| SqlValue::Decimal(t.to_string()))
        }
        MYSQL_TYPE_DATE | MYSQL_TYPE_NEWDATE => text
            .and_then(|t| NaiveDate::parse_from_str(t, "%Y-%m-%d").ok())
            .map(SqlValue::Date),
        MYSQL_TYPE_TIME | MYSQL_TYPE_TIME2 => text
            .and_then(|t| NaiveTime::parse_from_str(t, "%H:%M:%S%.f").ok())
            .map(SqlValue::Time),
        MYSQL_TYPE_DATETIME | MYSQL_TYPE_DATETIME2 => {
            text.and_then(parse_datetime).map(SqlValue::DateTime)
        }
        MYSQL_TYPE_TIMESTAMP | MYSQL_TYPE_TIMESTAMP2 => text
            .and_then(parse_datetime)
            .and_then(|naive| tz.from_local_datetime(&naive).earliest())
            .map(|local| SqlValue::Timestamp(local.with_timezone(&Utc))),
        MYSQL_TYPE_BIT | MYSQL_TYPE_GEOMETRY => Some(SqlValue::Bytes(bytes.clone())),
        _ if column.character_set() == BINARY_CHARSET => Some(SqlValue::Bytes(bytes.clone())),
        _ => None,
    };

    // Zero dates, out-of-range times and other values without a typed
    // counterpart keep their textual form.
    converted.unwrap_or_else(|| match String::from_utf8(bytes) {
        Ok(text) => SqlValue::Text(text),
        Err(err) => SqlValue::Bytes(err.into_bytes()),
    })
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f").ok()
}

fn date_parts(y: u16, mo: u8, d: u8, h: u8, mi: u8, s: u8, us: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(y.into(), mo.into(), d.into())?.and_hms_micro_opt(
        h.into(),
        mi.into(),
        s.into(),
        us,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Asia::Tokyo;

    fn text(value: &str) -> Value {
        Value::Bytes(value.as_bytes().to_vec())
    }

    fn column(column_type: ColumnType) -> Column {
        Column::new(column_type).with_character_set(45)
    }

    #[test]
    fn test_integers_follow_the_unsigned_flag() {
        let signed = column(ColumnType::MYSQL_TYPE_LONG);
        assert_eq!(convert_value(text("-7"), &signed, &Tz::UTC), SqlValue::Int(-7));

        let unsigned =
            column(ColumnType::MYSQL_TYPE_LONGLONG).with_flags(ColumnFlags::UNSIGNED_FLAG);
        assert_eq!(
            convert_value(text("18446744073709551615"), &unsigned, &Tz::UTC),
            SqlValue::UInt(u64::MAX)
        );
    }

    #[test]
    fn test_decimals_keep_their_exact_text() {
        let col = column(ColumnType::MYSQL_TYPE_NEWDECIMAL);
        assert_eq!(
            convert_value(text("12.500"), &col, &Tz::UTC),
            SqlValue::Decimal("12.500".into())
        );
    }

    #[test]
    fn test_binary_charset_yields_bytes() {
        let blob = Column::new(ColumnType::MYSQL_TYPE_BLOB).with_character_set(BINARY_CHARSET);
        assert_eq!(
            convert_value(Value::Bytes(vec![0xff, 0x00]), &blob, &Tz::UTC),
            SqlValue::Bytes(vec![0xff, 0x00])
        );

        let varchar = column(ColumnType::MYSQL_TYPE_VAR_STRING);
        assert_eq!(
            convert_value(text("héllo"), &varchar, &Tz::UTC),
            SqlValue::Text("héllo".into())
        );
    }

    #[test]
    fn test_timestamps_are_read_in_the_session_zone() {
        let col = column(ColumnType::MYSQL_TYPE_TIMESTAMP);
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            convert_value(text("2024-01-01 09:00:00"), &col, &Tokyo),
            SqlValue::Timestamp(expected)
        );
        assert_eq!(
            convert_value(text("2024-01-01 00:00:00"), &col, &Tz::UTC),
            SqlValue::Timestamp(expected)
        );
    }

    #[test]
    fn test_datetimes_and_dates() {
        let expected = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_micro_opt(23, 59, 58, 500_000)
            .unwrap();
        let col = column(ColumnType::MYSQL_TYPE_DATETIME);
        assert_eq!(
            convert_value(text("2024-02-29 23:59:58.500000"), &col, &Tokyo),
            SqlValue::DateTime(expected)
        );

        let col = column(ColumnType::MYSQL_TYPE_DATE);
        assert_eq!(
            convert_value(text("2024-02-29"), &col, &Tz::UTC),
            SqlValue::Date(expected.date())
        );
    }

    #[test]
    fn test_zero_dates_stay_text() {
        let col = column(ColumnType::MYSQL_TYPE_DATE);
        assert_eq!(
            convert_value(text("0000-00-00"), &col, &Tz::UTC),
            SqlValue::Text("0000-00-00".into())
        );

        let col = column(ColumnType::MYSQL_TYPE_DATETIME);
        assert_eq!(
            convert_value(text("0000-00-00 00:00:00"), &col, &Tz::UTC),
            SqlValue::Text("0000-00-00 00:00:00".into())
        );
    }

    #[test]
    fn test_null_is_null_for_every_type() {
        for column_type in [
            ColumnType::MYSQL_TYPE_LONG,
            ColumnType::MYSQL_TYPE_TIMESTAMP,
            ColumnType::MYSQL_TYPE_BLOB,
        ] {
            assert_eq!(
                convert_value(Value::NULL, &column(column_type), &Tokyo),
                SqlValue::Null
            );
        }
    }
}
