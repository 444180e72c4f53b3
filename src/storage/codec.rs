//! Column encodings for domain types
//!
//! Money and ids are stored as plain integers. Datetimes are stored as
//! fixed-width local-time text, so comparing the text in SQL orders rows
//! chronologically.

use chrono::{Local, NaiveDateTime, Timelike};
use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::Row;

use crate::models::{BudgetId, CategoryId, ExpenseId, Money};

/// Storage format for datetimes; always microsecond precision
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Encode a datetime for storage
pub fn encode_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

/// Decode a stored datetime
pub fn decode_datetime(text: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
}

/// Current local time at storage precision
pub fn now() -> NaiveDateTime {
    truncate_to_micros(Local::now().naive_local())
}

/// Drop sub-microsecond precision so a value survives a storage round trip
pub fn truncate_to_micros(dt: NaiveDateTime) -> NaiveDateTime {
    dt.with_nanosecond(dt.nanosecond() / 1_000 * 1_000)
        .unwrap_or(dt)
}

/// Read a datetime column from a row
pub fn datetime_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let text: String = row.get(idx)?;
    decode_datetime(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

impl ToSql for Money {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.cents()))
    }
}

impl FromSql for Money {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(Money::from_cents)
    }
}

macro_rules! impl_id_sql {
    ($($name:ident),*) => {
        $(
            impl ToSql for $name {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.raw()))
                }
            }

            impl FromSql for $name {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    i64::column_result(value).map($name::from_raw)
                }
            }
        )*
    };
}

impl_id_sql!(CategoryId, ExpenseId, BudgetId);

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_datetime_text_is_fixed_width() {
        let whole = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(7, 5, 0)
            .unwrap();
        assert_eq!(encode_datetime(&whole), "2024-03-09T07:05:00.000000");

        let fractional = whole.with_nanosecond(123_456_789).unwrap();
        assert_eq!(encode_datetime(&fractional), "2024-03-09T07:05:00.123456");
    }

    #[test]
    fn test_datetime_text_sorts_chronologically() {
        let a = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        let b = a.with_nanosecond(1_000).unwrap();
        assert!(encode_datetime(&a) < encode_datetime(&b));
    }

    #[test]
    fn test_now_round_trips() {
        let t = now();
        assert_eq!(decode_datetime(&encode_datetime(&t)).unwrap(), t);
    }

    #[test]
    fn test_money_column() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let back: Money = conn
            .query_row("SELECT ?1", [Money::from_cents(1050)], |row| row.get(0))
            .unwrap();
        assert_eq!(back, Money::from_cents(1050));
    }
}
