//! Column encodings shared by the repositories.
//!
//! Timestamps are stored as microseconds since the epoch, UUIDs and civil
//! dates as text, enums by their wire name, lists and maps as JSON text.

use std::str::FromStr;

use jiff::Timestamp;
use jiff::civil::Date;
use rusqlite::Row;
use rusqlite::types::Type;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use vigil_core::error::CoreError;

fn conversion_error<E>(row: &Row<'_>, column: &str, ty: Type, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    let idx = row.as_ref().column_index(column).unwrap_or_default();
    rusqlite::Error::FromSqlConversionFailure(idx, ty, Box::new(err))
}

pub fn ts_to_sql(ts: Timestamp) -> i64 {
    ts.as_microsecond()
}

pub fn opt_ts_to_sql(ts: Option<Timestamp>) -> Option<i64> {
    ts.map(ts_to_sql)
}

pub fn ts(row: &Row<'_>, column: &str) -> rusqlite::Result<Timestamp> {
    let micros: i64 = row.get(column)?;
    Timestamp::from_microsecond(micros).map_err(|e| conversion_error(row, column, Type::Integer, e))
}

pub fn opt_ts(row: &Row<'_>, column: &str) -> rusqlite::Result<Option<Timestamp>> {
    let micros: Option<i64> = row.get(column)?;
    micros
        .map(|m| {
            Timestamp::from_microsecond(m)
                .map_err(|e| conversion_error(row, column, Type::Integer, e))
        })
        .transpose()
}

pub fn uuid(row: &Row<'_>, column: &str) -> rusqlite::Result<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text).map_err(|e| conversion_error(row, column, Type::Text, e))
}

pub fn opt_uuid(row: &Row<'_>, column: &str) -> rusqlite::Result<Option<Uuid>> {
    let text: Option<String> = row.get(column)?;
    text.map(|t| Uuid::parse_str(&t).map_err(|e| conversion_error(row, column, Type::Text, e)))
        .transpose()
}

pub fn date(row: &Row<'_>, column: &str) -> rusqlite::Result<Date> {
    let text: String = row.get(column)?;
    text.parse::<Date>()
        .map_err(|e| conversion_error(row, column, Type::Text, e))
}

pub fn text_enum<E>(row: &Row<'_>, column: &str) -> rusqlite::Result<E>
where
    E: FromStr<Err = CoreError>,
{
    let text: String = row.get(column)?;
    text.parse::<E>()
        .map_err(|e| conversion_error(row, column, Type::Text, e))
}

pub fn opt_text_enum<E>(row: &Row<'_>, column: &str) -> rusqlite::Result<Option<E>>
where
    E: FromStr<Err = CoreError>,
{
    let text: Option<String> = row.get(column)?;
    text.map(|t| {
        t.parse::<E>()
            .map_err(|e| conversion_error(row, column, Type::Text, e))
    })
    .transpose()
}

pub fn json<T: DeserializeOwned>(row: &Row<'_>, column: &str) -> rusqlite::Result<T> {
    let text: String = row.get(column)?;
    serde_json::from_str(&text).map_err(|e| conversion_error(row, column, Type::Text, e))
}

pub fn opt_json<T: DeserializeOwned>(row: &Row<'_>, column: &str) -> rusqlite::Result<Option<T>> {
    let text: Option<String> = row.get(column)?;
    text.map(|t| serde_json::from_str(&t).map_err(|e| conversion_error(row, column, Type::Text, e)))
        .transpose()
}

/// Escape `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern.
pub fn like_pattern(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for c in needle.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Ab_1%"), "%ab\\_1\\%%");
    }
}
