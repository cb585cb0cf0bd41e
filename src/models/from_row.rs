use rusqlite::{types::Type, Row};
use serde::de::DeserializeOwned;

pub trait FromSqliteRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Conversion failure attributed to a named column of `row`.
pub(crate) fn conversion_error(
    row: &Row,
    column: &str,
    err: Box<dyn std::error::Error + Send + Sync>,
) -> rusqlite::Error {
    let index = row.as_ref().column_index(column).unwrap_or_default();
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, err)
}

/// Decode a JSON text column. NULL and empty text decode to `T::default()`.
pub(crate) fn json_column<T: DeserializeOwned + Default>(
    row: &Row,
    column: &str,
) -> rusqlite::Result<T> {
    let raw: Option<String> = row.get(column)?;
    match raw {
        Some(text) if !text.is_empty() => {
            serde_json::from_str(&text).map_err(|e| conversion_error(row, column, Box::new(e)))
        }
        _ => Ok(T::default()),
    }
}
