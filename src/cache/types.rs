//! Type definitions for the cache.

use chrono::NaiveDateTime;
use serde::Serialize;

/// One row of the cache table.
///
/// `id` is assigned by SQLite on insert and never reused. The timestamps are
/// stored as text in the handle's configured format, host local time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub id: i64,
    pub key: String,
    pub value: String,
    pub create_time: String,
    pub update_time: String,
}

impl Record {
    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            key: row.get(1)?,
            value: row.get(2)?,
            create_time: row.get(3)?,
            update_time: row.get(4)?,
        })
    }

    /// Parses `create_time` with the given format.
    #[must_use]
    pub fn created_at(&self, format: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.create_time, format).ok()
    }

    /// Parses `update_time` with the given format.
    #[must_use]
    pub fn updated_at(&self, format: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.update_time, format).ok()
    }
}
