//! Row mapping for the shared models.
//!
//! The record types live in `vl-core` so the pipeline can use them without a
//! database dependency; [`FromRow`] builds them from a `rusqlite::Row`.

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use uuid::Uuid;
use vl_core::{User, Video, VideoVariant};

/// Construct a value from a query row with a fixed column order.
pub trait FromRow: Sized {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self>;
}

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

fn conversion_error(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

/// Parse a UUID-based ID from a text column.
fn parse_id<T: From<Uuid>>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
    let s: String = row.get(idx)?;
    let uuid = Uuid::parse_str(&s).map_err(|e| conversion_error(idx, e))?;
    Ok(T::from(uuid))
}

/// Parse an RFC 3339 timestamp from a text column.
fn parse_time(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

/// Parse a text column through `FromStr`.
fn parse_text<T>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let s: String = row.get(idx)?;
    s.parse().map_err(|e| conversion_error(idx, e))
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

pub(crate) const USER_COLS: &str = "id, name, email, created_at";

impl FromRow for User {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            created_at: parse_time(row, 3)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Video
// ---------------------------------------------------------------------------

pub(crate) const VIDEO_COLS: &str =
    "id, user_id, name, mime_type, disk, path, status, error, created_at, updated_at";

impl FromRow for Video {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            user_id: parse_id(row, 1)?,
            name: row.get(2)?,
            mime_type: row.get(3)?,
            disk: row.get(4)?,
            path: row.get(5)?,
            status: parse_text(row, 6)?,
            error: row.get(7)?,
            created_at: parse_time(row, 8)?,
            updated_at: parse_time(row, 9)?,
        })
    }
}

// ---------------------------------------------------------------------------
// VideoVariant
// ---------------------------------------------------------------------------

pub(crate) const VARIANT_COLS: &str =
    "id, video_id, name, resolution, mime_type, disk, path, created_at, updated_at";

impl FromRow for VideoVariant {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            video_id: parse_id(row, 1)?,
            name: row.get(2)?,
            resolution: parse_text(row, 3)?,
            mime_type: row.get(4)?,
            disk: row.get(5)?,
            path: row.get(6)?,
            created_at: parse_time(row, 7)?,
            updated_at: parse_time(row, 8)?,
        })
    }
}
