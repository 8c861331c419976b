//! Video records and guarded status transitions.

use chrono::Utc;
use rusqlite::Connection;
use vl_core::{Error, Result, UserId, Video, VideoId, VideoStatus};

use crate::models::{FromRow, VIDEO_COLS};

/// Insert a freshly uploaded video.
pub fn create_video(
    conn: &Connection,
    user_id: UserId,
    name: &str,
    mime_type: &str,
    disk: &str,
    path: &str,
) -> Result<Video> {
    let video = Video::uploaded(user_id, name, mime_type, disk, path);
    insert_video(conn, &video)?;
    Ok(video)
}

/// Insert a fully-formed video record.
pub fn insert_video(conn: &Connection, video: &Video) -> Result<()> {
    conn.execute(
        "INSERT INTO videos (id, user_id, name, mime_type, disk, path, status, error, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        rusqlite::params![
            video.id.to_string(),
            video.user_id.to_string(),
            video.name,
            video.mime_type,
            video.disk,
            video.path,
            video.status.as_str(),
            video.error,
            video.created_at.to_rfc3339(),
            video.updated_at.to_rfc3339(),
        ],
    )
    .map_err(|e| {
        if e.to_string().contains("FOREIGN KEY constraint failed") {
            Error::not_found("user", video.user_id)
        } else {
            Error::database(e.to_string())
        }
    })?;
    Ok(())
}

/// Get a video by ID.
pub fn get_video(conn: &Connection, id: VideoId) -> Result<Option<Video>> {
    let q = format!("SELECT {VIDEO_COLS} FROM videos WHERE id = ?1");
    let result = conn.query_row(&q, [id.to_string()], Video::from_row);
    match result {
        Ok(v) => Ok(Some(v)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List videos, newest first, optionally filtered by status.
pub fn list_videos(conn: &Connection, status: Option<VideoStatus>) -> Result<Vec<Video>> {
    let (q, params): (String, Vec<String>) = match status {
        Some(s) => (
            format!(
                "SELECT {VIDEO_COLS} FROM videos WHERE status = ?1 ORDER BY created_at DESC"
            ),
            vec![s.as_str().to_string()],
        ),
        None => (
            format!("SELECT {VIDEO_COLS} FROM videos ORDER BY created_at DESC"),
            Vec::new(),
        ),
    };

    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(params.iter()), Video::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// IDs of videos awaiting processing, oldest first.
pub fn list_uploaded_ids(conn: &Connection) -> Result<Vec<VideoId>> {
    let mut stmt = conn
        .prepare("SELECT id FROM videos WHERE status = 'uploaded' ORDER BY created_at ASC")
        .map_err(|e| Error::database(e.to_string()))?;
    let ids = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    ids.iter()
        .map(|s| {
            s.parse()
                .map_err(|e| Error::database(format!("invalid video id '{s}': {e}")))
        })
        .collect()
}

/// Move a video to `status`, recording `error`.
///
/// The write only applies when the stored status is an allowed predecessor
/// of `status`; otherwise nothing changes and [`Error::Conflict`] is
/// returned. A missing video yields [`Error::NotFound`].
pub fn update_video_status(
    conn: &Connection,
    id: VideoId,
    status: VideoStatus,
    error: Option<&str>,
) -> Result<()> {
    let predecessors = status.predecessors();
    if predecessors.is_empty() {
        return Err(Error::Validation(format!(
            "videos cannot be moved back to '{status}'"
        )));
    }

    let allowed = predecessors
        .iter()
        .map(|s| format!("'{}'", s.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    let q = format!(
        "UPDATE videos SET status = ?1, error = ?2, updated_at = ?3
         WHERE id = ?4 AND status IN ({allowed})"
    );

    let n = conn
        .execute(
            &q,
            rusqlite::params![
                status.as_str(),
                error,
                Utc::now().to_rfc3339(),
                id.to_string()
            ],
        )
        .map_err(|e| Error::database(e.to_string()))?;

    if n > 0 {
        return Ok(());
    }

    match get_video(conn, id)? {
        None => Err(Error::not_found("video", id)),
        Some(current) => Err(Error::Conflict(format!(
            "video {id} is '{}'; cannot move to '{status}'",
            current.status
        ))),
    }
}

/// Delete a video (and, by cascade, its variants). Returns true if a row was
/// deleted.
pub fn delete_video(conn: &Connection, id: VideoId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM videos WHERE id = ?1", [id.to_string()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}
