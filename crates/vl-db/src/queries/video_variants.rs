//! Rendition records. Insert-only; removed by cascade with their video.

use rusqlite::Connection;
use vl_core::{Error, NewRendition, Result, VideoId, VideoVariant};

use crate::models::{FromRow, VARIANT_COLS};

/// Record a produced rendition for `video_id`.
pub fn create_variant(
    conn: &Connection,
    video_id: VideoId,
    rendition: NewRendition,
) -> Result<VideoVariant> {
    let variant = VideoVariant::from_new(video_id, rendition);

    conn.execute(
        "INSERT INTO video_variants (id, video_id, name, resolution, mime_type, disk, path, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            variant.id.to_string(),
            video_id.to_string(),
            variant.name,
            variant.resolution.tag(),
            variant.mime_type,
            variant.disk,
            variant.path,
            variant.created_at.to_rfc3339(),
            variant.updated_at.to_rfc3339(),
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(variant)
}

/// Variants of a video in insertion order.
pub fn list_variants_for_video(conn: &Connection, video_id: VideoId) -> Result<Vec<VideoVariant>> {
    let q = format!(
        "SELECT {VARIANT_COLS} FROM video_variants WHERE video_id = ?1 ORDER BY rowid ASC"
    );
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([video_id.to_string()], VideoVariant::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Number of variants recorded for a video.
pub fn count_variants(conn: &Connection, video_id: VideoId) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM video_variants WHERE video_id = ?1",
        [video_id.to_string()],
        |row| row.get(0),
    )
    .map_err(|e| Error::database(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;
    use crate::queries::{users, videos};
    use vl_core::Resolution;

    fn rendition(resolution: Resolution) -> NewRendition {
        NewRendition {
            name: "clip".into(),
            resolution,
            mime_type: "video/mp4".into(),
            disk: "local".into(),
            path: format!("videos/clip_{resolution}.mp4"),
        }
    }

    #[test]
    fn create_and_list_in_order() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let user = users::create_user(&conn, "Ada", "ada@example.com").unwrap();
        let video =
            videos::create_video(&conn, user.id, "clip", "video/mp4", "local", "videos/clip.mp4")
                .unwrap();

        create_variant(&conn, video.id, rendition(Resolution::Hd)).unwrap();
        create_variant(&conn, video.id, rendition(Resolution::Sd)).unwrap();

        let variants = list_variants_for_video(&conn, video.id).unwrap();
        let tags: Vec<Resolution> = variants.iter().map(|v| v.resolution).collect();
        assert_eq!(tags, vec![Resolution::Hd, Resolution::Sd]);
        assert_eq!(variants[0].path, "videos/clip_720p.mp4");
        assert_eq!(count_variants(&conn, video.id).unwrap(), 2);
    }

    #[test]
    fn unknown_video_is_rejected() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let err = create_variant(&conn, VideoId::new(), rendition(Resolution::Sd)).unwrap_err();
        assert!(err.is_persistence());
    }

    #[test]
    fn deleting_video_cascades() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let user = users::create_user(&conn, "Ada", "ada@example.com").unwrap();
        let video =
            videos::create_video(&conn, user.id, "clip", "video/mp4", "local", "clip.mp4").unwrap();
        create_variant(&conn, video.id, rendition(Resolution::Sd)).unwrap();

        videos::delete_video(&conn, video.id).unwrap();
        assert_eq!(count_variants(&conn, video.id).unwrap(), 0);
    }
}
