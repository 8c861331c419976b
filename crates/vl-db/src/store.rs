//! [`JobStore`] backed by the SQLite pool.

use vl_core::{NewRendition, Result, Video, VideoId, VideoVariant};
use vl_pipeline::JobStore;

use crate::pool::{get_conn, DbPool};
use crate::queries::{video_variants, videos};

/// Job store persisting to SQLite.
///
/// Status writes are guarded by the allowed predecessor statuses, so a
/// second run racing for the same video loses with a conflict.
#[derive(Clone)]
pub struct SqliteJobStore {
    pool: DbPool,
}

impl SqliteJobStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl JobStore for SqliteJobStore {
    fn load(&self, id: VideoId) -> Result<Option<Video>> {
        let conn = get_conn(&self.pool)?;
        videos::get_video(&conn, id)
    }

    fn save(&self, video: &Video) -> Result<()> {
        let conn = get_conn(&self.pool)?;
        videos::update_video_status(&conn, video.id, video.status, video.error.as_deref())
    }

    fn append_rendition(
        &self,
        video_id: VideoId,
        rendition: NewRendition,
    ) -> Result<VideoVariant> {
        let conn = get_conn(&self.pool)?;
        video_variants::create_variant(&conn, video_id, rendition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;
    use crate::queries::users;
    use vl_core::{Error, Resolution, VideoStatus};

    fn store_with_video() -> (SqliteJobStore, Video) {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let user = users::create_user(&conn, "Ada", "ada@example.com").unwrap();
        let video =
            videos::create_video(&conn, user.id, "clip", "video/mp4", "local", "clip.mp4").unwrap();
        drop(conn);
        (SqliteJobStore::new(pool), video)
    }

    #[test]
    fn load_save_roundtrip() {
        let (store, mut video) = store_with_video();

        video.status = VideoStatus::Processing;
        store.save(&video).unwrap();

        let loaded = store.load(video.id).unwrap().unwrap();
        assert_eq!(loaded.status, VideoStatus::Processing);
    }

    #[test]
    fn concurrent_claim_loses() {
        let (store, mut video) = store_with_video();
        video.status = VideoStatus::Processing;
        store.save(&video).unwrap();

        let err = store.save(&video).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn append_rendition_persists() {
        let (store, video) = store_with_video();
        let variant = store
            .append_rendition(
                video.id,
                NewRendition {
                    name: "clip".into(),
                    resolution: Resolution::Sd,
                    mime_type: "video/mp4".into(),
                    disk: "local".into(),
                    path: "clip_480p.mp4".into(),
                },
            )
            .unwrap();

        let conn = store.pool().get().unwrap();
        let listed = video_variants::list_variants_for_video(&conn, video.id).unwrap();
        assert_eq!(listed, vec![variant]);
    }
}
