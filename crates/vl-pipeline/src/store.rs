//! Persistence and storage seams consumed by the orchestrator.

use std::path::PathBuf;

use vl_core::{NewRendition, Result, Video, VideoId, VideoVariant};

/// Durable record of videos and their renditions.
pub trait JobStore: Send + Sync {
    /// Load a video by id, `None` if it does not exist.
    fn load(&self, id: VideoId) -> Result<Option<Video>>;

    /// Persist the status and error of `video`.
    ///
    /// Implementations must reject a write whose status is not reachable from
    /// the stored status with [`vl_core::Error::Conflict`], so two runs can
    /// never both claim the same video.
    fn save(&self, video: &Video) -> Result<()>;

    /// Record one successfully produced rendition.
    fn append_rendition(&self, video_id: VideoId, rendition: NewRendition)
        -> Result<VideoVariant>;
}

/// Key-addressed blob storage organised in named disks.
pub trait BlobStore: Send + Sync {
    /// Resolve an existing blob to a local path the encoder can read.
    fn resolve_readable(&self, disk: &str, key: &str) -> Result<PathBuf>;

    /// Resolve a blob key to a local path the encoder can write to.
    fn resolve_writable(&self, disk: &str, key: &str) -> Result<PathBuf>;
}
