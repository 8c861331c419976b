//! Video and rendition records shared by the pipeline and the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{UserId, VariantId, VideoId};
use crate::media::{Resolution, VideoStatus};

/// One uploaded source video; the unit of processing work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: VideoId,
    pub user_id: UserId,
    pub name: String,
    pub mime_type: String,
    pub disk: String,
    pub path: String,
    pub status: VideoStatus,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    /// A freshly uploaded video awaiting processing.
    pub fn uploaded(
        user_id: UserId,
        name: impl Into<String>,
        mime_type: impl Into<String>,
        disk: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: VideoId::new(),
            user_id,
            name: name.into(),
            mime_type: mime_type.into(),
            disk: disk.into(),
            path: path.into(),
            status: VideoStatus::Uploaded,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A rendition about to be recorded for a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRendition {
    pub name: String,
    pub resolution: Resolution,
    pub mime_type: String,
    pub disk: String,
    pub path: String,
}

/// A recorded rendition. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoVariant {
    pub id: VariantId,
    pub video_id: VideoId,
    pub name: String,
    pub resolution: Resolution,
    pub mime_type: String,
    pub disk: String,
    pub path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoVariant {
    pub fn from_new(video_id: VideoId, rendition: NewRendition) -> Self {
        let now = Utc::now();
        Self {
            id: VariantId::new(),
            video_id,
            name: rendition.name,
            resolution: rendition.resolution,
            mime_type: rendition.mime_type,
            disk: rendition.disk,
            path: rendition.path,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Owner of uploaded videos; notification recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}
