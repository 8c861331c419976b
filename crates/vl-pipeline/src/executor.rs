//! Single-rendition transcoding.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use vl_core::{Error, Resolution, Result, Video};

use crate::engine::{EncodingEngine, TranscodeRequest};
use crate::store::BlobStore;

/// Where a produced rendition landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenditionOutput {
    pub resolution: Resolution,
    /// Display name, the file name of the rendition (`holiday_720p.mp4`).
    pub name: String,
    pub disk: String,
    /// Storage key on `disk`.
    pub key: String,
    /// Local path the engine wrote to.
    pub local_path: PathBuf,
}

/// Drives the engine for one (source, rendition) pair.
///
/// Output goes to `<dir>/<stem>_<tag>.mp4` on the source's disk, so a re-run
/// overwrites the previous attempt. Nothing is persisted here.
pub struct TranscodeExecutor {
    engine: Arc<dyn EncodingEngine>,
    blobs: Arc<dyn BlobStore>,
    audio_bitrate_kbps: u32,
    timeout: Option<Duration>,
}

impl TranscodeExecutor {
    pub fn new(
        engine: Arc<dyn EncodingEngine>,
        blobs: Arc<dyn BlobStore>,
        audio_bitrate_kbps: u32,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            engine,
            blobs,
            audio_bitrate_kbps,
            timeout,
        }
    }

    /// Encode `source` (the resolved local copy of `video`) into `resolution`.
    ///
    /// Any failure is reported as [`Error::Transcode`] tagged with the
    /// rendition.
    pub async fn execute(
        &self,
        video: &Video,
        source: &Path,
        resolution: Resolution,
    ) -> Result<RenditionOutput> {
        let key = rendition_key(&video.path, resolution);
        let local_path = self
            .blobs
            .resolve_writable(&video.disk, &key)
            .map_err(|e| Error::transcode(resolution, e.to_string()))?;

        let request = TranscodeRequest {
            input: source.to_path_buf(),
            output: local_path.clone(),
            fit: resolution.dimensions(),
            video_bitrate_kbps: resolution.bitrate_kbps(),
            audio_bitrate_kbps: self.audio_bitrate_kbps,
        };

        tracing::debug!(
            video_id = %video.id,
            resolution = %resolution,
            output = %local_path.display(),
            "Starting rendition encode"
        );

        let encode = self.engine.transcode(&request);
        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, encode).await {
                Ok(r) => r,
                Err(_) => {
                    return Err(Error::transcode(
                        resolution,
                        format!("timed out after {}s", limit.as_secs()),
                    ))
                }
            },
            None => encode.await,
        };

        result.map_err(|e| match e {
            Error::Transcode { .. } => e,
            other => Error::transcode(resolution, other.to_string()),
        })?;

        Ok(RenditionOutput {
            resolution,
            name: file_name(&key).to_string(),
            disk: video.disk.clone(),
            key,
            local_path,
        })
    }
}

/// Storage key of the `resolution` rendition of the blob at `source_key`.
pub fn rendition_key(source_key: &str, resolution: Resolution) -> String {
    let stem = file_stem(source_key);
    match source_key.rsplit_once('/') {
        Some((dir, _)) if !dir.is_empty() => format!("{dir}/{stem}_{resolution}.mp4"),
        Some(_) => format!("/{stem}_{resolution}.mp4"),
        None => format!("{stem}_{resolution}.mp4"),
    }
}

fn file_name(key: &str) -> &str {
    key.rsplit_once('/').map_or(key, |(_, f)| f)
}

fn file_stem(key: &str) -> &str {
    let file = file_name(key);
    match file.rfind('.') {
        Some(0) | None => file,
        Some(i) => &file[..i],
    }
}
