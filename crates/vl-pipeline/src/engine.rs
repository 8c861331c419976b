//! The external encoding engine, reduced to probe and transcode.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use vl_core::{Dimensions, Result};

/// Kind of elementary stream reported by a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
    Other,
}

/// One stream in a probed source.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    pub kind: StreamKind,
    pub codec: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

impl StreamInfo {
    /// Convenience constructor for a video stream.
    pub fn video(width: i64, height: i64) -> Self {
        Self {
            kind: StreamKind::Video,
            codec: None,
            width: Some(width),
            height: Some(height),
        }
    }
}

/// Raw stream metadata as reported by the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbeReport {
    pub format: Option<String>,
    pub duration_secs: Option<f64>,
    pub streams: Vec<StreamInfo>,
}

/// One rendition encode.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Box the output must fit inside, aspect ratio preserved.
    pub fit: Dimensions,
    pub video_bitrate_kbps: u32,
    pub audio_bitrate_kbps: u32,
}

/// Engine capable of inspecting and re-encoding media files.
#[async_trait]
pub trait EncodingEngine: Send + Sync {
    /// Short engine name used in logs.
    fn name(&self) -> &'static str;

    /// Read stream metadata from `input`.
    async fn probe(&self, input: &Path) -> Result<ProbeReport>;

    /// Encode `request.input` into `request.output`.
    async fn transcode(&self, request: &TranscodeRequest) -> Result<()>;
}
