//! [`EncodingEngine`] backed by the ffmpeg and ffprobe binaries.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use vl_core::config::ToolsConfig;
use vl_pipeline::{EncodingEngine, ProbeReport, TranscodeRequest};

use crate::actions::encode_rendition;
use crate::probe::FfprobeProber;
use crate::tools::ToolRegistry;

/// Encoding engine that shells out to ffmpeg/ffprobe.
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    tools: ToolRegistry,
    threads: u32,
    timeout: Option<Duration>,
}

impl FfmpegEngine {
    pub fn new(tools: ToolRegistry, threads: u32, timeout: Option<Duration>) -> Self {
        Self {
            tools,
            threads,
            timeout,
        }
    }

    /// Discover the tools and adopt the configured limits. A zero
    /// `timeout_secs` leaves probe and encode calls unbounded.
    pub fn from_config(config: &ToolsConfig) -> Self {
        Self::new(ToolRegistry::discover(config), config.threads, config.timeout())
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }
}

#[async_trait]
impl EncodingEngine for FfmpegEngine {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn probe(&self, input: &Path) -> vl_core::Result<ProbeReport> {
        let ffprobe = self.tools.require("ffprobe")?;
        FfprobeProber::new(ffprobe.path.clone(), self.timeout)
            .probe(input)
            .await
    }

    async fn transcode(&self, request: &TranscodeRequest) -> vl_core::Result<()> {
        let ffmpeg = self.tools.require("ffmpeg")?;
        encode_rendition(&ffmpeg.path, request, self.threads, self.timeout).await
    }
}
