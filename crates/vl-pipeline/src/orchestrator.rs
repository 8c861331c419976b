//! The processing state machine for one video.
//!
//! `uploaded -> processing -> {complete | failed}`. A run only starts from
//! `uploaded`; everything after the claim ends with exactly one completion
//! signal.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future;
use futures::stream::{self, StreamExt};
use vl_core::config::Config;
use vl_core::events::JobFinished;
use vl_core::{
    Error, NewRendition, Resolution, Result, Video, VideoId, VideoStatus, VideoVariant,
};

use crate::engine::EncodingEngine;
use crate::executor::{RenditionOutput, TranscodeExecutor};
use crate::planner::plan;
use crate::probe::MediaProbe;
use crate::sink::CompletionSink;
use crate::store::{BlobStore, JobStore};

/// Tunables for [`VideoProcessor`].
#[derive(Debug, Clone)]
pub struct ProcessorOptions {
    pub audio_bitrate_kbps: u32,
    /// Renditions encoded concurrently within one job.
    pub max_parallel_renditions: usize,
    /// Turn "renditions planned, none produced" into `failed`.
    pub fail_when_no_renditions_succeed: bool,
    /// Ceiling on each probe and encode call.
    pub engine_timeout: Option<Duration>,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            audio_bitrate_kbps: 160,
            max_parallel_renditions: 1,
            fail_when_no_renditions_succeed: false,
            engine_timeout: None,
        }
    }
}

impl ProcessorOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            audio_bitrate_kbps: config.processing.audio_bitrate_kbps,
            max_parallel_renditions: config.processing.max_parallel_renditions.max(1),
            fail_when_no_renditions_succeed: config.processing.fail_when_no_renditions_succeed,
            engine_timeout: config.tools.timeout(),
        }
    }
}

/// Result of a single rendition attempt.
#[derive(Debug, Clone)]
pub enum RenditionOutcome {
    Recorded(VideoVariant),
    Failed { resolution: Resolution, error: String },
}

impl RenditionOutcome {
    pub fn resolution(&self) -> Resolution {
        match self {
            Self::Recorded(v) => v.resolution,
            Self::Failed { resolution, .. } => *resolution,
        }
    }

    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded(_))
    }
}

/// Summary of one `run_job` call that got past the precondition check.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub video_id: VideoId,
    pub status: VideoStatus,
    pub error: Option<String>,
    pub planned: Vec<Resolution>,
    pub outcomes: Vec<RenditionOutcome>,
}

impl JobReport {
    pub fn recorded(&self) -> impl Iterator<Item = &VideoVariant> {
        self.outcomes.iter().filter_map(|o| match o {
            RenditionOutcome::Recorded(v) => Some(v),
            RenditionOutcome::Failed { .. } => None,
        })
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_recorded()).count()
    }
}

/// How processing ended before the final status is written.
enum Halt {
    /// Source resolution or probe failed; the job is `failed`.
    Fatal(Error),
    /// A produced artifact could not be recorded.
    Persistence(Error),
}

/// Runs processing jobs for uploaded videos.
pub struct VideoProcessor {
    store: Arc<dyn JobStore>,
    blobs: Arc<dyn BlobStore>,
    probe: MediaProbe,
    executor: TranscodeExecutor,
    sink: Arc<dyn CompletionSink>,
    catalog: Vec<Resolution>,
    options: ProcessorOptions,
}

impl VideoProcessor {
    pub fn new(
        store: Arc<dyn JobStore>,
        blobs: Arc<dyn BlobStore>,
        engine: Arc<dyn EncodingEngine>,
        sink: Arc<dyn CompletionSink>,
        options: ProcessorOptions,
    ) -> Self {
        let probe = MediaProbe::new(engine.clone(), options.engine_timeout);
        let executor = TranscodeExecutor::new(
            engine,
            blobs.clone(),
            options.audio_bitrate_kbps,
            options.engine_timeout,
        );
        Self {
            store,
            blobs,
            probe,
            executor,
            sink,
            catalog: Resolution::ALL.to_vec(),
            options,
        }
    }

    /// Restrict or reorder the renditions considered for every job.
    pub fn with_catalog(mut self, catalog: Vec<Resolution>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Process one uploaded video.
    ///
    /// Fails with [`Error::JobNotFound`] without touching anything when the
    /// video is missing or not `uploaded`. Once claimed, the job ends
    /// `complete` or `failed` and the completion sink is signalled once. An
    /// `Err` after the claim means a produced rendition could not be
    /// recorded.
    pub async fn run_job(&self, id: VideoId) -> Result<JobReport> {
        let mut video = self.claim(id)?;
        tracing::info!(video_id = %id, name = %video.name, "Processing video");

        let mut planned = Vec::new();
        let mut outcomes = Vec::new();
        let halted = self.drive(&video, &mut planned, &mut outcomes).await;

        let propagate = match halted {
            Ok(()) => {
                let recorded = outcomes.iter().filter(|o| o.is_recorded()).count();
                if !planned.is_empty()
                    && recorded == 0
                    && self.options.fail_when_no_renditions_succeed
                {
                    let msg = format!("all {} planned renditions failed", planned.len());
                    self.mark_failed(&mut video, msg);
                    None
                } else {
                    self.mark_complete(&mut video).err()
                }
            }
            Err(Halt::Fatal(e)) => {
                tracing::error!(video_id = %id, error = %e, "Video processing failed");
                self.mark_failed(&mut video, e.to_string());
                None
            }
            Err(Halt::Persistence(e)) => {
                self.mark_failed(&mut video, format!("failed to record rendition: {e}"));
                Some(e)
            }
        };

        let report = JobReport {
            video_id: id,
            status: video.status,
            error: video.error.clone(),
            planned,
            outcomes,
        };
        self.signal(&video, &report);

        match propagate {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }

    /// Load the video and move it to `processing`.
    fn claim(&self, id: VideoId) -> Result<Video> {
        let mut video = self
            .store
            .load(id)?
            .ok_or_else(|| Error::job_not_found(id, "no such video"))?;

        if video.status != VideoStatus::Uploaded {
            return Err(Error::job_not_found(
                id,
                format!("status is {}", video.status),
            ));
        }

        video.status = VideoStatus::Processing;
        video.error = None;
        match self.store.save(&video) {
            Ok(()) => Ok(video),
            Err(Error::Conflict(_)) => Err(Error::job_not_found(id, "claimed by another run")),
            Err(e) => Err(e),
        }
    }

    async fn drive(
        &self,
        video: &Video,
        planned: &mut Vec<Resolution>,
        outcomes: &mut Vec<RenditionOutcome>,
    ) -> std::result::Result<(), Halt> {
        let source = self
            .blobs
            .resolve_readable(&video.disk, &video.path)
            .map_err(Halt::Fatal)?;

        let dims = self.probe.dimensions(&source).await.map_err(Halt::Fatal)?;

        *planned = plan(dims, &self.catalog);
        if planned.is_empty() {
            tracing::info!(
                video_id = %video.id,
                source = %dims,
                "No rendition is smaller than the source; keeping original only"
            );
            return Ok(());
        }
        tracing::info!(
            video_id = %video.id,
            source = %dims,
            renditions = ?planned.iter().map(|r| r.tag()).collect::<Vec<_>>(),
            "Planned renditions"
        );

        // Once a recording fails no new encode starts, but the ones already
        // in flight are drained so their artifacts are reported.
        let halted = AtomicBool::new(false);
        let halted = &halted;
        let source = source.as_path();
        let mut encodes = stream::iter(planned.iter().copied())
            .take_while(move |_| future::ready(!halted.load(Ordering::Acquire)))
            .map(move |resolution| self.encode(video, source, resolution))
            .buffered(self.options.max_parallel_renditions.max(1));

        let mut failure = None;
        while let Some(result) = encodes.next().await {
            match result {
                Ok(output) if failure.is_some() => {
                    report_orphan(video, &output, "an earlier rendition could not be recorded");
                }
                Ok(output) => match self.record(video, &output) {
                    Ok(variant) => outcomes.push(RenditionOutcome::Recorded(variant)),
                    Err(e) => {
                        halted.store(true, Ordering::Release);
                        failure = Some(e);
                    }
                },
                Err((resolution, e)) => {
                    tracing::warn!(
                        video_id = %video.id,
                        resolution = %resolution,
                        error = %e,
                        "Rendition conversion failed"
                    );
                    outcomes.push(RenditionOutcome::Failed {
                        resolution,
                        error: e.to_string(),
                    });
                }
            }
        }

        match failure {
            Some(e) => Err(Halt::Persistence(e)),
            None => Ok(()),
        }
    }

    async fn encode(
        &self,
        video: &Video,
        source: &Path,
        resolution: Resolution,
    ) -> std::result::Result<RenditionOutput, (Resolution, Error)> {
        self.executor
            .execute(video, source, resolution)
            .await
            .map_err(|e| (resolution, e))
    }

    fn record(&self, video: &Video, output: &RenditionOutput) -> Result<VideoVariant> {
        let rendition = NewRendition {
            name: output.name.clone(),
            resolution: output.resolution,
            mime_type: video.mime_type.clone(),
            disk: output.disk.clone(),
            path: output.key.clone(),
        };
        match self.store.append_rendition(video.id, rendition) {
            Ok(variant) => {
                tracing::info!(
                    video_id = %video.id,
                    resolution = %variant.resolution,
                    path = %variant.path,
                    "Rendition recorded"
                );
                Ok(variant)
            }
            Err(e) => {
                report_orphan(video, output, &e);
                Err(e)
            }
        }
    }

    fn mark_complete(&self, video: &mut Video) -> Result<()> {
        video.status = VideoStatus::Complete;
        video.error = None;
        match self.store.save(video) {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!(video_id = %video.id, error = %e, "Failed to mark video complete");
                self.mark_failed(video, format!("failed to mark video complete: {e}"));
                Err(e)
            }
        }
    }

    /// Best-effort: a failure to persist `failed` is logged and discarded so
    /// the completion signal still goes out.
    fn mark_failed(&self, video: &mut Video, message: String) {
        video.status = VideoStatus::Failed;
        video.error = Some(message);
        if let Err(e) = self.store.save(video) {
            tracing::warn!(
                video_id = %video.id,
                error = %e,
                "Could not persist failed status"
            );
        }
    }

    fn signal(&self, video: &Video, report: &JobReport) {
        let renditions = report.recorded().count();
        match video.status {
            VideoStatus::Complete => tracing::info!(
                video_id = %video.id,
                renditions,
                failed = report.failed_count(),
                "Video processing complete"
            ),
            _ => tracing::warn!(
                video_id = %video.id,
                status = %video.status,
                error = video.error.as_deref().unwrap_or(""),
                "Video processing finished without success"
            ),
        }
        self.sink.publish(JobFinished {
            video_id: video.id,
            user_id: video.user_id,
            status: video.status,
            error: video.error.clone(),
            renditions,
        });
    }
}

/// Log a produced rendition that has no record.
fn report_orphan(video: &Video, output: &RenditionOutput, reason: impl std::fmt::Display) {
    tracing::error!(
        video_id = %video.id,
        resolution = %output.resolution,
        disk = %output.disk,
        key = %output.key,
        orphaned = %output.local_path.display(),
        reason = %reason,
        "Rendition produced but not recorded; artifact is orphaned and needs reconciliation"
    );
}
