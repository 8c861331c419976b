//! Batch worker draining every `uploaded` video.

use futures::stream::{self, StreamExt};
use vl_core::{Error, Result, VideoId, VideoStatus};
use vl_db::pool::get_conn;
use vl_db::queries::videos;

use crate::context::AppContext;

/// Counts from one worker pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkSummary {
    pub complete: usize,
    pub failed: usize,
    /// Claimed elsewhere between listing and running.
    pub skipped: usize,
    /// Runs that produced renditions they could not record. Their
    /// artifacts are orphaned on disk and need reconciliation.
    pub unrecorded: usize,
    /// Runs that ended in any other propagated error.
    pub errors: usize,
}

impl WorkSummary {
    pub fn total(&self) -> usize {
        self.complete + self.failed + self.skipped + self.unrecorded + self.errors
    }

    fn tally(&mut self, id: VideoId, result: Result<VideoStatus>) {
        match result {
            Ok(VideoStatus::Complete) => self.complete += 1,
            Ok(_) => self.failed += 1,
            Err(Error::JobNotFound { .. }) => {
                tracing::debug!(video_id = %id, "Video already claimed; skipping");
                self.skipped += 1;
            }
            Err(e) if e.is_persistence() => {
                tracing::error!(
                    video_id = %id,
                    error = %e,
                    "Renditions left unrecorded; storage needs reconciliation"
                );
                self.unrecorded += 1;
            }
            Err(e) => {
                tracing::error!(video_id = %id, error = %e, "Job ended with an error");
                self.errors += 1;
            }
        }
    }
}

/// Process every video currently `uploaded`, running up to
/// `processing.worker_concurrency` jobs at once.
pub async fn run_pending(ctx: &AppContext) -> Result<WorkSummary> {
    let ids = {
        let conn = get_conn(&ctx.db)?;
        videos::list_uploaded_ids(&conn)?
    };
    if ids.is_empty() {
        tracing::info!("No uploaded videos waiting");
        return Ok(WorkSummary::default());
    }

    let concurrency = ctx.config.processing.worker_concurrency.max(1);
    tracing::info!(count = ids.len(), concurrency, "Processing uploaded videos");

    let processor = ctx.processor();
    let processor = &processor;
    let results: Vec<(VideoId, Result<VideoStatus>)> = stream::iter(ids)
        .map(|id| async move { (id, processor.run_job(id).await.map(|r| r.status)) })
        .buffer_unordered(concurrency)
        .collect()
        .await;

    let mut summary = WorkSummary::default();
    for (id, result) in results {
        summary.tally(id, result);
    }

    tracing::info!(
        complete = summary.complete,
        failed = summary.failed,
        skipped = summary.skipped,
        unrecorded = summary.unrecorded,
        errors = summary.errors,
        "Worker pass finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_separates_unrecorded_renditions_from_other_errors() {
        let mut summary = WorkSummary::default();
        summary.tally(VideoId::new(), Ok(VideoStatus::Complete));
        summary.tally(VideoId::new(), Ok(VideoStatus::Failed));
        summary.tally(
            VideoId::new(),
            Err(Error::job_not_found(VideoId::new(), "claimed by another run")),
        );
        summary.tally(VideoId::new(), Err(Error::database("disk I/O error")));
        summary.tally(VideoId::new(), Err(Error::Conflict("status changed".into())));
        summary.tally(VideoId::new(), Err(Error::Internal("worker panicked".into())));

        assert_eq!(
            summary,
            WorkSummary {
                complete: 1,
                failed: 1,
                skipped: 1,
                unrecorded: 2,
                errors: 1,
            }
        );
        assert_eq!(summary.total(), 6);
    }
}
