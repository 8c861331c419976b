//! Completion signal delivery.

use vl_core::events::{EventBus, EventPayload, JobFinished};

/// Fire-and-forget receiver of job completion signals.
pub trait CompletionSink: Send + Sync {
    fn publish(&self, finished: JobFinished);
}

impl CompletionSink for EventBus {
    fn publish(&self, finished: JobFinished) {
        self.broadcast(EventPayload::VideoProcessed(finished));
    }
}
