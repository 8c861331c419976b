//! # vl-pipeline
//!
//! Transcode orchestration for uploaded videos.
//!
//! This crate provides:
//!
//! - **Collaborator traits** ([`JobStore`], [`BlobStore`], [`EncodingEngine`],
//!   [`CompletionSink`]) -- the narrow seams to persistence, storage, the
//!   external encoder and downstream notification.
//! - **[`plan`]** -- pure selection of the renditions a source can be
//!   downscaled to.
//! - **[`MediaProbe`]** -- source dimension extraction on top of the engine.
//! - **[`TranscodeExecutor`]** -- produces one rendition at a deterministic
//!   location.
//! - **[`VideoProcessor`]** -- the job state machine exposing
//!   [`run_job`](VideoProcessor::run_job).

pub mod engine;
pub mod executor;
pub mod orchestrator;
pub mod planner;
pub mod probe;
pub mod sink;
pub mod store;

// Re-export key types at the crate root.
pub use engine::{EncodingEngine, ProbeReport, StreamInfo, StreamKind, TranscodeRequest};
pub use executor::{rendition_key, RenditionOutput, TranscodeExecutor};
pub use orchestrator::{JobReport, ProcessorOptions, RenditionOutcome, VideoProcessor};
pub use planner::plan;
pub use probe::MediaProbe;
pub use sink::CompletionSink;
pub use store::{BlobStore, JobStore};
