//! # vl-av
//!
//! ffmpeg-backed encoding engine for videoladder.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache paths to ffmpeg
//!   and ffprobe, honouring configured overrides.
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout
//!   support for running external processes.
//! - **Probing** ([`FfprobeProber`]) -- stream metadata from ffprobe JSON.
//! - **Rendition encoding** ([`actions::encode_rendition`]) -- H.264/AAC MP4
//!   downscale with an aspect-preserving fit.
//! - **[`FfmpegEngine`]** -- the [`vl_pipeline::EncodingEngine`] tying the
//!   above together.

pub mod actions;
pub mod command;
pub mod engine;
pub mod probe;
pub mod tools;

// ---- Re-exports for convenience ----

pub use command::{ToolCommand, ToolOutput};
pub use engine::FfmpegEngine;
pub use probe::FfprobeProber;
pub use tools::{ToolConfig, ToolInfo, ToolRegistry};

pub use actions::{encode_rendition, rendition_args};
