//! Encoding actions built on top of [`ToolCommand`](crate::ToolCommand).

pub mod rendition;

pub use rendition::{encode_rendition, rendition_args};
