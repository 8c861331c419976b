//! vl-core: shared types, IDs, errors, configuration, and event system.
//!
//! This crate is the foundational dependency for all other vl-* crates,
//! providing type-safe identifiers, a unified error type, the rendition
//! catalog and video lifecycle enums, application configuration, and a
//! broadcast event bus.

pub mod config;
pub mod error;
pub mod events;
pub mod ids;
pub mod media;
pub mod video;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use ids::*;
pub use media::*;
pub use video::*;
