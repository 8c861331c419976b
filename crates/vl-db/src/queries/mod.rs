//! Database query modules.

pub mod users;
pub mod video_variants;
pub mod videos;
