//! videoladder - upload-to-rendition transcoding service.
//!
//! This library crate wires the workspace crates into an application and
//! exposes it for integration testing.

pub mod config;
pub mod context;
pub mod ingest;
pub mod notifications;
pub mod storage;
pub mod worker;

pub use context::AppContext;
pub use storage::LocalDiskStore;
