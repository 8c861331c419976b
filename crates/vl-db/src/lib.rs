//! vl-db: database access and persistence layer.
//!
//! This crate provides SQLite-backed storage with connection pooling,
//! embedded migrations, row mapping for the shared models, query modules
//! for users, videos and renditions, and [`SqliteJobStore`], the job store
//! used by the processing pipeline.

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
pub mod store;

pub use store::SqliteJobStore;
