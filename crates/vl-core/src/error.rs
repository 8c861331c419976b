//! Unified error type for videoladder.
//!
//! All crates funnel their failures into [`Error`]. The orchestrator relies on
//! the variant to decide whether a failure is fatal to a job, isolated to one
//! rendition, or a persistence problem that has to reach the operator.

use std::fmt;

use crate::media::Resolution;

/// Unified error type covering all failure modes in videoladder.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "video", "user").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// A job was requested that does not exist or is not awaiting processing.
    #[error("Job not found: {id} ({reason})")]
    JobNotFound {
        /// The video identifier that was requested.
        id: String,
        /// Why the job is not runnable.
        reason: String,
    },

    /// Request data or configuration failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A concurrent writer changed the record first.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A database operation failed.
    #[error("Database error: {source}")]
    Database {
        /// The underlying database error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// An external tool (ffmpeg, ffprobe) returned an error.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// The source could not be probed for usable video dimensions.
    #[error("Probe error: {0}")]
    Probe(String),

    /// Producing one rendition failed.
    #[error("Transcode error [{resolution}]: {message}")]
    Transcode {
        /// The rendition that failed.
        resolution: Resolution,
        /// Underlying cause.
        message: String,
    },

    /// A blob could not be resolved on its storage disk.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::JobNotFound`].
    pub fn job_not_found(id: impl fmt::Display, reason: impl Into<String>) -> Self {
        Error::JobNotFound {
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    /// Convenience constructor for [`Error::Database`].
    pub fn database(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Database {
            source: source.into(),
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Transcode`].
    pub fn transcode(resolution: Resolution, message: impl Into<String>) -> Self {
        Error::Transcode {
            resolution,
            message: message.into(),
        }
    }

    /// Whether this error came from the persistence layer.
    ///
    /// A persistence failure while recording a produced rendition leaves an
    /// artifact on disk with no record. The job is still marked `failed`,
    /// and the error is also returned to the caller so the orphan can be
    /// reconciled.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Error::Database { .. } | Error::Conflict(_))
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = Error::not_found("video", "abc-123");
        assert_eq!(err.to_string(), "video not found: abc-123");
    }

    #[test]
    fn job_not_found_display() {
        let err = Error::job_not_found("abc-123", "status is complete");
        assert_eq!(err.to_string(), "Job not found: abc-123 (status is complete)");
        assert!(!err.is_persistence());
    }

    #[test]
    fn database_display() {
        let err = Error::database("connection refused");
        assert!(err.to_string().contains("connection refused"));
        assert!(err.is_persistence());
    }

    #[test]
    fn conflict_is_persistence() {
        let err = Error::Conflict("status changed".into());
        assert_eq!(err.to_string(), "Conflict: status changed");
        assert!(err.is_persistence());
    }

    #[test]
    fn io_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn tool_display() {
        let err = Error::tool("ffmpeg", "exit code 1");
        assert_eq!(err.to_string(), "Tool error [ffmpeg]: exit code 1");
    }

    #[test]
    fn probe_display() {
        let err = Error::Probe("no video stream".into());
        assert_eq!(err.to_string(), "Probe error: no video stream");
        assert!(!err.is_persistence());
    }

    #[test]
    fn transcode_display_carries_tag() {
        let err = Error::transcode(Resolution::Hd, "encoder crashed");
        assert_eq!(err.to_string(), "Transcode error [720p]: encoder crashed");
    }

    #[test]
    fn storage_display() {
        let err = Error::Storage("unknown disk 's3'".into());
        assert_eq!(err.to_string(), "Storage error: unknown disk 's3'");
    }
}
