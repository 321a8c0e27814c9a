//! Error types for the queue, pool, and file processors

use std::collections::TryReserveError;
use std::path::{Path, PathBuf};

/// Result type for queue and pool operations
pub type Result<T> = std::result::Result<T, PoolError>;

/// Errors that can occur while building or running a pipeline
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PoolError {
    /// Queue capacity must be at least one slot
    #[error("Invalid queue capacity {capacity}: capacity must be at least 1")]
    InvalidCapacity {
        /// Requested capacity
        capacity: usize,
    },

    /// Backing storage for the queue could not be reserved
    #[error("Failed to allocate storage for {capacity} queue slots")]
    Allocation {
        /// Requested capacity
        capacity: usize,
        /// Underlying reservation failure
        #[source]
        source: TryReserveError,
    },

    /// Invalid configuration with parameter
    #[error("Invalid configuration for '{parameter}': {message}")]
    InvalidConfig {
        /// Configuration parameter name
        parameter: String,
        /// Error message
        message: String,
    },

    /// Failed to spawn a worker thread with details
    #[error("Failed to spawn worker thread #{thread_id}: {message}")]
    Spawn {
        /// ID of the thread that failed to spawn
        thread_id: usize,
        /// Error message
        message: String,
        /// Source IO error
        #[source]
        source: Option<std::io::Error>,
    },

    /// Failed to join a worker thread
    #[error("Failed to join worker thread #{thread_id}: {message}")]
    Join {
        /// ID of the thread that failed to join
        thread_id: usize,
        /// Error message
        message: String,
    },

    /// The queue was destroyed before it was closed
    #[error("Queue destroyed while still open ({pending_jobs} jobs pending)")]
    NotClosed {
        /// Number of jobs still queued
        pending_jobs: usize,
    },

    /// The queue is still referenced by another owner
    #[error("Queue cannot be destroyed: {strong_count} owners still hold it")]
    QueueStillShared {
        /// Number of live references at the time of the attempt
        strong_count: usize,
    },

    /// A file could not be opened
    #[error("Failed to open {}: {source}", .path.display())]
    Open {
        /// Path of the file
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Reading a file failed part way through
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        /// Path of the file
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Writing an output record failed
    #[error("Failed to write output: {0}")]
    Write(#[source] std::io::Error),

    /// General error
    #[error("{0}")]
    Other(String),
}

impl PoolError {
    /// Create an invalid capacity error
    pub fn invalid_capacity(capacity: usize) -> Self {
        PoolError::InvalidCapacity { capacity }
    }

    /// Create an allocation error
    pub fn allocation(capacity: usize, source: TryReserveError) -> Self {
        PoolError::Allocation { capacity, source }
    }

    /// Create an invalid config error
    pub fn invalid_config(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        PoolError::InvalidConfig {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a spawn error with source
    pub fn spawn_with_source(
        thread_id: usize,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        PoolError::Spawn {
            thread_id,
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a join error
    pub fn join(thread_id: usize, message: impl Into<String>) -> Self {
        PoolError::Join {
            thread_id,
            message: message.into(),
        }
    }

    /// Create a not-closed error
    pub fn not_closed(pending_jobs: usize) -> Self {
        PoolError::NotClosed { pending_jobs }
    }

    /// Create a still-shared error
    pub fn still_shared(strong_count: usize) -> Self {
        PoolError::QueueStillShared { strong_count }
    }

    /// Create an open error for `path`
    pub fn open(path: &Path, source: std::io::Error) -> Self {
        PoolError::Open {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Create a read error for `path`
    pub fn read(path: &Path, source: std::io::Error) -> Self {
        PoolError::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        PoolError::Other(msg.into())
    }

    /// Whether the error only affects a single file and the pool can carry on
    pub fn is_per_file(&self) -> bool {
        matches!(self, PoolError::Open { .. } | PoolError::Read { .. })
    }

    /// Whether the error ends the whole run when a job raises it.
    ///
    /// Output failures are fatal: once the sink is gone no later job can
    /// report anything.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PoolError::Write(_))
    }

    /// Whether this is an output write rejected because the reader went away
    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, PoolError::Write(e) if e.kind() == std::io::ErrorKind::BrokenPipe)
    }
}
