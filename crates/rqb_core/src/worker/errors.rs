//! Error types for the external render worker.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure of one worker invocation.
#[derive(Error, Debug)]
pub enum WorkerExecutionError {
    /// The configured executable does not exist.
    #[error("Render worker not found: {path}")]
    ExecutableMissing { path: PathBuf },

    /// The process could not be started.
    #[error("Failed to start render worker {path}: {source}")]
    SpawnFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The process ran but reported failure.
    #[error("Render worker failed with exit code {exit_code} for `{command}`: {message}")]
    NonZeroExit {
        command: String,
        exit_code: i32,
        message: String,
    },

    /// The process was killed before it could exit.
    #[error("Render worker was terminated without an exit code for `{command}`")]
    Terminated { command: String },
}

impl WorkerExecutionError {
    /// Exit code, if the process got far enough to report one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::NonZeroExit { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }
}

/// Result type for worker operations.
pub type WorkerResult<T> = Result<T, WorkerExecutionError>;
