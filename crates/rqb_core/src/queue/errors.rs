//! Error types for host render-queue operations.

use thiserror::Error;

use super::host::EntryId;
use crate::project::ProjectError;

/// Error raised while mutating or inspecting the host render queue.
#[derive(Error, Debug)]
pub enum QueueStateError {
    /// The entry was removed or consumed before we got to it.
    #[error("Queue entry {entry} no longer exists")]
    EntryVanished { entry: EntryId },

    /// The host refused an operation.
    #[error("Host rejected {operation}: {message}")]
    HostRejected { operation: String, message: String },

    /// Some injected entries could not be removed during cleanup.
    #[error("Failed to remove {failed} injected queue entries: {first}")]
    CleanupIncomplete {
        failed: usize,
        #[source]
        first: Box<QueueStateError>,
    },

    /// The open project could not be persisted.
    #[error(transparent)]
    Project(#[from] ProjectError),
}

impl QueueStateError {
    /// Create an entry vanished error.
    pub fn vanished(entry: EntryId) -> Self {
        Self::EntryVanished { entry }
    }

    /// Create a host rejected error.
    pub fn host_rejected(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HostRejected {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueStateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleanup_error_mentions_first_failure() {
        let err = QueueStateError::CleanupIncomplete {
            failed: 2,
            first: Box::new(QueueStateError::vanished(EntryId(4))),
        };
        let msg = err.to_string();
        assert!(msg.contains("2 injected"));
        assert!(msg.contains("#4"));
    }
}
