//! Error types for scheduler dispatches.

use thiserror::Error;

use crate::models::InvalidJobError;
use crate::project::ProjectError;
use crate::queue::QueueStateError;
use crate::worker::WorkerExecutionError;

/// Top-level dispatch error.
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// A job was rejected before the host queue was touched.
    #[error("Invalid render job: {0}")]
    InvalidJob(#[from] InvalidJobError),

    /// The host queue or project could not be driven or restored.
    #[error("Render queue error: {0}")]
    QueueState(#[from] QueueStateError),

    /// The external render worker failed.
    #[error("Render worker error: {0}")]
    Worker(#[from] WorkerExecutionError),
}

impl From<ProjectError> for SchedulerError {
    fn from(e: ProjectError) -> Self {
        Self::QueueState(QueueStateError::Project(e))
    }
}

/// Result type for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_errors_are_queue_state_errors() {
        let err: SchedulerError = ProjectError::NoBackingFile.into();
        assert!(matches!(
            err,
            SchedulerError::QueueState(QueueStateError::Project(ProjectError::NoBackingFile))
        ));
        assert!(err.to_string().contains("no backing file"));
    }
}
