//! Project persistence used by background rendering.
//!
//! The open project is reached through [`ProjectStore`]. Background renders
//! save it, then duplicate it into a disposable snapshot that the external
//! worker renders from.

mod file;
mod snapshot;

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use file::FileProject;
pub use snapshot::{create_snapshot, ensure_saved, snapshot_path};

/// Errors from project persistence.
#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("Project has no backing file and no fallback path is configured")]
    NoBackingFile,

    #[error("Project {operation} failed for {path}: {source}")]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No free snapshot file name for {base}")]
    NoFreeSnapshotName { base: PathBuf },
}

impl ProjectError {
    /// Create an I/O error with context.
    pub fn io(operation: impl Into<String>, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }
}

/// Result type for project operations.
pub type ProjectResult<T> = Result<T, ProjectError>;

/// Persistence operations on the open project.
///
/// None of these may change the project's in-memory content beyond marking
/// it saved.
pub trait ProjectStore {
    /// Backing file, or `None` if the project was never saved.
    fn path(&self) -> Option<&Path>;

    /// Save to the backing file.
    fn save(&mut self) -> ProjectResult<()>;

    /// Save to a new backing file, which becomes the project's path.
    fn save_as(&mut self, path: &Path) -> ProjectResult<()>;

    /// Write a copy of the saved project without changing its path.
    fn copy_to(&self, path: &Path) -> ProjectResult<()>;
}
