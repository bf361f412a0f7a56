//! Report types returned by dispatches.

use std::path::PathBuf;
use std::time::Duration;

use crate::models::ResolvedJob;
use crate::queue::{EntryId, ReleaseReport};
use crate::worker::WorkerRunReport;

/// How a batch is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// The host's own "render now".
    InHost,
    /// A project snapshot handed to the external worker.
    Background,
}

impl DispatchMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::InHost => "in-host",
            Self::Background => "background",
        }
    }
}

/// Summary of a successful dispatch.
#[derive(Debug)]
pub struct RenderReport {
    pub mode: DispatchMode,
    /// Jobs with their resolved settings, in submission order.
    pub submitted: Vec<ResolvedJob>,
    /// Entries injected for `submitted`, same order.
    pub injected: Vec<EntryId>,
    /// Pre-existing entries disabled for the batch.
    pub stashed: usize,
    pub cleanup: ReleaseReport,
    /// Snapshot rendered by the worker (background only).
    pub snapshot: Option<PathBuf>,
    pub worker: Option<WorkerRunReport>,
    pub elapsed: Duration,
}

impl RenderReport {
    pub(super) fn new(mode: DispatchMode) -> Self {
        Self {
            mode,
            submitted: Vec::new(),
            injected: Vec::new(),
            stashed: 0,
            cleanup: ReleaseReport::default(),
            snapshot: None,
            worker: None,
            elapsed: Duration::ZERO,
        }
    }
}
