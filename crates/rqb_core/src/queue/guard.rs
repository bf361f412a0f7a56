//! Scoped exclusive access to the host render queue.
//!
//! [`QueueGuard`] is returned by [`QueueAdapter::acquire`] after the existing
//! entries have been stashed. Entries injected through the guard are tracked
//! and, when the guard is released or dropped, removed before the stashed
//! render flags are restored. Release happens on every exit path, including
//! early returns through `?` and unwinding.

use super::adapter::{EnabledSnapshot, QueueAdapter, QueueEntryHandle};
use super::errors::{QueueResult, QueueStateError};
use super::host::{EntryId, RenderQueueHost};
use crate::models::ResolvedJob;

/// What cleanup did when the guard was released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReleaseReport {
    /// Injected entries removed from the queue.
    pub removed: usize,
    /// Pre-existing entries re-enabled.
    pub restored: usize,
}

/// Exclusive access to the host queue for the duration of one dispatch.
pub struct QueueGuard<'a, H: RenderQueueHost> {
    adapter: &'a mut QueueAdapter<H>,
    snapshot: Option<EnabledSnapshot>,
    injected: Vec<QueueEntryHandle>,
}

impl<'a, H: RenderQueueHost> QueueGuard<'a, H> {
    pub(super) fn new(adapter: &'a mut QueueAdapter<H>, snapshot: EnabledSnapshot) -> Self {
        Self {
            adapter,
            snapshot: Some(snapshot),
            injected: Vec::new(),
        }
    }

    /// Number of pre-existing entries that were stashed.
    pub fn stashed(&self) -> usize {
        self.snapshot.as_ref().map_or(0, EnabledSnapshot::len)
    }

    /// Inject a job; the entry is removed again when the guard is released.
    pub fn inject(&mut self, job: &ResolvedJob) -> QueueResult<EntryId> {
        let handle = self.adapter.add_job(job)?;
        let entry = handle.entry();
        self.injected.push(handle);
        Ok(entry)
    }

    /// Entries injected so far, in injection order.
    pub fn injected(&self) -> Vec<EntryId> {
        self.injected.iter().map(|h| h.entry()).collect()
    }

    /// Direct access to the host, e.g. to trigger a render.
    pub fn host_mut(&mut self) -> &mut H {
        self.adapter.host_mut()
    }

    /// Remove injected entries and restore the stash, reporting failures.
    pub fn release(mut self) -> QueueResult<ReleaseReport> {
        self.cleanup()
    }

    fn cleanup(&mut self) -> QueueResult<ReleaseReport> {
        let mut report = ReleaseReport::default();
        let mut failed = 0;
        let mut first_error = None;

        for handle in std::mem::take(&mut self.injected) {
            match self.adapter.remove_job(handle) {
                Ok(()) => report.removed += 1,
                Err(e) => {
                    tracing::warn!("Cleanup could not remove injected entry: {}", e);
                    failed += 1;
                    first_error.get_or_insert(e);
                }
            }
        }

        // Restoration runs whether or not removal succeeded.
        let restore = match self.snapshot.take() {
            Some(snapshot) => self.adapter.enable_existing(snapshot),
            None => Ok(0),
        };

        if let Some(first) = first_error {
            if let Err(ref e) = restore {
                tracing::error!("Restoring stashed queue entries also failed: {}", e);
            }
            return Err(QueueStateError::CleanupIncomplete {
                failed,
                first: Box::new(first),
            });
        }

        report.restored = restore?;
        Ok(report)
    }
}

impl<H: RenderQueueHost> Drop for QueueGuard<'_, H> {
    fn drop(&mut self) {
        if self.snapshot.is_none() && self.injected.is_empty() {
            return;
        }
        tracing::debug!("Queue guard dropped without release, cleaning up");
        if let Err(e) = self.cleanup() {
            tracing::error!("Queue cleanup on drop failed: {}", e);
        }
    }
}
