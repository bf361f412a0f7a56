//! Queue adapter: every mutation of the host render queue goes through here.

use super::errors::{QueueResult, QueueStateError};
use super::guard::QueueGuard;
use super::host::{EntryId, EntryState, RenderQueueHost, PRIMARY_OUTPUT_MODULE};
use crate::models::ResolvedJob;

/// Handle to an entry injected by the adapter.
///
/// Only good for removing that entry; consumed by [`QueueAdapter::remove_job`].
#[derive(Debug, PartialEq, Eq)]
pub struct QueueEntryHandle {
    entry: EntryId,
    composition: String,
}

impl QueueEntryHandle {
    /// Get the injected entry's identity.
    pub fn entry(&self) -> EntryId {
        self.entry
    }

    /// Get the composition name, for logs.
    pub fn composition(&self) -> &str {
        &self.composition
    }
}

/// Render flags of pre-existing entries captured before injection.
///
/// Not `Clone`: a snapshot is handed back to
/// [`QueueAdapter::enable_existing`] exactly once.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a stashed snapshot must be restored with enable_existing"]
pub struct EnabledSnapshot {
    entries: Vec<(EntryId, bool)>,
}

impl EnabledSnapshot {
    /// Captured `(entry, was_enabled)` pairs in queue order.
    pub fn entries(&self) -> &[(EntryId, bool)] {
        &self.entries
    }

    /// Number of captured entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Bridge to the host's render queue.
#[derive(Debug)]
pub struct QueueAdapter<H> {
    host: H,
}

impl<H: RenderQueueHost> QueueAdapter<H> {
    /// Wrap a host render queue.
    pub fn new(host: H) -> Self {
        Self { host }
    }

    /// Get the host render queue.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Get mutable access to the host render queue.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Give the host back.
    pub fn into_host(self) -> H {
        self.host
    }

    /// All entries with their current state, in queue order.
    pub fn entries(&self) -> Vec<(EntryId, EntryState)> {
        self.host
            .entry_ids()
            .into_iter()
            .filter_map(|id| self.host.entry_state(id).map(|state| (id, state)))
            .collect()
    }

    /// Stash the queue and return a guard that restores it when released.
    pub fn acquire(&mut self) -> QueueResult<QueueGuard<'_, H>> {
        let snapshot = self.disable_existing()?;
        Ok(QueueGuard::new(self, snapshot))
    }

    /// Inject a resolved job as a new queue entry.
    ///
    /// If configuring the new entry fails it is removed again before the
    /// error is returned.
    pub fn add_job(&mut self, job: &ResolvedJob) -> QueueResult<QueueEntryHandle> {
        let entry = self.host.add_entry(&job.composition)?;

        if let Err(e) = self.configure_entry(entry, job) {
            tracing::warn!(
                "Configuring queue entry {} for '{}' failed, removing it: {}",
                entry,
                job.composition.name,
                e
            );
            if let Err(remove_err) = self.host.remove_entry(entry) {
                tracing::error!("Failed to remove half-configured entry {}: {}", entry, remove_err);
            }
            return Err(e);
        }

        tracing::debug!(
            "Queued {} -> {} (template '{}', post-render {})",
            job.composition,
            job.output_path.display(),
            job.output_template,
            job.post_render_action
        );

        Ok(QueueEntryHandle {
            entry,
            composition: job.composition.name.clone(),
        })
    }

    fn configure_entry(&mut self, entry: EntryId, job: &ResolvedJob) -> QueueResult<()> {
        if let Some(ref settings) = job.render_settings {
            self.host.apply_render_settings(entry, settings)?;
        }
        // Template first: applying it can reset the output file.
        self.host
            .apply_output_template(entry, PRIMARY_OUTPUT_MODULE, &job.output_template)?;
        self.host
            .set_output_file(entry, PRIMARY_OUTPUT_MODULE, &job.output_path)?;
        self.host
            .set_post_render_action(entry, PRIMARY_OUTPUT_MODULE, job.post_render_action)?;
        Ok(())
    }

    /// Remove an injected entry.
    pub fn remove_job(&mut self, handle: QueueEntryHandle) -> QueueResult<()> {
        if self.host.entry_state(handle.entry).is_none() {
            return Err(QueueStateError::vanished(handle.entry));
        }
        self.host.remove_entry(handle.entry)?;
        tracing::debug!("Removed queue entry {} ('{}')", handle.entry, handle.composition);
        Ok(())
    }

    /// Disable every enabled entry that is not rendering, done or
    /// continuing, recording what was changed.
    ///
    /// On failure, entries already disabled are re-enabled before returning.
    pub fn disable_existing(&mut self) -> QueueResult<EnabledSnapshot> {
        let mut snapshot = EnabledSnapshot {
            entries: Vec::new(),
        };

        for (id, state) in self.entries() {
            if !state.is_stashable() {
                continue;
            }
            if let Err(e) = self.host.set_render(id, false) {
                tracing::error!("Failed to disable queue entry {}: {}", id, e);
                if let Err(restore_err) = self.enable_existing(snapshot) {
                    tracing::error!("Rollback of partial stash failed: {}", restore_err);
                }
                return Err(e);
            }
            snapshot.entries.push((id, state.render));
        }

        tracing::debug!("Stashed {} existing queue entries", snapshot.len());
        Ok(snapshot)
    }

    /// Restore render flags recorded by [`disable_existing`](Self::disable_existing).
    ///
    /// Entries are matched by identity. Entries that have since disappeared
    /// are skipped. Every entry is attempted even after a failure; the first
    /// failure is returned. Returns the number of entries re-enabled.
    pub fn enable_existing(&mut self, snapshot: EnabledSnapshot) -> QueueResult<usize> {
        let mut restored = 0;
        let mut first_error = None;

        for (id, was_enabled) in snapshot.entries {
            if !was_enabled {
                continue;
            }
            if self.host.entry_state(id).is_none() {
                tracing::warn!("Stashed queue entry {} disappeared, not restoring", id);
                continue;
            }
            match self.host.set_render(id, true) {
                Ok(()) => restored += 1,
                Err(e) => {
                    tracing::error!("Failed to re-enable queue entry {}: {}", id, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        tracing::debug!("Restored {} queue entries", restored);
        match first_error {
            Some(e) => Err(e),
            None => Ok(restored),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompositionRef, EntryStatus, PostRenderAction};
    use crate::queue::MemoryRenderQueue;

    fn resolved(id: u64, path: &str) -> ResolvedJob {
        ResolvedJob {
            composition: CompositionRef::new(id, format!("Comp {}", id)),
            output_path: path.into(),
            output_template: "Lossless".to_string(),
            post_render_action: PostRenderAction::Import,
            render_settings: None,
        }
    }

    #[test]
    fn add_job_configures_primary_output_module() {
        let mut adapter = QueueAdapter::new(MemoryRenderQueue::new());
        let handle = adapter.add_job(&resolved(1, "/tmp/a.mov")).unwrap();

        let entry = adapter.host().entry(handle.entry()).unwrap();
        assert_eq!(entry.output.template.as_deref(), Some("Lossless"));
        assert_eq!(entry.output.file.as_deref(), Some(std::path::Path::new("/tmp/a.mov")));
        assert_eq!(entry.output.post_render_action, PostRenderAction::Import);
        assert!(entry.render);
    }

    #[test]
    fn add_job_rolls_back_on_configure_failure() {
        let mut host = MemoryRenderQueue::new();
        host.reject_template("Lossless");
        let mut adapter = QueueAdapter::new(host);

        let err = adapter.add_job(&resolved(1, "/tmp/a.mov")).unwrap_err();
        assert!(matches!(err, QueueStateError::HostRejected { .. }));
        assert!(adapter.host().entries().is_empty());
    }

    #[test]
    fn remove_job_reports_vanished_entry() {
        let mut adapter = QueueAdapter::new(MemoryRenderQueue::new());
        let handle = adapter.add_job(&resolved(1, "/tmp/a.mov")).unwrap();
        let id = handle.entry();
        adapter.host_mut().remove_entry(id).unwrap();

        let err = adapter.remove_job(handle).unwrap_err();
        assert!(matches!(err, QueueStateError::EntryVanished { entry } if entry == id));
    }

    #[test]
    fn disable_existing_skips_committed_and_disabled() {
        let mut host = MemoryRenderQueue::new();
        let queued = host.push_existing(CompositionRef::new(1, "A"), true, EntryStatus::Queued);
        let rendering =
            host.push_existing(CompositionRef::new(2, "B"), true, EntryStatus::Rendering);
        let done = host.push_existing(CompositionRef::new(3, "C"), true, EntryStatus::Done);
        let cont =
            host.push_existing(CompositionRef::new(4, "D"), true, EntryStatus::WillContinue);
        let off = host.push_existing(CompositionRef::new(5, "E"), false, EntryStatus::Unqueued);
        let mut adapter = QueueAdapter::new(host);

        let snapshot = adapter.disable_existing().unwrap();
        assert_eq!(snapshot.entries(), &[(queued, true)]);

        let host = adapter.host();
        assert!(!host.entry(queued).unwrap().render);
        assert!(host.entry(rendering).unwrap().render);
        assert!(host.entry(done).unwrap().render);
        assert!(host.entry(cont).unwrap().render);
        assert!(!host.entry(off).unwrap().render);

        assert_eq!(adapter.enable_existing(snapshot).unwrap(), 1);
        assert!(adapter.host().entry(queued).unwrap().render);
    }

    #[test]
    fn enable_existing_matches_by_identity() {
        let mut host = MemoryRenderQueue::new();
        let a = host.push_existing(CompositionRef::new(1, "A"), true, EntryStatus::Queued);
        let b = host.push_existing(CompositionRef::new(2, "B"), false, EntryStatus::Queued);
        let c = host.push_existing(CompositionRef::new(3, "C"), true, EntryStatus::Queued);
        let mut adapter = QueueAdapter::new(host);

        let snapshot = adapter.disable_existing().unwrap();
        // Shift positions: the first entry disappears mid-batch.
        adapter.host_mut().remove_entry(a).unwrap();

        assert_eq!(adapter.enable_existing(snapshot).unwrap(), 1);
        let host = adapter.host();
        assert!(!host.entry(b).unwrap().render);
        assert!(host.entry(c).unwrap().render);
    }
}
