//! Host render-queue contract.
//!
//! The host application owns a single, process-wide render queue. Everything
//! the batcher needs from it goes through [`RenderQueueHost`], so embedders
//! bind it to the real application and tests bind it to
//! [`MemoryRenderQueue`](super::MemoryRenderQueue).

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::QueueResult;
use crate::models::{CompositionRef, EntryStatus, PostRenderAction};

/// Output module configured on injected entries (hosts number them from 1).
pub const PRIMARY_OUTPUT_MODULE: usize = 1;

/// Stable identity of a host queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(pub u64);

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Render flag and status of one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryState {
    /// Whether the entry is enabled for rendering.
    pub render: bool,
    pub status: EntryStatus,
}

impl EntryState {
    /// Whether the entry may be temporarily disabled for a batch.
    pub fn is_stashable(&self) -> bool {
        self.render && !self.status.is_committed()
    }
}

/// Operations the host render queue must provide.
pub trait RenderQueueHost {
    /// Entry identities in queue order.
    fn entry_ids(&self) -> Vec<EntryId>;

    /// Current state of an entry, or `None` if it no longer exists.
    fn entry_state(&self, id: EntryId) -> Option<EntryState>;

    /// Append a new entry for the composition.
    fn add_entry(&mut self, composition: &CompositionRef) -> QueueResult<EntryId>;

    /// Apply a render settings template to the entry.
    fn apply_render_settings(&mut self, id: EntryId, template: &str) -> QueueResult<()>;

    /// Apply an output module template.
    fn apply_output_template(&mut self, id: EntryId, module: usize, template: &str)
        -> QueueResult<()>;

    /// Point an output module at a file.
    fn set_output_file(&mut self, id: EntryId, module: usize, path: &Path) -> QueueResult<()>;

    /// Set the post-render action of an output module.
    fn set_post_render_action(
        &mut self,
        id: EntryId,
        module: usize,
        action: PostRenderAction,
    ) -> QueueResult<()>;

    /// Set the entry's render flag.
    fn set_render(&mut self, id: EntryId, enabled: bool) -> QueueResult<()>;

    /// Remove the entry from the queue.
    fn remove_entry(&mut self, id: EntryId) -> QueueResult<()>;

    /// Render every enabled entry synchronously, in queue order.
    fn render_now(&mut self) -> QueueResult<()>;
}

impl<H: RenderQueueHost + ?Sized> RenderQueueHost for Box<H> {
    fn entry_ids(&self) -> Vec<EntryId> {
        (**self).entry_ids()
    }

    fn entry_state(&self, id: EntryId) -> Option<EntryState> {
        (**self).entry_state(id)
    }

    fn add_entry(&mut self, composition: &CompositionRef) -> QueueResult<EntryId> {
        (**self).add_entry(composition)
    }

    fn apply_render_settings(&mut self, id: EntryId, template: &str) -> QueueResult<()> {
        (**self).apply_render_settings(id, template)
    }

    fn apply_output_template(
        &mut self,
        id: EntryId,
        module: usize,
        template: &str,
    ) -> QueueResult<()> {
        (**self).apply_output_template(id, module, template)
    }

    fn set_output_file(&mut self, id: EntryId, module: usize, path: &Path) -> QueueResult<()> {
        (**self).set_output_file(id, module, path)
    }

    fn set_post_render_action(
        &mut self,
        id: EntryId,
        module: usize,
        action: PostRenderAction,
    ) -> QueueResult<()> {
        (**self).set_post_render_action(id, module, action)
    }

    fn set_render(&mut self, id: EntryId, enabled: bool) -> QueueResult<()> {
        (**self).set_render(id, enabled)
    }

    fn remove_entry(&mut self, id: EntryId) -> QueueResult<()> {
        (**self).remove_entry(id)
    }

    fn render_now(&mut self) -> QueueResult<()> {
        (**self).render_now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stashable_requires_enabled_and_uncommitted() {
        let queued = EntryState {
            render: true,
            status: EntryStatus::Queued,
        };
        let disabled = EntryState {
            render: false,
            status: EntryStatus::Queued,
        };
        let done = EntryState {
            render: true,
            status: EntryStatus::Done,
        };

        assert!(queued.is_stashable());
        assert!(!disabled.is_stashable());
        assert!(!done.is_stashable());
    }

    #[test]
    fn boxed_host_forwards() {
        let mut host: Box<dyn RenderQueueHost> = Box::new(super::super::MemoryRenderQueue::new());
        let id = host.add_entry(&CompositionRef::new(1, "Comp")).unwrap();
        assert_eq!(host.entry_ids(), vec![id]);
        host.remove_entry(id).unwrap();
        assert!(host.entry_ids().is_empty());
    }
}
