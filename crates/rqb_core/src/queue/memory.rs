//! In-memory render queue.
//!
//! Behaves like the host queue closely enough to exercise the adapter and
//! scheduler without a running application: entries keep queue order,
//! `render_now` marks enabled entries as done, and failures can be injected.

use std::path::{Path, PathBuf};

use super::errors::{QueueResult, QueueStateError};
use super::host::{EntryId, EntryState, RenderQueueHost, PRIMARY_OUTPUT_MODULE};
use crate::models::{CompositionRef, EntryStatus, PostRenderAction};

/// Output module state of a memory entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryOutputModule {
    pub template: Option<String>,
    pub file: Option<PathBuf>,
    pub post_render_action: PostRenderAction,
}

/// One entry of the in-memory queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEntry {
    pub id: EntryId,
    pub composition: CompositionRef,
    pub render: bool,
    pub status: EntryStatus,
    pub render_settings: Option<String>,
    pub output: MemoryOutputModule,
}

/// A rendered entry as recorded by `render_now`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEntry {
    pub id: EntryId,
    pub composition: CompositionRef,
    pub file: Option<PathBuf>,
    pub template: Option<String>,
}

/// In-memory stand-in for the host render queue.
#[derive(Debug, Default)]
pub struct MemoryRenderQueue {
    entries: Vec<MemoryEntry>,
    next_id: u64,
    /// Compositions passed to `add_entry`, in call order.
    added: Vec<CompositionRef>,
    rendered: Vec<RenderedEntry>,
    render_calls: usize,
    fail_next_render: Option<String>,
    rejected_template: Option<String>,
    consume_on_render: bool,
}

impl MemoryRenderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry that was in the queue before the batcher ran.
    pub fn push_existing(
        &mut self,
        composition: CompositionRef,
        render: bool,
        status: EntryStatus,
    ) -> EntryId {
        let id = self.allocate_id();
        self.entries.push(MemoryEntry {
            id,
            composition,
            render,
            status,
            render_settings: None,
            output: MemoryOutputModule::default(),
        });
        id
    }

    pub fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }

    pub fn entry(&self, id: EntryId) -> Option<&MemoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// `(id, render, status)` for every entry, for before/after comparisons.
    pub fn state_table(&self) -> Vec<(EntryId, bool, EntryStatus)> {
        self.entries
            .iter()
            .map(|e| (e.id, e.render, e.status))
            .collect()
    }

    /// Compositions passed to `add_entry`, in call order.
    pub fn added(&self) -> &[CompositionRef] {
        &self.added
    }

    /// Entries rendered by `render_now`, in render order.
    pub fn rendered(&self) -> &[RenderedEntry] {
        &self.rendered
    }

    pub fn render_calls(&self) -> usize {
        self.render_calls
    }

    /// Make the next `render_now` fail with the given message.
    pub fn fail_next_render(&mut self, message: impl Into<String>) {
        self.fail_next_render = Some(message.into());
    }

    /// Reject any attempt to apply this output template.
    pub fn reject_template(&mut self, template: impl Into<String>) {
        self.rejected_template = Some(template.into());
    }

    /// Remove entries from the queue once they have rendered.
    pub fn consume_on_render(&mut self, consume: bool) {
        self.consume_on_render = consume;
    }

    fn allocate_id(&mut self) -> EntryId {
        self.next_id += 1;
        EntryId(self.next_id)
    }

    fn entry_mut(&mut self, id: EntryId) -> QueueResult<&mut MemoryEntry> {
        self.entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| QueueStateError::vanished(id))
    }

    fn output_module_mut(
        &mut self,
        id: EntryId,
        module: usize,
    ) -> QueueResult<&mut MemoryOutputModule> {
        if module != PRIMARY_OUTPUT_MODULE {
            return Err(QueueStateError::host_rejected(
                "output module lookup",
                format!("entry {} has no output module {}", id, module),
            ));
        }
        Ok(&mut self.entry_mut(id)?.output)
    }
}

impl RenderQueueHost for MemoryRenderQueue {
    fn entry_ids(&self) -> Vec<EntryId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    fn entry_state(&self, id: EntryId) -> Option<EntryState> {
        self.entry(id).map(|e| EntryState {
            render: e.render,
            status: e.status,
        })
    }

    fn add_entry(&mut self, composition: &CompositionRef) -> QueueResult<EntryId> {
        self.added.push(composition.clone());
        Ok(self.push_existing(composition.clone(), true, EntryStatus::NeedsOutput))
    }

    fn apply_render_settings(&mut self, id: EntryId, template: &str) -> QueueResult<()> {
        self.entry_mut(id)?.render_settings = Some(template.to_string());
        Ok(())
    }

    fn apply_output_template(
        &mut self,
        id: EntryId,
        module: usize,
        template: &str,
    ) -> QueueResult<()> {
        if self.rejected_template.as_deref() == Some(template) {
            return Err(QueueStateError::host_rejected(
                "apply output template",
                format!("no template named '{}'", template),
            ));
        }
        self.output_module_mut(id, module)?.template = Some(template.to_string());
        Ok(())
    }

    fn set_output_file(&mut self, id: EntryId, module: usize, path: &Path) -> QueueResult<()> {
        self.output_module_mut(id, module)?.file = Some(path.to_path_buf());
        let entry = self.entry_mut(id)?;
        if entry.status == EntryStatus::NeedsOutput {
            entry.status = EntryStatus::Queued;
        }
        Ok(())
    }

    fn set_post_render_action(
        &mut self,
        id: EntryId,
        module: usize,
        action: PostRenderAction,
    ) -> QueueResult<()> {
        self.output_module_mut(id, module)?.post_render_action = action;
        Ok(())
    }

    fn set_render(&mut self, id: EntryId, enabled: bool) -> QueueResult<()> {
        self.entry_mut(id)?.render = enabled;
        Ok(())
    }

    fn remove_entry(&mut self, id: EntryId) -> QueueResult<()> {
        let index = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| QueueStateError::vanished(id))?;
        self.entries.remove(index);
        Ok(())
    }

    fn render_now(&mut self) -> QueueResult<()> {
        self.render_calls += 1;
        if let Some(message) = self.fail_next_render.take() {
            return Err(QueueStateError::host_rejected("render", message));
        }

        for entry in self.entries.iter_mut() {
            if entry.render && entry.status == EntryStatus::Queued {
                entry.status = EntryStatus::Done;
                self.rendered.push(RenderedEntry {
                    id: entry.id,
                    composition: entry.composition.clone(),
                    file: entry.output.file.clone(),
                    template: entry.output.template.clone(),
                });
            }
        }

        if self.consume_on_render {
            self.entries.retain(|e| e.status != EntryStatus::Done);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_now_only_renders_enabled_queued_entries() {
        let mut queue = MemoryRenderQueue::new();
        let on = queue.push_existing(CompositionRef::new(1, "On"), true, EntryStatus::Queued);
        let off = queue.push_existing(CompositionRef::new(2, "Off"), false, EntryStatus::Queued);

        queue.render_now().unwrap();

        assert_eq!(queue.rendered().len(), 1);
        assert_eq!(queue.rendered()[0].id, on);
        assert_eq!(queue.entry(on).unwrap().status, EntryStatus::Done);
        assert_eq!(queue.entry(off).unwrap().status, EntryStatus::Queued);
    }

    #[test]
    fn new_entries_need_output_until_file_is_set() {
        let mut queue = MemoryRenderQueue::new();
        let id = queue.add_entry(&CompositionRef::new(1, "Comp")).unwrap();
        assert_eq!(queue.entry(id).unwrap().status, EntryStatus::NeedsOutput);

        queue
            .set_output_file(id, PRIMARY_OUTPUT_MODULE, Path::new("/tmp/out.mov"))
            .unwrap();
        assert_eq!(queue.entry(id).unwrap().status, EntryStatus::Queued);
    }

    #[test]
    fn unknown_output_module_is_rejected() {
        let mut queue = MemoryRenderQueue::new();
        let id = queue.add_entry(&CompositionRef::new(1, "Comp")).unwrap();
        let err = queue.apply_output_template(id, 2, "Lossless").unwrap_err();
        assert!(matches!(err, QueueStateError::HostRejected { .. }));
    }
}
