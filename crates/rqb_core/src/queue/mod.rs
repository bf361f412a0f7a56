//! Host render-queue access.
//!
//! This module provides:
//! - `RenderQueueHost`: the contract the host application's queue fulfils
//! - `QueueAdapter`: job injection/removal and stash/restore of existing entries
//! - `QueueGuard`: scoped exclusive access that always restores the queue
//! - `MemoryRenderQueue`: an in-memory host queue

mod adapter;
mod errors;
mod guard;
mod host;
mod memory;

pub use adapter::{EnabledSnapshot, QueueAdapter, QueueEntryHandle};
pub use errors::{QueueResult, QueueStateError};
pub use guard::{QueueGuard, ReleaseReport};
pub use host::{EntryId, EntryState, RenderQueueHost, PRIMARY_OUTPUT_MODULE};
pub use memory::{MemoryEntry, MemoryOutputModule, MemoryRenderQueue, RenderedEntry};
