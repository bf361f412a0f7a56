//! Data models for the render queue batcher.
//!
//! - Enums for post-render actions, host entry status and dispatch phases
//! - Render jobs and their late-bound defaults

mod enums;
mod job;

pub use enums::{DispatchPhase, EntryStatus, PostRenderAction};
pub use job::{CompositionRef, InvalidJobError, JobDefaults, RenderJob, ResolvedJob};
