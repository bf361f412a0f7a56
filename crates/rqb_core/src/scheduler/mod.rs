//! Batch scheduler for the host render queue.
//!
//! A dispatch moves through these phases:
//!
//! ```text
//! Idle
//!  ├── Stashing   disable pre-existing entries, remember them
//!  ├── Injecting  add one entry per job, in enqueue order
//!  ├── Executing  host "render now", or snapshot + external worker
//!  ├── Cleanup    remove injected entries, restore stashed flags
//!  └── Idle
//! ```
//!
//! # Example
//!
//! ```no_run
//! use rqb_core::models::{CompositionRef, RenderJob};
//! use rqb_core::queue::MemoryRenderQueue;
//! use rqb_core::scheduler::Scheduler;
//! use rqb_core::worker::ExternalRenderWorker;
//!
//! let mut scheduler = Scheduler::new(MemoryRenderQueue::new(), ExternalRenderWorker::new("aerender"));
//! scheduler.set_default_output_template(Some("Lossless".to_string()));
//! scheduler
//!     .enqueue(RenderJob::new(CompositionRef::new(1, "Main"), "/renders/main.mov"))
//!     .unwrap();
//! let report = scheduler.render().unwrap();
//! println!("Rendered {} jobs", report.submitted.len());
//! ```

mod errors;
#[allow(clippy::module_inception)]
mod scheduler;
mod types;

pub use errors::{SchedulerError, SchedulerResult};
pub use scheduler::Scheduler;
pub use types::{DispatchMode, RenderReport};
