//! Out-of-process rendering through a command-line render executable.
//!
//! This module provides:
//! - `ExternalRenderWorker`: ordered invocations run to completion one by one
//! - `spawn_and_wait`: blocking process execution with exit code and duration
//! - `FailurePolicy`: whether later invocations run after a failure

mod errors;
mod process;
mod runner;

pub use errors::{WorkerExecutionError, WorkerResult};
pub use process::{spawn_and_wait, ProcessOutput, ProcessResult};
pub use runner::{
    ExternalRenderWorker, FailurePolicy, InvocationOutcome, WorkerInvocation, WorkerRunReport,
    PROJECT_FLAG,
};
