//! External render worker: queues invocations and runs them one by one.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::errors::{WorkerExecutionError, WorkerResult};
use super::process::{spawn_and_wait, ProcessResult};
use crate::logging::BatchLogger;

/// Flag passed before the project path.
pub const PROJECT_FLAG: &str = "-project";

/// What to do with remaining invocations after one fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Stop at the first failure; the rest are reported as skipped.
    #[default]
    #[serde(rename = "abort")]
    AbortRemaining,
    /// Run every invocation regardless of earlier failures.
    #[serde(rename = "continue")]
    ContinueRemaining,
}

/// Arguments for one run of the worker (after the fixed flags).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerInvocation {
    args: Vec<String>,
}

impl WorkerInvocation {
    pub fn new(args: Vec<String>) -> Self {
        Self { args }
    }

    /// Render every queued item of a project file.
    pub fn project(path: &Path) -> Self {
        Self {
            args: vec![PROJECT_FLAG.to_string(), path.display().to_string()],
        }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// Result of one invocation.
#[derive(Debug)]
pub struct InvocationOutcome {
    pub invocation: WorkerInvocation,
    pub result: WorkerResult<ProcessResult>,
}

/// Everything `run_all` did.
#[derive(Debug, Default)]
pub struct WorkerRunReport {
    /// Invocations that ran, in order.
    pub outcomes: Vec<InvocationOutcome>,
    /// Invocations not started because an earlier one failed.
    pub skipped: Vec<WorkerInvocation>,
}

impl WorkerRunReport {
    pub fn is_success(&self) -> bool {
        self.skipped.is_empty() && self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &WorkerExecutionError> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }

    /// Split off the first failure, if any.
    pub fn take_first_failure(&mut self) -> Option<WorkerExecutionError> {
        let index = self.outcomes.iter().position(|o| o.result.is_err())?;
        let outcome = self.outcomes.remove(index);
        outcome.result.err()
    }
}

/// Wrapper around a command-line render executable (e.g. `aerender`).
///
/// Invocations run as `<executable> [fixed flags] <invocation args>`.
#[derive(Debug)]
pub struct ExternalRenderWorker {
    executable: PathBuf,
    fixed_flags: Vec<String>,
    policy: FailurePolicy,
    pending: Vec<WorkerInvocation>,
    logger: Option<Arc<BatchLogger>>,
}

impl ExternalRenderWorker {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            fixed_flags: Vec::new(),
            policy: FailurePolicy::default(),
            pending: Vec::new(),
            logger: None,
        }
    }

    pub fn with_fixed_flags(mut self, flags: Vec<String>) -> Self {
        self.fixed_flags = flags;
        self
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Send worker commands and output to a batch log.
    pub fn set_logger(&mut self, logger: Option<Arc<BatchLogger>>) {
        self.logger = logger;
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn pending(&self) -> &[WorkerInvocation] {
        &self.pending
    }

    /// Append an invocation; nothing runs until [`run_all`](Self::run_all).
    pub fn enqueue(&mut self, invocation: WorkerInvocation) {
        self.pending.push(invocation);
    }

    /// Append a `-project <path>` invocation.
    pub fn enqueue_project(&mut self, path: &Path) {
        self.enqueue(WorkerInvocation::project(path));
    }

    /// Full argument list for an invocation.
    pub fn command_args(&self, invocation: &WorkerInvocation) -> Vec<String> {
        self.fixed_flags
            .iter()
            .chain(invocation.args.iter())
            .cloned()
            .collect()
    }

    /// Run every pending invocation in order, blocking until each exits.
    ///
    /// The pending list is empty afterwards, whatever the outcome.
    pub fn run_all(&mut self) -> WorkerRunReport {
        let mut report = WorkerRunReport::default();
        let mut remaining = std::mem::take(&mut self.pending).into_iter();
        let total = remaining.len();

        while let Some(invocation) = remaining.next() {
            let index = report.outcomes.len() + 1;
            tracing::info!(
                "Render worker invocation {}/{}: {}",
                index,
                total,
                invocation.args.join(" ")
            );

            let result = self.run_one(&invocation);
            let failed = result.is_err();
            report.outcomes.push(InvocationOutcome { invocation, result });

            if failed && self.policy == FailurePolicy::AbortRemaining {
                report.skipped = remaining.by_ref().collect();
                if !report.skipped.is_empty() {
                    tracing::warn!(
                        "Skipping {} remaining worker invocations after failure",
                        report.skipped.len()
                    );
                }
                break;
            }
        }

        report
    }

    fn run_one(&self, invocation: &WorkerInvocation) -> WorkerResult<ProcessResult> {
        let args = self.command_args(invocation);
        if let Some(ref logger) = self.logger {
            logger.command(&format!("{} {}", self.executable.display(), args.join(" ")));
            logger.clear_tail();
        }

        let result = spawn_and_wait(&self.executable, &args).and_then(|output| {
            if let Some(ref logger) = self.logger {
                for line in &output.stdout {
                    logger.output_line(line, false);
                }
                for line in &output.stderr {
                    logger.output_line(line, true);
                }
            }
            output.into_result()
        });

        match &result {
            Ok(done) => {
                tracing::info!(
                    "Render worker finished in {:.1}s",
                    done.duration.as_secs_f64()
                );
                if let Some(ref logger) = self.logger {
                    logger.success(&format!(
                        "Worker finished in {:.1}s",
                        done.duration.as_secs_f64()
                    ));
                }
            }
            Err(e) => {
                tracing::error!("Render worker failed: {}", e);
                if let Some(ref logger) = self.logger {
                    logger.error(&e.to_string());
                    logger.show_tail("worker");
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_does_not_run() {
        let mut worker = ExternalRenderWorker::new("/nonexistent/aerender");
        worker.enqueue_project(Path::new("/tmp/show.aep"));
        assert_eq!(worker.pending().len(), 1);
        assert_eq!(worker.pending()[0].args(), &["-project", "/tmp/show.aep"]);
    }

    #[test]
    fn fixed_flags_come_first() {
        let worker = ExternalRenderWorker::new("aerender")
            .with_fixed_flags(vec!["-continueOnMissingFootage".to_string()]);
        let args = worker.command_args(&WorkerInvocation::project(Path::new("/tmp/a.aep")));
        assert_eq!(args, vec!["-continueOnMissingFootage", "-project", "/tmp/a.aep"]);
    }

    #[test]
    fn missing_executable_aborts_and_clears_pending() {
        let mut worker = ExternalRenderWorker::new("/nonexistent/dir/aerender");
        worker.enqueue_project(Path::new("/tmp/a.aep"));
        worker.enqueue_project(Path::new("/tmp/b.aep"));

        let mut report = worker.run_all();

        assert!(worker.pending().is_empty());
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(!report.is_success());
        assert!(matches!(
            report.take_first_failure(),
            Some(WorkerExecutionError::ExecutableMissing { .. })
        ));
    }

    #[cfg(unix)]
    fn sh_worker(script: &str) -> ExternalRenderWorker {
        // `sh -c <script> worker -project <path>`: $1 is -project, $2 the path.
        ExternalRenderWorker::new("sh")
            .with_fixed_flags(vec!["-c".to_string(), script.to_string(), "worker".to_string()])
    }

    #[cfg(unix)]
    #[test]
    fn runs_sequentially_and_reports_each() {
        let mut worker = sh_worker("test \"$1\" = -project");
        worker.enqueue_project(Path::new("/tmp/a.aep"));
        worker.enqueue_project(Path::new("/tmp/b.aep"));

        let report = worker.run_all();
        assert!(report.is_success());
        assert_eq!(report.succeeded(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn continue_policy_runs_after_failure() {
        let mut worker = sh_worker("case \"$2\" in *bad*) exit 2;; esac")
            .with_policy(FailurePolicy::ContinueRemaining);
        worker.enqueue_project(Path::new("/tmp/bad.aep"));
        worker.enqueue_project(Path::new("/tmp/good.aep"));

        let report = worker.run_all();
        assert_eq!(report.outcomes.len(), 2);
        assert!(report.skipped.is_empty());
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failures().next().and_then(|e| e.exit_code()), Some(2));
    }

    #[cfg(unix)]
    #[test]
    fn abort_policy_skips_after_failure() {
        let mut worker = sh_worker("exit 1");
        worker.enqueue_project(Path::new("/tmp/a.aep"));
        worker.enqueue_project(Path::new("/tmp/b.aep"));
        worker.enqueue_project(Path::new("/tmp/c.aep"));

        let report = worker.run_all();
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[0].args(), &["-project", "/tmp/b.aep"]);
    }
}
