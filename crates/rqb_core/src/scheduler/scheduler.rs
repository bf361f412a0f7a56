//! Batch dispatch: stash, inject, execute, clean up.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use super::errors::{SchedulerError, SchedulerResult};
use super::types::{DispatchMode, RenderReport};
use crate::config::Settings;
use crate::logging::BatchLogger;
use crate::models::{DispatchPhase, JobDefaults, PostRenderAction, RenderJob, ResolvedJob};
use crate::project::{create_snapshot, ensure_saved, ProjectStore};
use crate::queue::{EntryId, QueueAdapter, QueueGuard, RenderQueueHost};
use crate::worker::ExternalRenderWorker;

/// Where the injected entries get rendered.
enum Execution<'p> {
    InHost,
    Background(&'p mut dyn ProjectStore),
}

impl Execution<'_> {
    fn mode(&self) -> DispatchMode {
        match self {
            Execution::InHost => DispatchMode::InHost,
            Execution::Background(_) => DispatchMode::Background,
        }
    }
}

/// Orchestrates render batches against the host queue.
///
/// Every dispatch runs `Stashing → Injecting → Executing → Cleanup` and
/// returns to `Idle`. The host queue is restored on every exit path.
/// Dispatches take `&mut self`, so one scheduler never runs two at once.
pub struct Scheduler<H: RenderQueueHost> {
    defaults: JobDefaults,
    pending: Vec<RenderJob>,
    adapter: QueueAdapter<H>,
    worker: ExternalRenderWorker,
    /// `None` puts snapshots next to the project.
    snapshot_dir: Option<PathBuf>,
    /// Save target for projects that were never saved.
    untitled_project: Option<PathBuf>,
    phase: DispatchPhase,
    logger: Option<Arc<BatchLogger>>,
}

impl<H: RenderQueueHost> Scheduler<H> {
    /// Create a scheduler with no defaults and an empty pending list.
    pub fn new(host: H, worker: ExternalRenderWorker) -> Self {
        Self {
            defaults: JobDefaults::default(),
            pending: Vec::new(),
            adapter: QueueAdapter::new(host),
            worker,
            snapshot_dir: None,
            untitled_project: None,
            phase: DispatchPhase::Idle,
            logger: None,
        }
    }

    /// Build a scheduler with defaults, worker and paths from settings.
    pub fn from_settings(settings: &Settings, host: H) -> Self {
        Self::new(host, settings.worker.build_worker())
            .with_defaults(settings.render.to_job_defaults())
            .with_snapshot_dir(settings.paths.snapshot_dir())
            .with_untitled_project(settings.paths.untitled_project())
    }

    /// Replace all job defaults at once.
    pub fn with_defaults(mut self, defaults: JobDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Directory for project snapshots; `None` writes them next to the project.
    pub fn with_snapshot_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.snapshot_dir = dir;
        self
    }

    /// Where a never-saved project is saved before a background render.
    pub fn with_untitled_project(mut self, path: Option<PathBuf>) -> Self {
        self.untitled_project = path;
        self
    }

    /// Send phase markers and worker output to a batch log.
    pub fn set_logger(&mut self, logger: Option<Arc<BatchLogger>>) {
        self.worker.set_logger(logger.clone());
        self.logger = logger;
    }

    /// Current job defaults.
    pub fn defaults(&self) -> &JobDefaults {
        &self.defaults
    }

    /// Affects every pending job without its own template.
    pub fn set_default_output_template(&mut self, template: Option<String>) {
        self.defaults.output_template = template;
    }

    /// Post-render action for jobs that do not set one.
    pub fn set_default_post_render_action(&mut self, action: PostRenderAction) {
        self.defaults.post_render_action = action;
    }

    /// Render settings template for jobs that do not set one.
    pub fn set_default_render_settings(&mut self, template: Option<String>) {
        self.defaults.render_settings = template;
    }

    /// Add a job to the pending batch.
    pub fn enqueue(&mut self, job: RenderJob) -> Result<(), crate::models::InvalidJobError> {
        job.validate()?;
        tracing::debug!(
            "Enqueued {} -> {}",
            job.composition(),
            job.output_path().display()
        );
        self.pending.push(job);
        Ok(())
    }

    /// Jobs waiting for the next batch dispatch, in enqueue order.
    pub fn pending_jobs(&self) -> &[RenderJob] {
        &self.pending
    }

    /// Drop every pending job without rendering.
    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    /// Current dispatch phase; `Idle` between dispatches.
    pub fn phase(&self) -> DispatchPhase {
        self.phase
    }

    /// Get the queue adapter.
    pub fn adapter(&self) -> &QueueAdapter<H> {
        &self.adapter
    }

    /// Get the host render queue.
    pub fn host(&self) -> &H {
        self.adapter.host()
    }

    /// Get mutable access to the host render queue.
    pub fn host_mut(&mut self) -> &mut H {
        self.adapter.host_mut()
    }

    /// Get the external render worker.
    pub fn worker(&self) -> &ExternalRenderWorker {
        &self.worker
    }

    /// Get mutable access to the external render worker.
    pub fn worker_mut(&mut self) -> &mut ExternalRenderWorker {
        &mut self.worker
    }

    /// Render the pending batch with the host's own renderer.
    ///
    /// The pending list is cleared only when the whole dispatch succeeded.
    /// If "render now" fails the list is kept for a retry, even though
    /// cleanup has already removed the injected entries from the host.
    pub fn render(&mut self) -> SchedulerResult<RenderReport> {
        let jobs = self.pending.clone();
        let report = self.dispatch(&jobs, Execution::InHost)?;
        self.pending.clear();
        Ok(report)
    }

    /// Render one job with the host's renderer, leaving the pending list alone.
    pub fn render_job(&mut self, job: RenderJob) -> SchedulerResult<RenderReport> {
        self.dispatch(std::slice::from_ref(&job), Execution::InHost)
    }

    /// Render the pending batch through the external worker.
    ///
    /// Like [`render`](Self::render), a failed dispatch keeps the pending list.
    pub fn background_render(
        &mut self,
        project: &mut dyn ProjectStore,
    ) -> SchedulerResult<RenderReport> {
        let jobs = self.pending.clone();
        let report = self.dispatch(&jobs, Execution::Background(project))?;
        self.pending.clear();
        Ok(report)
    }

    /// Render one job through the external worker.
    pub fn background_render_job(
        &mut self,
        project: &mut dyn ProjectStore,
        job: RenderJob,
    ) -> SchedulerResult<RenderReport> {
        self.dispatch(std::slice::from_ref(&job), Execution::Background(project))
    }

    fn dispatch(
        &mut self,
        jobs: &[RenderJob],
        execution: Execution<'_>,
    ) -> SchedulerResult<RenderReport> {
        let started = Instant::now();
        let mode = execution.mode();

        // Resolve everything before the host queue is touched.
        let resolved = jobs
            .iter()
            .map(|job| job.resolve(&self.defaults))
            .collect::<Result<Vec<_>, _>>()?;

        let span = tracing::info_span!("dispatch", mode = mode.name(), jobs = resolved.len());
        let _entered = span.enter();

        let result = self.run_phases(resolved, execution);
        self.phase = DispatchPhase::Idle;

        match result {
            Ok(mut report) => {
                report.elapsed = started.elapsed();
                tracing::info!(
                    "Dispatch finished: {} jobs rendered, {} entries restored in {:.1}s",
                    report.submitted.len(),
                    report.cleanup.restored,
                    report.elapsed.as_secs_f64()
                );
                if let Some(ref logger) = self.logger {
                    logger.success(&format!("{} jobs rendered", report.submitted.len()));
                }
                Ok(report)
            }
            Err(e) => {
                tracing::error!("Dispatch failed: {}", e);
                if let Some(ref logger) = self.logger {
                    logger.error(&e.to_string());
                }
                Err(e)
            }
        }
    }

    fn run_phases(
        &mut self,
        resolved: Vec<ResolvedJob>,
        mut execution: Execution<'_>,
    ) -> SchedulerResult<RenderReport> {
        let Self {
            adapter,
            worker,
            phase,
            logger,
            snapshot_dir,
            untitled_project,
            ..
        } = self;
        let logger = logger.as_deref();
        let mut report = RenderReport::new(execution.mode());

        enter_phase(phase, logger, DispatchPhase::Stashing);
        let mut guard = adapter.acquire()?;
        report.stashed = guard.stashed();

        enter_phase(phase, logger, DispatchPhase::Injecting);
        let mut outcome = inject_all(&mut guard, &resolved, logger).map(|ids| {
            report.injected = ids;
        });

        // Empty batches still execute; the stashed queue renders nothing.
        if outcome.is_ok() {
            if resolved.is_empty() {
                tracing::info!("Dispatching an empty batch");
            }
            enter_phase(phase, logger, DispatchPhase::Executing);
            outcome = match execution {
                Execution::InHost => guard.host_mut().render_now().map_err(SchedulerError::from),
                Execution::Background(ref mut project) => execute_background(
                    &mut **project,
                    worker,
                    snapshot_dir.as_deref(),
                    untitled_project.as_deref(),
                    &mut report,
                ),
            };
        }

        enter_phase(phase, logger, DispatchPhase::Cleanup);
        let mut released = guard.release().map_err(SchedulerError::from);

        // Persist the cleaned-up project once a snapshot was taken from it.
        if let Execution::Background(project) = execution {
            if released.is_ok() && report.snapshot.is_some() {
                if let Err(e) = project.save() {
                    released = Err(e.into());
                }
            }
        }

        report.submitted = resolved;
        match (outcome, released) {
            (Ok(()), Ok(cleanup)) => {
                report.cleanup = cleanup;
                Ok(report)
            }
            (Ok(()), Err(cleanup_err)) => Err(cleanup_err),
            (Err(e), Ok(_)) => Err(e),
            (Err(e), Err(cleanup_err)) => {
                tracing::error!("Cleanup after failed dispatch also failed: {}", cleanup_err);
                Err(e)
            }
        }
    }
}

fn enter_phase(phase: &mut DispatchPhase, logger: Option<&BatchLogger>, next: DispatchPhase) {
    tracing::debug!("Dispatch phase {} -> {}", phase.name(), next.name());
    *phase = next;
    if let Some(logger) = logger {
        logger.phase(next.name());
    }
}

fn inject_all<H: RenderQueueHost>(
    guard: &mut QueueGuard<'_, H>,
    jobs: &[ResolvedJob],
    logger: Option<&BatchLogger>,
) -> SchedulerResult<Vec<EntryId>> {
    let mut ids = Vec::with_capacity(jobs.len());
    for (i, job) in jobs.iter().enumerate() {
        let id = guard.inject(job)?;
        let line = format!(
            "Submitted {}/{}: {} -> {} [{}]",
            i + 1,
            jobs.len(),
            job.composition,
            job.output_path.display(),
            job.output_template
        );
        tracing::info!("{}", line);
        if let Some(logger) = logger {
            logger.info(&line);
        }
        ids.push(id);
    }
    Ok(ids)
}

fn execute_background(
    project: &mut dyn ProjectStore,
    worker: &mut ExternalRenderWorker,
    snapshot_dir: Option<&Path>,
    untitled_project: Option<&Path>,
    report: &mut RenderReport,
) -> SchedulerResult<()> {
    let project_path = ensure_saved(project, untitled_project)?;
    tracing::debug!("Saved project {}", project_path.display());

    let snapshot = create_snapshot(&*project, snapshot_dir)?;
    report.snapshot = Some(snapshot.clone());

    worker.enqueue_project(&snapshot);
    let mut run = worker.run_all();
    let failure = run.take_first_failure();
    report.worker = Some(run);

    match failure {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
