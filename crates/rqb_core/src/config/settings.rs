//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently.

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::WorkerGuard;

use crate::logging::{init_tracing_with_file, BatchLogger, LogConfig, LogLevel};
use crate::models::{JobDefaults, PostRenderAction};
use crate::worker::{ExternalRenderWorker, FailurePolicy};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Defaults substituted into jobs at dispatch.
    #[serde(default)]
    pub render: RenderSettings,

    /// External render worker.
    #[serde(default)]
    pub worker: WorkerSettings,

    /// Snapshot and log locations.
    #[serde(default)]
    pub paths: PathSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Logical config sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Render,
    Worker,
    Paths,
    Logging,
}

impl ConfigSection {
    pub const ALL: [ConfigSection; 4] = [Self::Render, Self::Worker, Self::Paths, Self::Logging];

    /// TOML table name.
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Render => "render",
            Self::Worker => "worker",
            Self::Paths => "paths",
            Self::Logging => "logging",
        }
    }

    /// Comment written above the table.
    pub fn comment(&self) -> &'static str {
        match self {
            Self::Render => "# Defaults applied to jobs that do not override them",
            Self::Worker => "# Command-line render worker used for background renders",
            Self::Paths => "# Snapshot, fallback project and log locations",
            Self::Logging => "# Logging configuration",
        }
    }
}

/// Job defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSettings {
    /// Output module template for jobs without one. Empty = unset.
    #[serde(default = "default_output_template")]
    pub default_output_template: String,

    #[serde(default)]
    pub default_post_render_action: PostRenderAction,

    /// Render settings template for jobs without one. Empty = host default.
    #[serde(default)]
    pub default_render_settings: String,
}

fn default_output_template() -> String {
    "Lossless".to_string()
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            default_output_template: default_output_template(),
            default_post_render_action: PostRenderAction::None,
            default_render_settings: String::new(),
        }
    }
}

impl RenderSettings {
    pub fn to_job_defaults(&self) -> JobDefaults {
        JobDefaults {
            output_template: non_empty(&self.default_output_template),
            post_render_action: self.default_post_render_action,
            render_settings: non_empty(&self.default_render_settings),
        }
    }
}

/// External worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerSettings {
    /// Path or bare name of the render executable.
    #[serde(default = "default_executable")]
    pub executable: String,

    /// Flags passed before every invocation's arguments.
    #[serde(default = "default_fixed_flags")]
    pub fixed_flags: Vec<String>,

    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

fn default_executable() -> String {
    "aerender".to_string()
}

fn default_fixed_flags() -> Vec<String> {
    vec!["-continueOnMissingFootage".to_string()]
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            fixed_flags: default_fixed_flags(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl WorkerSettings {
    pub fn build_worker(&self) -> ExternalRenderWorker {
        ExternalRenderWorker::new(&self.executable)
            .with_fixed_flags(self.fixed_flags.clone())
            .with_policy(self.failure_policy)
    }
}

/// Path configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Where snapshots go. Empty = next to the project file.
    #[serde(default)]
    pub snapshot_dir: String,

    /// Where a never-saved project is saved before a background render.
    /// Empty = refuse to render unsaved projects.
    #[serde(default)]
    pub untitled_project: String,

    /// Folder for batch log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            snapshot_dir: String::new(),
            untitled_project: String::new(),
            logs_folder: default_logs_folder(),
        }
    }
}

impl PathSettings {
    /// Snapshot directory, or `None` to write snapshots next to the project.
    pub fn snapshot_dir(&self) -> Option<PathBuf> {
        non_empty(&self.snapshot_dir).map(PathBuf::from)
    }

    /// Fallback save path for never-saved projects.
    pub fn untitled_project(&self) -> Option<PathBuf> {
        non_empty(&self.untitled_project).map(PathBuf::from)
    }

    /// Folder for batch and rolling log files. Empty falls back to `.logs`.
    pub fn logs_dir(&self) -> PathBuf {
        PathBuf::from(non_empty(&self.logs_folder).unwrap_or_else(default_logs_folder))
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default)]
    pub level: LogLevel,

    /// Keep worker output out of batch logs unless it fails.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of worker output lines shown on failure.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    #[serde(default = "default_true")]
    pub show_timestamps: bool,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            compact: true,
            error_tail: default_error_tail(),
            show_timestamps: true,
        }
    }
}

impl LoggingSettings {
    /// Convert to the config used by batch loggers.
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            level: self.level,
            compact: self.compact,
            error_tail: self.error_tail as usize,
            show_timestamps: self.show_timestamps,
        }
    }
}

impl Settings {
    /// Install global tracing, mirrored to a daily file in the logs folder.
    ///
    /// Keep the returned guard alive for as long as logs should be flushed.
    pub fn init_logging(&self) -> WorkerGuard {
        init_tracing_with_file(self.logging.level, &self.paths.logs_dir())
    }

    /// Open a batch log named `batch_name` in the logs folder.
    pub fn batch_logger(&self, batch_name: &str) -> io::Result<BatchLogger> {
        BatchLogger::new(
            batch_name,
            self.paths.logs_dir(),
            self.logging.to_log_config(),
            None,
        )
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
