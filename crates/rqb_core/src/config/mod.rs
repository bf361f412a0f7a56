//! Configuration management.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//!
//! # Example
//!
//! ```no_run
//! use rqb_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new(".config/rqb.toml");
//! config.load_or_create().unwrap();
//!
//! config.settings_mut().worker.executable = "/opt/ae/aerender".to_string();
//! config.update_section(ConfigSection::Worker).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, LoggingSettings, PathSettings, RenderSettings, Settings, WorkerSettings,
};
