//! Render job definitions and late-bound default resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::enums::PostRenderAction;

/// Reference to a composition in the host project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompositionRef {
    /// Host item id.
    pub id: u64,
    /// Composition name (for logs only).
    pub name: String,
}

impl CompositionRef {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl std::fmt::Display for CompositionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (#{})", self.name, self.id)
    }
}

/// Errors raised when a job cannot be submitted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidJobError {
    #[error("Job for '{composition}' has an empty output path")]
    EmptyOutputPath { composition: String },

    #[error("Job for '{composition}' has no output template and no default is set")]
    UnresolvedTemplate { composition: String },
}

/// One unit of render work.
///
/// Template and post-render action left as `None` are resolved against the
/// scheduler defaults at dispatch time, not when the job is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderJob {
    composition: CompositionRef,
    output_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    output_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    post_render_action: Option<PostRenderAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    render_settings: Option<String>,
}

impl RenderJob {
    /// Create a job with every optional setting left to the defaults.
    pub fn new(composition: CompositionRef, output_path: impl Into<PathBuf>) -> Self {
        Self {
            composition,
            output_path: output_path.into(),
            output_template: None,
            post_render_action: None,
            render_settings: None,
        }
    }

    /// Override the output module template.
    pub fn with_output_template(mut self, template: impl Into<String>) -> Self {
        self.output_template = Some(template.into());
        self
    }

    /// Override the post-render action.
    pub fn with_post_render_action(mut self, action: PostRenderAction) -> Self {
        self.post_render_action = Some(action);
        self
    }

    /// Override the render settings template.
    pub fn with_render_settings(mut self, template: impl Into<String>) -> Self {
        self.render_settings = Some(template.into());
        self
    }

    pub fn composition(&self) -> &CompositionRef {
        &self.composition
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn output_template(&self) -> Option<&str> {
        self.output_template.as_deref()
    }

    pub fn post_render_action(&self) -> Option<PostRenderAction> {
        self.post_render_action
    }

    pub fn render_settings(&self) -> Option<&str> {
        self.render_settings.as_deref()
    }

    /// Check the parts of the job that do not depend on defaults.
    pub fn validate(&self) -> Result<(), InvalidJobError> {
        if self.output_path.as_os_str().is_empty() {
            return Err(InvalidJobError::EmptyOutputPath {
                composition: self.composition.name.clone(),
            });
        }
        Ok(())
    }

    /// Resolve unset settings against the given defaults.
    pub fn resolve(&self, defaults: &JobDefaults) -> Result<ResolvedJob, InvalidJobError> {
        self.validate()?;

        // An empty explicit template means "use the default" as well.
        let output_template = self
            .output_template
            .as_deref()
            .filter(|t| !t.is_empty())
            .or(defaults.output_template.as_deref().filter(|t| !t.is_empty()))
            .ok_or_else(|| InvalidJobError::UnresolvedTemplate {
                composition: self.composition.name.clone(),
            })?
            .to_string();

        Ok(ResolvedJob {
            composition: self.composition.clone(),
            output_path: self.output_path.clone(),
            output_template,
            post_render_action: self
                .post_render_action
                .unwrap_or(defaults.post_render_action),
            render_settings: self
                .render_settings
                .clone()
                .or_else(|| defaults.render_settings.clone()),
        })
    }
}

/// Scheduler-wide defaults substituted into jobs at dispatch time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDefaults {
    pub output_template: Option<String>,
    pub post_render_action: PostRenderAction,
    /// `None` leaves the host's render settings untouched.
    pub render_settings: Option<String>,
}

/// A job with every setting bound, ready for the host queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedJob {
    pub composition: CompositionRef,
    pub output_path: PathBuf,
    pub output_template: String,
    pub post_render_action: PostRenderAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_settings: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comp() -> CompositionRef {
        CompositionRef::new(7, "Main Comp")
    }

    #[test]
    fn resolve_uses_defaults_for_unset_fields() {
        let job = RenderJob::new(comp(), "/tmp/a.mov");
        let defaults = JobDefaults {
            output_template: Some("Lossless".to_string()),
            post_render_action: PostRenderAction::Import,
            render_settings: Some("Best Settings".to_string()),
        };

        let resolved = job.resolve(&defaults).unwrap();
        assert_eq!(resolved.output_template, "Lossless");
        assert_eq!(resolved.post_render_action, PostRenderAction::Import);
        assert_eq!(resolved.render_settings.as_deref(), Some("Best Settings"));
    }

    #[test]
    fn explicit_overrides_win() {
        let job = RenderJob::new(comp(), "/tmp/a.mov")
            .with_output_template("T1")
            .with_post_render_action(PostRenderAction::SetProxy)
            .with_render_settings("Draft");
        let defaults = JobDefaults {
            output_template: Some("Lossless".to_string()),
            ..Default::default()
        };

        let resolved = job.resolve(&defaults).unwrap();
        assert_eq!(resolved.output_template, "T1");
        assert_eq!(resolved.post_render_action, PostRenderAction::SetProxy);
        assert_eq!(resolved.render_settings.as_deref(), Some("Draft"));
    }

    #[test]
    fn empty_output_path_is_rejected() {
        let job = RenderJob::new(comp(), "");
        assert_eq!(
            job.validate(),
            Err(InvalidJobError::EmptyOutputPath {
                composition: "Main Comp".to_string()
            })
        );
    }

    #[test]
    fn missing_template_without_default_is_rejected() {
        let job = RenderJob::new(comp(), "/tmp/a.mov").with_output_template("");
        let err = job.resolve(&JobDefaults::default()).unwrap_err();
        assert!(matches!(err, InvalidJobError::UnresolvedTemplate { .. }));
        assert!(err.to_string().contains("Main Comp"));
    }
}
