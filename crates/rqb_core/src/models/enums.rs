//! Core enums shared by the queue adapter and scheduler.

use serde::{Deserialize, Serialize};

/// What the host does with the rendered file once an entry finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostRenderAction {
    /// Leave the project alone.
    #[default]
    None,
    /// Import the rendered file into the project.
    Import,
    /// Import and replace every usage of the source composition.
    ImportAndReplaceUsage,
    /// Import and attach as a proxy of the source composition.
    SetProxy,
}

impl PostRenderAction {
    /// All variants, in declaration order.
    pub const ALL: [PostRenderAction; 4] = [
        Self::None,
        Self::Import,
        Self::ImportAndReplaceUsage,
        Self::SetProxy,
    ];

    /// Get display name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Import => "import",
            Self::ImportAndReplaceUsage => "import_and_replace_usage",
            Self::SetProxy => "set_proxy",
        }
    }
}

impl std::fmt::Display for PostRenderAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of an entry in the host render queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Waiting to render.
    #[default]
    Queued,
    /// Present but not marked for rendering.
    Unqueued,
    /// Missing an output file.
    NeedsOutput,
    /// Currently rendering.
    Rendering,
    /// Stopped by the user.
    UserStopped,
    /// Stopped by an error.
    ErrStopped,
    /// Finished.
    Done,
    /// Partially rendered, will continue on the next render call.
    WillContinue,
}

impl EntryStatus {
    /// Whether the entry is committed to or past execution.
    ///
    /// Such entries must never have their render flag toggled.
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Rendering | Self::Done | Self::WillContinue)
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Queued => "QUEUED",
            Self::Unqueued => "UNQUEUED",
            Self::NeedsOutput => "NEEDS_OUTPUT",
            Self::Rendering => "RENDERING",
            Self::UserStopped => "USER_STOPPED",
            Self::ErrStopped => "ERR_STOPPED",
            Self::Done => "DONE",
            Self::WillContinue => "WILL_CONTINUE",
        };
        f.write_str(s)
    }
}

/// Phase of a scheduler dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DispatchPhase {
    #[default]
    Idle,
    Stashing,
    Injecting,
    Executing,
    Cleanup,
}

impl DispatchPhase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Stashing => "Stashing",
            Self::Injecting => "Injecting",
            Self::Executing => "Executing",
            Self::Cleanup => "Cleanup",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn committed_statuses() {
        assert!(EntryStatus::Rendering.is_committed());
        assert!(EntryStatus::Done.is_committed());
        assert!(EntryStatus::WillContinue.is_committed());
        assert!(!EntryStatus::Queued.is_committed());
        assert!(!EntryStatus::UserStopped.is_committed());
        assert!(!EntryStatus::ErrStopped.is_committed());
    }

    #[test]
    fn post_render_action_serializes_snake_case() {
        let json = serde_json::to_string(&PostRenderAction::ImportAndReplaceUsage).unwrap();
        assert_eq!(json, "\"import_and_replace_usage\"");
        let parsed: PostRenderAction = serde_json::from_str("\"set_proxy\"").unwrap();
        assert_eq!(parsed, PostRenderAction::SetProxy);
    }
}
