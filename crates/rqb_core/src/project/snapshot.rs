//! Disposable project snapshots for out-of-process rendering.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use super::{ProjectError, ProjectResult, ProjectStore};

/// Suffixes tried before giving up on a free snapshot name.
const MAX_SNAPSHOT_SUFFIX: u32 = 999;

/// Make sure the project has a backing file and is saved to it.
///
/// A never-saved project is saved to `fallback` when one is given.
pub fn ensure_saved<P: ProjectStore + ?Sized>(
    project: &mut P,
    fallback: Option<&Path>,
) -> ProjectResult<PathBuf> {
    match project.path().map(Path::to_path_buf) {
        Some(path) => {
            project.save()?;
            Ok(path)
        }
        None => {
            let fallback = fallback.ok_or(ProjectError::NoBackingFile)?;
            tracing::info!("Project was never saved, saving as {}", fallback.display());
            project.save_as(fallback)?;
            Ok(fallback.to_path_buf())
        }
    }
}

/// Choose a free snapshot path for `project_path`.
///
/// Names follow `<stem>_render_<YYYYmmdd-HHMMSS>[_n].<ext>`, placed in
/// `dir` or next to the project.
pub fn snapshot_path(
    project_path: &Path,
    dir: Option<&Path>,
    now: DateTime<Local>,
) -> ProjectResult<PathBuf> {
    let dir = dir
        .map(Path::to_path_buf)
        .or_else(|| project_path.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    let stem = project_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "project".to_string());
    let ext = project_path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let base = format!("{}_render_{}", stem, now.format("%Y%m%d-%H%M%S"));

    let first = dir.join(format!("{}{}", base, ext));
    if !first.exists() && first != project_path {
        return Ok(first);
    }
    for n in 1..=MAX_SNAPSHOT_SUFFIX {
        let candidate = dir.join(format!("{}_{}{}", base, n, ext));
        if !candidate.exists() && candidate != project_path {
            return Ok(candidate);
        }
    }
    Err(ProjectError::NoFreeSnapshotName { base: first })
}

/// Copy the saved project to a fresh snapshot file and return its path.
pub fn create_snapshot<P: ProjectStore + ?Sized>(
    project: &P,
    dir: Option<&Path>,
) -> ProjectResult<PathBuf> {
    let project_path = project.path().ok_or(ProjectError::NoBackingFile)?;
    let path = snapshot_path(project_path, dir, Local::now())?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| ProjectError::io("snapshot", parent, e))?;
        }
    }
    project.copy_to(&path)?;

    tracing::info!("Created project snapshot {}", path.display());
    Ok(path)
}
