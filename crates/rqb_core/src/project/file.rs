//! File-backed project document.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{ProjectError, ProjectResult, ProjectStore};

/// A project held in memory and persisted as a single file.
#[derive(Debug, Clone, Default)]
pub struct FileProject {
    path: Option<PathBuf>,
    contents: Vec<u8>,
    dirty: bool,
    saves: usize,
}

impl FileProject {
    /// A project that has never been saved.
    pub fn untitled(contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: None,
            contents: contents.into(),
            dirty: true,
            saves: 0,
        }
    }

    /// Open an existing project file.
    pub fn open(path: impl Into<PathBuf>) -> ProjectResult<Self> {
        let path = path.into();
        let contents = fs::read(&path).map_err(|e| ProjectError::io("open", &path, e))?;
        Ok(Self {
            path: Some(path),
            contents,
            dirty: false,
            saves: 0,
        })
    }

    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    /// Replace the in-memory contents (marks the project modified).
    pub fn set_contents(&mut self, contents: impl Into<Vec<u8>>) {
        self.contents = contents.into();
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of successful saves since the project was opened.
    pub fn save_count(&self) -> usize {
        self.saves
    }

    /// Write contents to `path` atomically (temp file, then rename).
    fn write_to(&self, path: &Path) -> ProjectResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| ProjectError::io("save", parent, e))?;
            }
        }

        let temp_path = path.with_extension("tmp");
        {
            let mut file =
                fs::File::create(&temp_path).map_err(|e| ProjectError::io("save", &temp_path, e))?;
            file.write_all(&self.contents)
                .and_then(|_| file.sync_all())
                .map_err(|e| ProjectError::io("save", &temp_path, e))?;
        }
        fs::rename(&temp_path, path).map_err(|e| ProjectError::io("save", path, e))?;
        Ok(())
    }
}

impl ProjectStore for FileProject {
    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn save(&mut self) -> ProjectResult<()> {
        let path = self.path.clone().ok_or(ProjectError::NoBackingFile)?;
        self.write_to(&path)?;
        self.dirty = false;
        self.saves += 1;
        tracing::debug!("Saved project {}", path.display());
        Ok(())
    }

    fn save_as(&mut self, path: &Path) -> ProjectResult<()> {
        self.write_to(path)?;
        self.path = Some(path.to_path_buf());
        self.dirty = false;
        self.saves += 1;
        tracing::debug!("Saved project as {}", path.display());
        Ok(())
    }

    fn copy_to(&self, path: &Path) -> ProjectResult<()> {
        let source = self.path.as_deref().ok_or(ProjectError::NoBackingFile)?;
        fs::copy(source, path).map_err(|e| ProjectError::io("copy", path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_without_path_fails() {
        let mut project = FileProject::untitled("data");
        assert!(matches!(project.save(), Err(ProjectError::NoBackingFile)));
    }

    #[test]
    fn save_as_sets_path_and_clears_dirty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("show.aep");
        let mut project = FileProject::untitled("data");

        project.save_as(&path).unwrap();

        assert_eq!(project.path(), Some(path.as_path()));
        assert!(!project.is_dirty());
        assert_eq!(fs::read(&path).unwrap(), b"data");
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn copy_to_leaves_path_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("show.aep");
        let copy = dir.path().join("copy.aep");
        fs::write(&path, b"saved").unwrap();

        let project = FileProject::open(&path).unwrap();
        project.copy_to(&copy).unwrap();

        assert_eq!(project.path(), Some(path.as_path()));
        assert_eq!(fs::read(&copy).unwrap(), b"saved");
    }
}
