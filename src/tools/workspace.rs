//! Sandbox root for file tools.
//!
//! Every path a tool receives is resolved against the workspace directory.
//! Empty paths, `..` components and absolute paths outside the workspace are
//! rejected before any file is touched.

use std::io::Write;
use std::path::{Component, Path, PathBuf};

use super::envelope::ToolError;

#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a tool-supplied path onto a location inside the workspace.
    pub fn resolve(&self, raw: &str) -> Result<PathBuf, ToolError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ToolError::Validation("Path must not be empty.".into()));
        }
        let path = Path::new(raw);
        if path.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(ToolError::Validation(format!(
                "Path '{raw}' must not contain '..'."
            )));
        }
        if path.is_absolute() {
            if path.starts_with(&self.root) {
                return Ok(path.to_path_buf());
            }
            return Err(ToolError::Validation(format!(
                "Path '{raw}' is outside the workspace."
            )));
        }
        Ok(self.root.join(path))
    }

    /// Workspace-relative form of `path` for messages.
    pub fn display(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

pub fn ensure_parent(path: &Path) -> Result<(), ToolError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(ToolError::io(parent))?;
    }
    Ok(())
}

/// Write through a temp file in the same directory, then rename over `path`.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), ToolError> {
    ensure_parent(path)?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(ToolError::io(dir))?;
    tmp.write_all(content.as_bytes()).map_err(ToolError::io(path))?;
    tmp.persist(path)
        .map_err(|e| ToolError::io(path)(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_land_under_root() {
        let ws = Workspace::new("/srv/ws");
        assert_eq!(ws.resolve("notes/a.txt").unwrap(), PathBuf::from("/srv/ws/notes/a.txt"));
        assert_eq!(ws.resolve("/srv/ws/b.txt").unwrap(), PathBuf::from("/srv/ws/b.txt"));
    }

    #[test]
    fn escaping_paths_are_rejected() {
        let ws = Workspace::new("/srv/ws");
        for bad in ["", "   ", "../etc/passwd", "a/../../b", "/etc/passwd"] {
            assert!(
                matches!(ws.resolve(bad), Err(ToolError::Validation(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn display_is_workspace_relative() {
        let ws = Workspace::new("/srv/ws");
        assert_eq!(ws.display(Path::new("/srv/ws/x/y.txt")), "x/y.txt");
    }

    #[test]
    fn atomic_write_creates_parents() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("a").join("b.txt");
        write_atomic(&path, "hello").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
    }
}
