use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};

use super::workspace::Workspace;
use super::{default_true, params_schema, ToolError, ToolHandler, ToolName, ToolOutcome, ToolReturn};

pub const TRASH_DIR: &str = ".trash";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteFileParams {
    #[schemars(description = "Path of the file to delete, relative to the workspace")]
    pub filepath: String,

    #[schemars(description = "Move the file into .trash instead of removing it. Defaults to true.")]
    #[serde(default = "default_true")]
    pub safe_delete: bool,
}

pub struct DeleteFile {
    workspace: Workspace,
}

impl DeleteFile {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

/// `<dir>/.trash/<stem>_<YYYYmmdd_HHMMSS><.ext>`
fn trash_path(path: &Path) -> PathBuf {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    dir.join(TRASH_DIR).join(format!("{stem}_{stamp}{ext}"))
}

impl ToolHandler for DeleteFile {
    fn name(&self) -> ToolName {
        ToolName::DeleteFile
    }

    fn description(&self) -> &'static str {
        "Delete a file. By default the file is moved to a .trash folder next to it."
    }

    fn parameters(&self) -> Value {
        params_schema::<DeleteFileParams>()
    }

    fn execute(&self, args: Value) -> Result<ToolReturn, ToolError> {
        let params: DeleteFileParams = serde_json::from_value(args)?;
        let path = self.workspace.resolve(&params.filepath)?;
        let shown = self.workspace.display(&path);

        if !path.is_file() {
            return Ok(ToolOutcome::warning(format!("File '{shown}' not found.")).into());
        }

        if !params.safe_delete {
            std::fs::remove_file(&path).map_err(ToolError::io(&path))?;
            return Ok(ToolOutcome::success(format!("File '{shown}' permanently deleted.")).into());
        }

        let target = trash_path(&path);
        if let Some(trash) = target.parent() {
            std::fs::create_dir_all(trash).map_err(ToolError::io(trash))?;
        }
        std::fs::rename(&path, &target).map_err(ToolError::io(&path))?;
        Ok(ToolOutcome::success_with(
            format!("File '{shown}' moved to trash."),
            json!({"trash_path": self.workspace.display(&target)}),
        )
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trash_name_keeps_stem_and_extension() {
        let target = trash_path(Path::new("/ws/notes/todo.md"));
        assert_eq!(target.parent().unwrap(), Path::new("/ws/notes/.trash"));
        let name = target.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("todo_"));
        assert!(name.ends_with(".md"));
        // todo_ + YYYYmmdd_HHMMSS + .md
        assert_eq!(name.len(), "todo_".len() + 15 + ".md".len());
    }
}
