use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use walkdir::WalkDir;

use super::workspace::Workspace;
use super::{params_schema, ToolError, ToolHandler, ToolName, ToolOutcome, ToolReturn};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListDirectoryParams {
    #[schemars(description = "Directory to list, relative to the workspace ('.' for the root)")]
    pub dirpath: String,

    #[schemars(description = "List files only, skipping directories. Defaults to false.")]
    #[serde(default)]
    pub only_files: bool,

    #[schemars(description = "Keep only entries with these extensions, e.g. [\"txt\", \".md\"]")]
    #[serde(default)]
    pub filter_ext: Option<Vec<String>>,

    #[schemars(description = "Descend into subdirectories. Defaults to false.")]
    #[serde(default)]
    pub recursive: bool,
}

pub struct ListDirectory {
    workspace: Workspace,
}

impl ListDirectory {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

fn normalize_ext(ext: &str) -> String {
    ext.trim_start_matches('.').to_lowercase()
}

impl ToolHandler for ListDirectory {
    fn name(&self) -> ToolName {
        ToolName::ListDirectory
    }

    fn description(&self) -> &'static str {
        "List the contents of a directory, optionally recursive and filtered by extension."
    }

    fn parameters(&self) -> Value {
        params_schema::<ListDirectoryParams>()
    }

    fn execute(&self, args: Value) -> Result<ToolReturn, ToolError> {
        let params: ListDirectoryParams = serde_json::from_value(args)?;
        let dir = self.workspace.resolve(&params.dirpath)?;
        let shown = self.workspace.display(&dir);

        if !dir.is_dir() {
            return Ok(ToolOutcome::error(format!(
                "Directory '{shown}' was not found or is not a folder."
            ))
            .into());
        }

        let wanted: Option<Vec<String>> = params
            .filter_ext
            .filter(|exts| !exts.is_empty())
            .map(|exts| exts.iter().map(|e| normalize_ext(e)).collect());

        let walker = WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(if params.recursive { usize::MAX } else { 1 })
            .sort_by_file_name();

        let mut items = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| {
                ToolError::Validation(format!("Error listing directory '{shown}': {e}"))
            })?;
            if params.only_files && !entry.file_type().is_file() {
                continue;
            }
            if let Some(wanted) = &wanted {
                let ext = entry
                    .path()
                    .extension()
                    .map(|e| normalize_ext(&e.to_string_lossy()));
                if !ext.is_some_and(|ext| wanted.contains(&ext)) {
                    continue;
                }
            }
            let relative = entry.path().strip_prefix(&dir).unwrap_or(entry.path());
            items.push(relative.display().to_string());
        }

        Ok(ToolOutcome::success_with(
            format!("Listed {} item(s) in directory '{shown}'.", items.len()),
            json!({
                "count": items.len(),
                "items": items,
                "absolute_path": dir.display().to_string(),
            }),
        )
        .into())
    }
}
