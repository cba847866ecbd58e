use std::io::Write;

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::workspace::{ensure_parent, Workspace};
use super::{params_schema, ToolError, ToolHandler, ToolName, ToolOutcome, ToolReturn};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AppendToFileParams {
    #[schemars(description = "Path of the file to extend, relative to the workspace")]
    pub filepath: String,

    #[schemars(description = "Text appended at the end of the file")]
    pub content: String,
}

pub struct AppendToFile {
    workspace: Workspace,
}

impl AppendToFile {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

impl ToolHandler for AppendToFile {
    fn name(&self) -> ToolName {
        ToolName::AppendToFile
    }

    fn description(&self) -> &'static str {
        "Append text to the end of a file, creating it if needed."
    }

    fn parameters(&self) -> Value {
        params_schema::<AppendToFileParams>()
    }

    fn execute(&self, args: Value) -> Result<ToolReturn, ToolError> {
        let params: AppendToFileParams = serde_json::from_value(args)?;
        let path = self.workspace.resolve(&params.filepath)?;
        ensure_parent(&path)?;

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(ToolError::io(&path))?;
        file.write_all(params.content.as_bytes())
            .map_err(ToolError::io(&path))?;

        Ok(ToolOutcome::success(format!(
            "Content successfully appended to '{}'.",
            self.workspace.display(&path)
        ))
        .into())
    }
}
