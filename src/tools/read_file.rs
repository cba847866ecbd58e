use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::workspace::Workspace;
use super::{params_schema, ToolError, ToolHandler, ToolName, ToolOutcome, ToolReturn};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadFileParams {
    #[schemars(description = "Path of the file to read, relative to the workspace")]
    pub filepath: String,
}

pub struct ReadFile {
    workspace: Workspace,
}

impl ReadFile {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

impl ToolHandler for ReadFile {
    fn name(&self) -> ToolName {
        ToolName::ReadFile
    }

    fn description(&self) -> &'static str {
        "Read the full content of a text file."
    }

    fn parameters(&self) -> Value {
        params_schema::<ReadFileParams>()
    }

    fn execute(&self, args: Value) -> Result<ToolReturn, ToolError> {
        let params: ReadFileParams = serde_json::from_value(args)?;
        let path = self.workspace.resolve(&params.filepath)?;

        if !path.is_file() {
            return Ok(ToolOutcome::error(format!(
                "File '{}' not found.",
                self.workspace.display(&path)
            ))
            .into());
        }

        let bytes = std::fs::read(&path).map_err(ToolError::io(&path))?;
        let content = String::from_utf8_lossy(&bytes).into_owned();
        Ok(ToolReturn::Raw(Value::String(content)))
    }
}
