use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::workspace::{ensure_parent, write_atomic, Workspace};
use super::{default_true, params_schema, ToolError, ToolHandler, ToolName, ToolOutcome, ToolReturn};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct WriteFileParams {
    #[schemars(description = "Path of the file to write, relative to the workspace")]
    pub filepath: String,

    #[schemars(description = "New file content; replaces whatever is there")]
    pub content: String,

    #[schemars(description = "Write through a temporary file and rename. Defaults to true.")]
    #[serde(default = "default_true")]
    pub safe_write: bool,
}

pub struct WriteFile {
    workspace: Workspace,
}

impl WriteFile {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

impl ToolHandler for WriteFile {
    fn name(&self) -> ToolName {
        ToolName::WriteFile
    }

    fn description(&self) -> &'static str {
        "Write (create or overwrite) a text file."
    }

    fn parameters(&self) -> Value {
        params_schema::<WriteFileParams>()
    }

    fn execute(&self, args: Value) -> Result<ToolReturn, ToolError> {
        let params: WriteFileParams = serde_json::from_value(args)?;
        let path = self.workspace.resolve(&params.filepath)?;

        if params.safe_write {
            write_atomic(&path, &params.content)?;
        } else {
            ensure_parent(&path)?;
            std::fs::write(&path, &params.content).map_err(ToolError::io(&path))?;
        }

        Ok(ToolOutcome::success(format!(
            "File '{}' successfully written.",
            self.workspace.display(&path)
        ))
        .into())
    }
}
