use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::workspace::{write_atomic, Workspace};
use super::{params_schema, ToolError, ToolHandler, ToolName, ToolOutcome, ToolReturn};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateFileParams {
    #[schemars(description = "Path of the new file, relative to the workspace")]
    pub filepath: String,

    #[schemars(description = "Initial file content")]
    #[serde(default)]
    pub content: String,

    #[schemars(description = "Replace the file if it already exists. Defaults to false.")]
    #[serde(default)]
    pub overwrite: bool,
}

pub struct CreateFile {
    workspace: Workspace,
}

impl CreateFile {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

impl ToolHandler for CreateFile {
    fn name(&self) -> ToolName {
        ToolName::CreateFile
    }

    fn description(&self) -> &'static str {
        "Create a new text file with the given content. Existing files are left untouched unless overwrite is true."
    }

    fn parameters(&self) -> Value {
        params_schema::<CreateFileParams>()
    }

    fn execute(&self, args: Value) -> Result<ToolReturn, ToolError> {
        let params: CreateFileParams = serde_json::from_value(args)?;
        let path = self.workspace.resolve(&params.filepath)?;
        let shown = self.workspace.display(&path);

        if path.exists() && !params.overwrite {
            return Ok(ToolOutcome::warning(format!(
                "File '{shown}' already exists. File not modified."
            ))
            .into());
        }

        write_atomic(&path, &params.content)?;
        Ok(ToolOutcome::success(format!("File '{shown}' successfully created.")).into())
    }
}
