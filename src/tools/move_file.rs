use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::workspace::{ensure_parent, Workspace};
use super::{params_schema, ToolError, ToolHandler, ToolName, ToolOutcome, ToolReturn};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MoveFileParams {
    #[schemars(description = "File to move, relative to the workspace")]
    pub src: String,

    #[schemars(description = "Destination file path or directory, relative to the workspace")]
    pub dst: String,

    #[schemars(description = "Replace an existing destination file. Defaults to false.")]
    #[serde(default)]
    pub overwrite: bool,
}

pub struct MoveFile {
    workspace: Workspace,
}

impl MoveFile {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

impl ToolHandler for MoveFile {
    fn name(&self) -> ToolName {
        ToolName::MoveFile
    }

    fn description(&self) -> &'static str {
        "Move a file to another path or into a directory."
    }

    fn parameters(&self) -> Value {
        params_schema::<MoveFileParams>()
    }

    fn execute(&self, args: Value) -> Result<ToolReturn, ToolError> {
        let params: MoveFileParams = serde_json::from_value(args)?;
        let src = self.workspace.resolve(&params.src)?;
        let dst = self.workspace.resolve(&params.dst)?;

        if !src.is_file() {
            return Ok(ToolOutcome::error(format!(
                "Source file '{}' not found.",
                self.workspace.display(&src)
            ))
            .into());
        }

        // an existing directory, or an extensionless path that does not exist yet, is a folder target
        let into_dir = dst.is_dir() || (dst.extension().is_none() && !dst.exists());
        let target = match (into_dir, src.file_name()) {
            (true, Some(name)) => dst.join(name),
            _ => dst,
        };
        let shown = self.workspace.display(&target);

        if target.exists() && !params.overwrite {
            return Ok(ToolOutcome::warning(format!(
                "File '{shown}' already exists. Use overwrite=true to overwrite."
            ))
            .into());
        }

        ensure_parent(&target)?;
        std::fs::rename(&src, &target).map_err(ToolError::io(&src))?;
        Ok(ToolOutcome::success(format!(
            "File '{}' successfully moved to '{shown}'.",
            self.workspace.display(&src)
        ))
        .into())
    }
}
