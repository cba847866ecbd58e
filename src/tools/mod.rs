//! Built-in file tools and the registry that dispatches model tool calls.
//!
//! Each tool is a [`ToolHandler`] registered under a [`ToolName`]. The
//! [`ToolRegistry`] is the only way calls reach a handler: it parses the
//! name and arguments, runs the handler and folds every result, including
//! failures, into a [`ToolOutcome`] envelope.

pub mod append_to_file;
pub mod create_file;
pub mod delete_file;
pub mod envelope;
pub mod list_directory;
pub mod move_file;
pub mod read_file;
pub mod workspace;
pub mod write_file;

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;

use schemars::JsonSchema;
use serde_json::{json, Value};

use crate::llm::ToolSchema;

pub use envelope::{ToolError, ToolOutcome, ToolReturn};
pub use workspace::Workspace;

/// Message used when a handler returns a bare value.
pub const SUCCESS_MESSAGE: &str = "Tool executed successfully.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ToolName {
    CreateFile,
    ReadFile,
    WriteFile,
    AppendToFile,
    DeleteFile,
    ListDirectory,
    MoveFile,
}

impl ToolName {
    pub const ALL: [ToolName; 7] = [
        Self::CreateFile,
        Self::ReadFile,
        Self::WriteFile,
        Self::AppendToFile,
        Self::DeleteFile,
        Self::ListDirectory,
        Self::MoveFile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateFile => "create_file",
            Self::ReadFile => "read_file",
            Self::WriteFile => "write_file",
            Self::AppendToFile => "append_to_file",
            Self::DeleteFile => "delete_file",
            Self::ListDirectory => "list_directory",
            Self::MoveFile => "move_file",
        }
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ToolName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| format!("unknown tool: {s}"))
    }
}

/// One executable tool.
pub trait ToolHandler: Send + Sync {
    fn name(&self) -> ToolName;

    fn description(&self) -> &'static str;

    /// JSON Schema of the argument object.
    fn parameters(&self) -> Value;

    fn execute(&self, args: Value) -> Result<ToolReturn, ToolError>;
}

/// JSON Schema for a parameter struct, without the meta keys models reject.
pub fn params_schema<T: JsonSchema>() -> Value {
    let mut value = serde_json::to_value(schemars::schema_for!(T))
        .unwrap_or_else(|_| json!({"type": "object"}));
    if let Some(object) = value.as_object_mut() {
        object.remove("$schema");
        object.remove("title");
    }
    value
}

pub struct ToolRegistry {
    handlers: BTreeMap<ToolName, Box<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// All file tools, sandboxed to `workspace_dir`.
    pub fn builtin(workspace_dir: impl Into<PathBuf>) -> Self {
        let ws = Workspace::new(workspace_dir);
        let mut registry = Self::new();
        registry.register(create_file::CreateFile::new(ws.clone()));
        registry.register(read_file::ReadFile::new(ws.clone()));
        registry.register(write_file::WriteFile::new(ws.clone()));
        registry.register(append_to_file::AppendToFile::new(ws.clone()));
        registry.register(delete_file::DeleteFile::new(ws.clone()));
        registry.register(list_directory::ListDirectory::new(ws.clone()));
        registry.register(move_file::MoveFile::new(ws));
        registry
    }

    pub fn register(&mut self, handler: impl ToolHandler + 'static) {
        self.handlers.insert(handler.name(), Box::new(handler));
    }

    /// Function-calling schema advertised to the model.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.handlers
            .values()
            .map(|h| ToolSchema {
                name: h.name().as_str().to_string(),
                description: h.description().to_string(),
                parameters: h.parameters(),
            })
            .collect()
    }

    /// Run tool `name`. Never fails: every problem becomes an error envelope.
    pub fn execute(&self, name: &str, args: Value) -> ToolOutcome {
        let handler = name
            .parse::<ToolName>()
            .ok()
            .and_then(|tool| self.handlers.get(&tool));
        let Some(handler) = handler else {
            tracing::warn!(tool = name, "unknown tool requested");
            return ToolOutcome::error_with(
                format!("Tool '{name}' not found or not implemented."),
                json!({"tool": name, "args": args}),
            );
        };

        let result = panic::catch_unwind(AssertUnwindSafe(|| handler.execute(args.clone())));
        let outcome = match result {
            Ok(Ok(ToolReturn::Raw(data))) => ToolOutcome::success_with(SUCCESS_MESSAGE, data),
            Ok(Ok(ToolReturn::Envelope(outcome))) => outcome,
            Ok(Err(e)) => ToolOutcome::error_with(e.to_string(), json!({"tool": name, "args": args})),
            Err(payload) => {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!(tool = name, reason = %reason, "tool panicked");
                ToolOutcome::error_with(
                    format!("Tool '{name}' panicked: {reason}"),
                    json!({"tool": name, "args": args}),
                )
            }
        };
        tracing::info!(tool = name, status = outcome.status(), "tool executed");
        outcome
    }

    /// Run a call whose arguments are still the model's raw JSON text.
    pub fn execute_call(&self, name: &str, arguments: &str) -> ToolOutcome {
        let args = if arguments.trim().is_empty() {
            Ok(json!({}))
        } else {
            serde_json::from_str::<Value>(arguments)
        };
        match args {
            Ok(args) => self.execute(name, args),
            Err(e) => ToolOutcome::error_with(
                format!("Invalid JSON arguments: {e}"),
                json!({"tool": name, "args": arguments}),
            ),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_names_round_trip() {
        for name in ToolName::ALL {
            assert_eq!(name.as_str().parse::<ToolName>().unwrap(), name);
        }
        assert!("rm_rf".parse::<ToolName>().is_err());
    }

    #[test]
    fn builtin_registry_advertises_every_tool() {
        let tmp = tempfile::TempDir::new().unwrap();
        let registry = ToolRegistry::builtin(tmp.path());
        let schemas = registry.schemas();
        assert_eq!(schemas.len(), ToolName::ALL.len());

        let read = schemas.iter().find(|s| s.name == "read_file").unwrap();
        assert_eq!(read.parameters["type"], "object");
        assert!(read.parameters["properties"]["filepath"].is_object());
        assert!(read.parameters.get("$schema").is_none());
    }

    #[test]
    fn unknown_tool_is_an_error_envelope() {
        let registry = ToolRegistry::new();
        let outcome = registry.execute("launch_rockets", json!({"n": 1}));
        assert!(outcome.is_error());
        assert_eq!(outcome.message(), "Tool 'launch_rockets' not found or not implemented.");
        assert_eq!(outcome.data().unwrap()["args"]["n"], 1);
    }

    struct Exploding;

    impl ToolHandler for Exploding {
        fn name(&self) -> ToolName {
            ToolName::ReadFile
        }

        fn description(&self) -> &'static str {
            "always panics"
        }

        fn parameters(&self) -> Value {
            json!({"type": "object"})
        }

        fn execute(&self, _args: Value) -> Result<ToolReturn, ToolError> {
            panic!("disk on fire")
        }
    }

    #[test]
    fn panicking_handler_becomes_an_error_envelope() {
        let mut registry = ToolRegistry::new();
        registry.register(Exploding);
        let outcome = registry.execute("read_file", json!({"filepath": "a.txt"}));
        assert!(outcome.is_error());
        assert_eq!(outcome.message(), "Tool 'read_file' panicked: disk on fire");
        assert_eq!(outcome.data().unwrap()["args"]["filepath"], "a.txt");
    }

    #[test]
    fn malformed_arguments_are_an_error_envelope() {
        let tmp = tempfile::TempDir::new().unwrap();
        let registry = ToolRegistry::builtin(tmp.path());
        let outcome = registry.execute_call("read_file", "{not json");
        assert!(outcome.is_error());
        assert_eq!(outcome.data().unwrap()["tool"], "read_file");
    }

    #[test]
    fn missing_required_argument_is_reported() {
        let tmp = tempfile::TempDir::new().unwrap();
        let registry = ToolRegistry::builtin(tmp.path());
        let outcome = registry.execute("read_file", json!({}));
        assert!(outcome.is_error());
        assert!(outcome.message().starts_with("Invalid arguments"));
    }
}
