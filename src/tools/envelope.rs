//! Normalized tool results.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result envelope handed back to the model: `{"status", "message", "data"?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ToolOutcome {
    Success {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
    },
    Warning {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
    },
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
    },
}

impl ToolOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self::Success {
            message: message.into(),
            data: None,
        }
    }

    pub fn success_with(message: impl Into<String>, data: Value) -> Self {
        Self::Success {
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::Warning {
            message: message.into(),
            data: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            data: None,
        }
    }

    pub fn error_with(message: impl Into<String>, data: Value) -> Self {
        Self::Error {
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Warning { .. } => "warning",
            Self::Error { .. } => "error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Success { message, .. }
            | Self::Warning { message, .. }
            | Self::Error { message, .. } => message,
        }
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            Self::Success { data, .. } | Self::Warning { data, .. } | Self::Error { data, .. } => {
                data.as_ref()
            }
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// JSON text for a function-call output entry.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"status":"error","message":"unencodable tool result: {e}"}}"#)
        })
    }
}

/// What a handler produces: a bare value (wrapped as success) or a finished envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolReturn {
    Raw(Value),
    Envelope(ToolOutcome),
}

impl From<ToolOutcome> for ToolReturn {
    fn from(outcome: ToolOutcome) -> Self {
        Self::Envelope(outcome)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),

    #[error("Error accessing '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ToolError {
    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelopes_serialize_flat_with_status_tag() {
        let ok = ToolOutcome::success_with("done", json!({"count": 2}));
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"status": "success", "message": "done", "data": {"count": 2}})
        );

        let err = ToolOutcome::error("nope");
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"status": "error", "message": "nope"})
        );
    }

    #[test]
    fn envelope_parses_back_from_output_text() {
        let text = ToolOutcome::warning("exists").to_json_string();
        let back: ToolOutcome = serde_json::from_str(&text).unwrap();
        assert_eq!(back.status(), "warning");
        assert_eq!(back.message(), "exists");
        assert!(back.data().is_none());
    }
}
