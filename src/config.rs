use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct RecollectConfig {
    pub agent: AgentConfig,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub model: ModelConfig,
    pub memory: MemoryConfig,
    pub tools: ToolsConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AgentConfig {
    pub log_level: String,
    pub system_prompt: String,
    /// Upper bound on model invocations within one agent run.
    pub max_hops: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
    pub session_id: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    pub cache_dir: String,
    pub dimensions: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ModelConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub summary_model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MemoryConfig {
    pub recent_last_n: usize,
    pub recent_max_tokens: usize,
    pub relevant_last_n: usize,
    pub relevant_top_k: usize,
    pub relevant_min_score: f32,
    pub relevant_max_tokens: usize,
    pub summary_top_k: usize,
    pub summary_min_score: f32,
    pub summary_max_tokens: usize,
    pub summary_cycle: u32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ToolsConfig {
    pub workspace_dir: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            system_prompt: "Your name is Nano. You are an advanced AI assistant designed to assist users."
                .into(),
            max_hops: 16,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_recollect_dir()
                .join("data")
                .to_string_lossy()
                .into_owned(),
            session_id: "default".into(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let cache_dir = default_recollect_dir()
            .join("models")
            .to_string_lossy()
            .into_owned();
        Self {
            provider: "local".into(),
            model: "all-MiniLM-L6-v2".into(),
            cache_dir,
            dimensions: crate::embedding::EMBEDDING_DIM,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            api_key: None,
            model: "gpt-5-mini".into(),
            summary_model: "gpt-4o-mini".into(),
            temperature: None,
            max_tokens: Some(4096),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            recent_last_n: 10,
            recent_max_tokens: 2048,
            relevant_last_n: 10,
            relevant_top_k: 5,
            relevant_min_score: 0.3,
            relevant_max_tokens: 1024,
            summary_top_k: 3,
            summary_min_score: 0.3,
            summary_max_tokens: 1024,
            summary_cycle: 2,
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            workspace_dir: default_recollect_dir()
                .join("workspace")
                .to_string_lossy()
                .into_owned(),
        }
    }
}

/// Returns `~/.recollect/`, or `./.recollect` when no home directory is known.
pub fn default_recollect_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".recollect")
}

/// Returns the default config file path: `~/.recollect/config.toml`
pub fn default_config_path() -> PathBuf {
    default_recollect_dir().join("config.toml")
}

impl RecollectConfig {
    /// Load config from the default TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            RecollectConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("RECOLLECT_DATA_DIR") {
            self.storage.data_dir = val;
        }
        if let Ok(val) = std::env::var("RECOLLECT_SESSION") {
            self.storage.session_id = val;
        }
        if let Ok(val) = std::env::var("RECOLLECT_LOG_LEVEL") {
            self.agent.log_level = val;
        }
        if let Ok(val) = std::env::var("RECOLLECT_MODEL") {
            self.model.model = val;
        }
        if let Ok(val) = std::env::var("OPENAI_BASE_URL") {
            self.model.base_url = val;
        }
        if let Ok(val) = std::env::var("OPENAI_API_KEY") {
            if !val.is_empty() {
                self.model.api_key = Some(val);
            }
        }
    }

    /// Directory holding every persisted file of the configured session.
    pub fn session_dir(&self) -> PathBuf {
        expand_tilde(&self.storage.data_dir)
            .join("sessions")
            .join(&self.storage.session_id)
    }

    pub fn resolved_workspace_dir(&self) -> PathBuf {
        expand_tilde(&self.tools.workspace_dir)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RecollectConfig::default();
        assert_eq!(config.agent.log_level, "info");
        assert_eq!(config.storage.session_id, "default");
        assert_eq!(config.memory.summary_cycle, 2);
        assert_eq!(config.memory.recent_last_n, 10);
        assert_eq!(config.embedding.dimensions, 384);
        assert!(config.session_dir().ends_with("sessions/default"));
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[agent]
log_level = "debug"
max_hops = 4

[storage]
data_dir = "/tmp/recollect-test"
session_id = "work"

[memory]
summary_cycle = 5
relevant_min_score = 0.5
"#;
        let config: RecollectConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.agent.log_level, "debug");
        assert_eq!(config.agent.max_hops, 4);
        assert_eq!(config.storage.session_id, "work");
        assert_eq!(config.memory.summary_cycle, 5);
        assert!((config.memory.relevant_min_score - 0.5).abs() < f32::EPSILON);
        // defaults still apply for unset fields
        assert_eq!(config.memory.recent_max_tokens, 2048);
        assert_eq!(
            config.session_dir(),
            PathBuf::from("/tmp/recollect-test/sessions/work")
        );
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = RecollectConfig::load_from(tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config.memory.summary_top_k, 3);
    }

    #[test]
    fn expand_tilde_leaves_plain_paths_alone() {
        assert_eq!(expand_tilde("/var/data"), PathBuf::from("/var/data"));
        assert_eq!(expand_tilde("relative/dir"), PathBuf::from("relative/dir"));
    }
}
