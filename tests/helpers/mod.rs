#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use recollect::config::RecollectConfig;
use recollect::embedding::EmbeddingProvider;
use recollect::llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, ToolCall};
use recollect::memory::{ConversationStore, Summarizer};

pub const TEST_DIM: usize = 256;

/// Deterministic bag-of-words embedder: each lowercase word bumps one
/// FNV-hashed bucket. Texts sharing words score high, disjoint texts ~0.
pub struct HashEmbedder;

fn fnv1a(word: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in word.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

impl EmbeddingProvider for HashEmbedder {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut v = vec![0.0f32; TEST_DIM];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            v[(fnv1a(&word.to_lowercase()) % TEST_DIM as u64) as usize] += 1.0;
        }
        if v.iter().all(|x| *x == 0.0) {
            v[0] = 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        Ok(v.into_iter().map(|x| x / norm).collect())
    }

    fn dimensions(&self) -> usize {
        TEST_DIM
    }
}

pub fn embedder() -> Arc<dyn EmbeddingProvider> {
    Arc::new(HashEmbedder)
}

/// Replays queued responses in order and records every request it sees.
#[derive(Default)]
pub struct ScriptedLlm {
    script: Mutex<VecDeque<Result<CompletionResponse, LlmError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    pub fn new(script: Vec<Result<CompletionResponse, LlmError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(texts: &[&str]) -> Arc<Self> {
        Self::new(
            texts
                .iter()
                .map(|t| Ok(CompletionResponse::text(*t)))
                .collect(),
        )
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::InvalidResponse("script exhausted".into())))
    }
}

pub fn tool_call(id: &str, name: &str, arguments: &str) -> ToolCall {
    ToolCall {
        id: id.into(),
        name: name.into(),
        arguments: arguments.into(),
    }
}

/// Config rooted entirely inside `root`.
pub fn test_config(root: &Path) -> RecollectConfig {
    let mut config = RecollectConfig::default();
    config.storage.data_dir = root.join("data").to_string_lossy().into_owned();
    config.storage.session_id = "test".into();
    config.tools.workspace_dir = root.join("workspace").to_string_lossy().into_owned();
    config.embedding.dimensions = TEST_DIM;
    config
}

pub fn store(session_dir: &Path) -> ConversationStore {
    ConversationStore::new(session_dir, embedder())
}

pub fn summarizer(session_dir: &Path, llm: Arc<dyn LlmClient>, cycle: u32) -> Summarizer {
    Summarizer::new(session_dir, embedder(), llm, cycle)
}
