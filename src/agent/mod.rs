//! Tool-calling agent loop.
//!
//! The loop alternates between asking the model and running the tools it
//! requests until the model answers with text only:
//!
//! ```text
//! AwaitingModel --text only--> Done
//! AwaitingModel --tool calls--> ExecutingTools --> AwaitingModel
//! ```
//!
//! The running message sequence is the loop's only state and only grows.
//! A finished round is persisted to the conversation store and advances the
//! summary cycle, both under the session's single-writer lock.

pub mod assistant;
pub mod context;

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;

use crate::llm::{CompletionRequest, Entry, LlmClient, LlmError, ToolCall, ToolSchema};
use crate::memory::lock::SessionLock;
use crate::memory::types::Turn;
use crate::memory::{ConversationStore, CycleOutcome, Summarizer};
use crate::tools::{ToolOutcome, ToolRegistry};

pub use assistant::Assistant;
pub use context::{ContextBuilder, MemoryContext};

/// Tracing target for model reasoning traces.
pub const REASONING_TARGET: &str = "recollect::reasoning";

/// Default bound on model calls per run.
pub const DEFAULT_MAX_HOPS: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("{0}")]
    Model(#[from] LlmError),

    #[error("exceeded maximum of {0} model calls")]
    HopLimit(usize),
}

#[derive(Debug)]
enum State {
    AwaitingModel,
    ExecutingTools(Vec<ToolCall>),
    Done(String),
}

/// Everything a successful run produced.
#[derive(Debug, Clone)]
pub struct AgentRun {
    pub answer: String,
    /// Final message sequence, including model output and tool results.
    pub messages: Vec<Entry>,
    pub model_calls: usize,
    /// Turns appended to the log; empty when persisting failed.
    pub persisted: Vec<Turn>,
    /// Summary cycle step; `None` when it failed.
    pub cycle: Option<CycleOutcome>,
}

pub struct Agent {
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    store: ConversationStore,
    summarizer: Summarizer,
    session_dir: PathBuf,
    max_hops: usize,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl Agent {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        tools: Arc<ToolRegistry>,
        store: ConversationStore,
        summarizer: Summarizer,
        session_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            llm,
            tools,
            store,
            summarizer,
            session_dir: session_dir.into(),
            max_hops: DEFAULT_MAX_HOPS,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops.max(1);
        self
    }

    pub fn with_sampling(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Run to completion and return the answer, or `[Agent Error]: …` on failure.
    pub async fn run(&self, initial: Vec<Entry>, tools: &[ToolSchema]) -> String {
        match self.run_detailed(initial, tools).await {
            Ok(run) => run.answer,
            Err(e) => {
                tracing::error!(error = %e, "agent run failed");
                format!("[Agent Error]: {e}")
            }
        }
    }

    /// Run to completion. Nothing is persisted when this returns `Err`.
    pub async fn run_detailed(
        &self,
        initial: Vec<Entry>,
        tools: &[ToolSchema],
    ) -> Result<AgentRun, AgentError> {
        let mut messages = initial;
        let mut model_calls = 0usize;
        let mut state = State::AwaitingModel;

        loop {
            state = match state {
                State::AwaitingModel => {
                    if model_calls >= self.max_hops {
                        tracing::warn!(max_hops = self.max_hops, "model call limit reached");
                        return Err(AgentError::HopLimit(self.max_hops));
                    }
                    model_calls += 1;

                    let request = CompletionRequest::new(messages.clone())
                        .with_tools(tools.to_vec())
                        .with_temperature(self.temperature)
                        .with_max_tokens(self.max_tokens);
                    let response = self.llm.complete(request).await?;

                    for trace in &response.reasoning {
                        tracing::info!(target: REASONING_TARGET, "{trace}");
                    }
                    messages.extend(response.to_entries());

                    if response.tool_calls.is_empty() {
                        State::Done(response.output_text())
                    } else {
                        tracing::info!(
                            hop = model_calls,
                            count = response.tool_calls.len(),
                            "model requested tool calls"
                        );
                        State::ExecutingTools(response.tool_calls)
                    }
                }
                State::ExecutingTools(calls) => {
                    for call in calls {
                        let outcome = self.execute_tool(&call).await;
                        messages.push(Entry::function_output(&call.id, outcome.to_json_string()));
                    }
                    State::AwaitingModel
                }
                State::Done(answer) => {
                    let (persisted, cycle) = self.finish_round(&messages).await;
                    tracing::info!(model_calls, turns = persisted.len(), "agent run complete");
                    return Ok(AgentRun {
                        answer,
                        messages,
                        model_calls,
                        persisted,
                        cycle,
                    });
                }
            };
        }
    }

    async fn execute_tool(&self, call: &ToolCall) -> ToolOutcome {
        let registry = Arc::clone(&self.tools);
        let name = call.name.clone();
        let arguments = call.arguments.clone();
        tracing::debug!(tool = %call.name, call_id = %call.id, "executing tool");

        tokio::task::spawn_blocking(move || registry.execute_call(&name, &arguments))
            .await
            .unwrap_or_else(|e| {
                tracing::error!(tool = %call.name, error = %e, "tool task failed");
                ToolOutcome::error_with(
                    format!("Tool '{}' failed: {e}", call.name),
                    json!({"tool": call.name, "args": call.arguments}),
                )
            })
    }

    /// Persist the round and advance the summary cycle. Failures are logged only.
    async fn finish_round(&self, messages: &[Entry]) -> (Vec<Turn>, Option<CycleOutcome>) {
        let dir = self.session_dir.clone();
        let lock = match tokio::task::spawn_blocking(move || SessionLock::acquire(&dir)).await {
            Ok(Ok(lock)) => Some(lock),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "could not take session lock, writing unlocked");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "session lock task failed, writing unlocked");
                None
            }
        };

        let store = self.store.clone();
        let owned = messages.to_vec();
        let persisted = match tokio::task::spawn_blocking(move || store.save(&owned)).await {
            Ok(Ok(turns)) => turns,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "failed to persist conversation round");
                vec![]
            }
            Err(e) => {
                tracing::error!(error = %e, "persist task failed");
                vec![]
            }
        };

        let prompt = messages
            .iter()
            .find_map(Entry::user_text)
            .unwrap_or_default();
        let cycle = match self.summarizer.run_cycle(prompt, &self.store).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::error!(error = %e, "summary cycle failed");
                None
            }
        };

        drop(lock);
        (persisted, cycle)
    }
}
