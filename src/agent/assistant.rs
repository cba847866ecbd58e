//! Prompt orchestration: memory context + system prompt + agent run.

use std::sync::Arc;

use anyhow::Context;

use crate::config::RecollectConfig;
use crate::embedding::{self, EmbeddingProvider};
use crate::llm::{Entry, LlmClient, OpenAiClient};
use crate::memory::{ConversationStore, Summarizer};
use crate::tools::ToolRegistry;

use super::{Agent, ContextBuilder, MemoryContext};

pub struct Assistant {
    system_prompt: String,
    agent: Agent,
    context: ContextBuilder,
    tools: Arc<ToolRegistry>,
    store: ConversationStore,
}

impl Assistant {
    /// Wire up the local embedder and the configured model endpoint.
    pub fn from_config(config: &RecollectConfig) -> anyhow::Result<Self> {
        let embedder: Arc<dyn EmbeddingProvider> =
            Arc::from(embedding::create_provider(&config.embedding)?);
        let llm: Arc<dyn LlmClient> =
            Arc::new(OpenAiClient::from_config(&config.model).context("model client")?);
        let summary_llm: Arc<dyn LlmClient> = Arc::new(
            OpenAiClient::for_model(&config.model, &config.model.summary_model)
                .context("summary model client")?,
        );
        Ok(Self::new(config, embedder, llm, summary_llm))
    }

    pub fn new(
        config: &RecollectConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmClient>,
        summary_llm: Arc<dyn LlmClient>,
    ) -> Self {
        let session_dir = config.session_dir();
        let store = ConversationStore::new(&session_dir, Arc::clone(&embedder));
        let summarizer = Summarizer::new(
            &session_dir,
            embedder,
            summary_llm,
            config.memory.summary_cycle,
        );
        let tools = Arc::new(ToolRegistry::builtin(config.resolved_workspace_dir()));
        let agent = Agent::new(
            llm,
            Arc::clone(&tools),
            store.clone(),
            summarizer.clone(),
            session_dir,
        )
        .with_max_hops(config.agent.max_hops)
        .with_sampling(config.model.temperature, config.model.max_tokens);

        Self {
            system_prompt: config.agent.system_prompt.clone(),
            context: ContextBuilder::from_config(&store, &summarizer, &config.memory),
            agent,
            tools,
            store,
        }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Initial message sequence for `prompt`: system prompt, non-empty context blocks, then the prompt.
    pub fn compose(&self, prompt: &str, context: &MemoryContext) -> Vec<Entry> {
        let mut messages = vec![Entry::system(&self.system_prompt)];
        if !context.summary.is_empty() {
            messages.push(Entry::system(format!("Summary context:\n{}", context.summary)));
        }
        if !context.relevant.is_empty() {
            messages.push(Entry::system(format!("Relevant context:\n{}", context.relevant)));
        }
        if !context.recent.is_empty() {
            messages.push(Entry::system(format!("Recent context:\n{}", context.recent)));
        }
        messages.push(Entry::user(prompt));
        messages
    }

    /// Answer `prompt`; failures come back as `[Agent Error]: …` text.
    pub async fn ask(&self, prompt: &str) -> String {
        let context = self.context.build(prompt).await;
        let messages = self.compose(prompt, &context);
        self.agent.run(messages, &self.tools.schemas()).await
    }
}
