//! Memory context assembled for each prompt.

use crate::config::MemoryConfig;
use crate::memory::{ConversationStore, RecentMemory, RelevantMemory, Summarizer, SummaryMemory};

/// Text of the three memory views; empty strings mean nothing to add.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryContext {
    pub recent: String,
    pub relevant: String,
    pub summary: String,
}

#[derive(Clone)]
pub struct ContextBuilder {
    recent: RecentMemory,
    relevant: RelevantMemory,
    summary: SummaryMemory,
}

impl ContextBuilder {
    pub fn new(recent: RecentMemory, relevant: RelevantMemory, summary: SummaryMemory) -> Self {
        Self {
            recent,
            relevant,
            summary,
        }
    }

    pub fn from_config(
        store: &ConversationStore,
        summarizer: &Summarizer,
        config: &MemoryConfig,
    ) -> Self {
        Self::new(
            RecentMemory::from_config(store.clone(), config),
            RelevantMemory::from_config(store.clone(), config),
            SummaryMemory::from_config(summarizer.clone(), config),
        )
    }

    /// Compute the three views concurrently on the blocking pool.
    pub async fn build(&self, prompt: &str) -> MemoryContext {
        let recent = self.recent.clone();
        let relevant = self.relevant.clone();
        let summary = self.summary.clone();
        let (p1, p2) = (prompt.to_string(), prompt.to_string());

        let (recent, relevant, summary) = tokio::join!(
            tokio::task::spawn_blocking(move || recent.text()),
            tokio::task::spawn_blocking(move || relevant.text(&p1)),
            tokio::task::spawn_blocking(move || summary.text(&p2)),
        );

        let context = MemoryContext {
            recent: view_or_empty("recent", recent),
            relevant: view_or_empty("relevant", relevant),
            summary: view_or_empty("summary", summary),
        };
        tracing::debug!(
            recent_tokens = crate::memory::budget::estimate_tokens(&context.recent),
            relevant_tokens = crate::memory::budget::estimate_tokens(&context.relevant),
            summary_tokens = crate::memory::budget::estimate_tokens(&context.summary),
            "memory context built"
        );
        context
    }
}

fn view_or_empty(view: &str, result: Result<String, tokio::task::JoinError>) -> String {
    result.unwrap_or_else(|e| {
        tracing::warn!(view, error = %e, "memory view task failed");
        String::new()
    })
}
