//! Read-only, budget-trimmed projections used as model context.
//!
//! Every view fails soft: storage or embedding errors are logged and the view
//! comes back empty.

use std::collections::HashSet;

use crate::config::MemoryConfig;

use super::store::ConversationStore;
use super::summarizer::Summarizer;
use super::types::{MemoryRecord, ScoredSummary};

/// The last `last_n` turns, oldest trimmed first to fit the budget.
#[derive(Clone)]
pub struct RecentMemory {
    store: ConversationStore,
    last_n: usize,
    max_tokens: usize,
}

impl RecentMemory {
    pub fn new(store: ConversationStore, last_n: usize, max_tokens: usize) -> Self {
        Self {
            store,
            last_n,
            max_tokens,
        }
    }

    pub fn from_config(store: ConversationStore, config: &MemoryConfig) -> Self {
        Self::new(store, config.recent_last_n, config.recent_max_tokens)
    }

    pub fn records(&self) -> Vec<MemoryRecord> {
        let turns = match self.store.load(Some(self.last_n)) {
            Ok(turns) => turns,
            Err(e) => {
                tracing::warn!(error = %e, "recent memory unavailable");
                return vec![];
            }
        };
        let records = turns.into_iter().map(MemoryRecord::from).collect();
        ConversationStore::filter(records, self.max_tokens, false)
    }

    pub fn text(&self) -> String {
        ConversationStore::format(&self.records())
    }
}

/// Past turns similar to the prompt that are not already in the recent window.
#[derive(Clone)]
pub struct RelevantMemory {
    store: ConversationStore,
    recent_window: usize,
    top_k: usize,
    min_score: f32,
    max_tokens: usize,
}

impl RelevantMemory {
    pub fn new(
        store: ConversationStore,
        recent_window: usize,
        top_k: usize,
        min_score: f32,
        max_tokens: usize,
    ) -> Self {
        Self {
            store,
            recent_window,
            top_k,
            min_score,
            max_tokens,
        }
    }

    pub fn from_config(store: ConversationStore, config: &MemoryConfig) -> Self {
        Self::new(
            store,
            config.relevant_last_n,
            config.relevant_top_k,
            config.relevant_min_score,
            config.relevant_max_tokens,
        )
    }

    pub fn records(&self, prompt: &str) -> Vec<MemoryRecord> {
        let recent_ids: HashSet<String> = match self.store.load(Some(self.recent_window)) {
            Ok(turns) => turns.into_iter().map(|t| t.chat_id).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "relevant memory unavailable");
                return vec![];
            }
        };

        // over-fetch so excluded recent turns do not starve the result
        let fetch = self.top_k + recent_ids.len();
        let found = match self.store.search(prompt, fetch, self.min_score) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(error = %e, "relevant memory search failed");
                return vec![];
            }
        };

        let records: Vec<MemoryRecord> = found
            .into_iter()
            .filter(|r| !recent_ids.contains(&r.turn.chat_id))
            .take(self.top_k)
            .collect();
        ConversationStore::filter(records, self.max_tokens, true)
    }

    pub fn text(&self, prompt: &str) -> String {
        ConversationStore::format(&self.records(prompt))
    }
}

/// Summaries similar to the prompt, best first.
#[derive(Clone)]
pub struct SummaryMemory {
    summarizer: Summarizer,
    top_k: usize,
    min_score: f32,
    max_tokens: usize,
}

impl SummaryMemory {
    pub fn new(summarizer: Summarizer, top_k: usize, min_score: f32, max_tokens: usize) -> Self {
        Self {
            summarizer,
            top_k,
            min_score,
            max_tokens,
        }
    }

    pub fn from_config(summarizer: Summarizer, config: &MemoryConfig) -> Self {
        Self::new(
            summarizer,
            config.summary_top_k,
            config.summary_min_score,
            config.summary_max_tokens,
        )
    }

    pub fn records(&self, prompt: &str) -> Vec<ScoredSummary> {
        match self.summarizer.search(prompt, self.top_k, self.min_score) {
            Ok(found) => Summarizer::filter(found, self.max_tokens, true),
            Err(e) => {
                tracing::warn!(error = %e, "summary memory unavailable");
                vec![]
            }
        }
    }

    pub fn text(&self, prompt: &str) -> String {
        Summarizer::format(&self.records(prompt))
    }
}
