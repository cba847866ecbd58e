//! Periodic condensation of recent turns into indexed summaries.
//!
//! A persisted counter tracks completed rounds since the last summary. The
//! first round that finds it at the cycle length has the most recent turns
//! summarized by the model; the summary is appended to `summaries.json`,
//! indexed under the prompt that triggered it, and the counter is reset.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::embedding::EmbeddingProvider;
use crate::llm::{CompletionRequest, Entry, LlmClient, LlmError};

use super::budget::{filter_by_budget, format_records};
use super::index::{IndexError, VectorIndex};
use super::json_store::{append_json, read_json, write_json, JsonStoreError};
use super::store::{ConversationStore, StoreError};
use super::types::{CounterState, MemoryRecord, ScoredSummary, SummaryRecord};

pub const SUMMARIES_FILE: &str = "summaries.json";
pub const SUMMARIES_INDEX_FILE: &str = "summaries.index.db";
pub const COUNTER_FILE: &str = "counter.json";

const SUMMARY_INSTRUCTION: &str = "You are a summarization assistant.\n\
Read the conversation between a user and an AI below and write a concise, factual summary as plain prose.\n\
Guidelines:\n\
- Cover only the main questions, answers and key facts.\n\
- Keep a neutral, objective tone.\n\
- Leave out greetings and small talk unless they matter for context.\n\
- Write a single short paragraph of 3 to 5 sentences.\n\
- The summary will be handed back to the assistant as recalled memory.\n";

#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    #[error("summary model call failed: {0}")]
    Model(#[from] LlmError),

    #[error("summary model returned no text")]
    EmptySummary,

    #[error(transparent)]
    Json(#[from] JsonStoreError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("summary encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// What one cycle step did.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Counter advanced to this value; no summary this round.
    Counted(u32),
    /// Summary written; counter back at zero.
    Summarized(SummaryRecord),
}

#[derive(Clone)]
pub struct Summarizer {
    log_path: PathBuf,
    counter_path: PathBuf,
    index: VectorIndex,
    llm: Arc<dyn LlmClient>,
    cycle_length: u32,
}

impl Summarizer {
    pub fn new(
        session_dir: impl AsRef<Path>,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmClient>,
        cycle_length: u32,
    ) -> Self {
        let dir = session_dir.as_ref();
        Self {
            log_path: dir.join(SUMMARIES_FILE),
            counter_path: dir.join(COUNTER_FILE),
            index: VectorIndex::new(dir.join(SUMMARIES_INDEX_FILE), embedder),
            llm,
            cycle_length: cycle_length.max(1),
        }
    }

    pub fn cycle_length(&self) -> u32 {
        self.cycle_length
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Current counter; unreadable state counts as 0.
    pub fn get_counter(&self) -> u32 {
        match read_json::<CounterState>(&self.counter_path) {
            Ok(state) => state.unwrap_or_default().count,
            Err(e) => {
                tracing::warn!(error = %e, "unreadable summary counter, treating as 0");
                0
            }
        }
    }

    pub fn increment_counter(&self) -> Result<u32, SummaryError> {
        let count = self.get_counter().saturating_add(1);
        write_json(&self.counter_path, &CounterState { count })?;
        Ok(count)
    }

    pub fn reset_counter(&self) -> Result<(), SummaryError> {
        write_json(&self.counter_path, &CounterState::default())?;
        Ok(())
    }

    /// Summarize `recent_text`, then persist and index the result under `prompt`.
    pub async fn create_summary(
        &self,
        prompt: &str,
        recent_text: &str,
    ) -> Result<SummaryRecord, SummaryError> {
        let request = CompletionRequest::new(vec![
            Entry::system(SUMMARY_INSTRUCTION),
            Entry::user(recent_text),
        ]);
        let response = self.llm.complete(request).await?;
        let text = response.output_text();
        let text = text.trim();
        if text.is_empty() {
            return Err(SummaryError::EmptySummary);
        }

        let record = SummaryRecord::new(text);
        let metadata = serde_json::to_value(&record)?;
        let index = self.index.clone();
        let log_path = self.log_path.clone();
        let key_text = prompt.to_string();
        let stored = record.clone();
        tokio::task::spawn_blocking(move || -> Result<(), SummaryError> {
            append_json(&log_path, std::slice::from_ref(&stored))?;
            index.add_text(&key_text, &stored.summary_id, &metadata)?;
            Ok(())
        })
        .await??;

        tracing::info!(summary_id = %record.summary_id, model = self.llm.model(), "summary created");
        Ok(record)
    }

    /// Advance the cycle after a completed round.
    ///
    /// A counter below the cycle length is incremented. Once it has reached
    /// the cycle length, the last `cycle_length` turns are summarized and the
    /// counter is reset. A failed summary leaves the counter untouched so the
    /// next round retries. A counter above the cycle length (the cycle was
    /// shortened in config) also summarizes.
    pub async fn run_cycle(
        &self,
        prompt: &str,
        store: &ConversationStore,
    ) -> Result<CycleOutcome, SummaryError> {
        let this = self.clone();
        let count = tokio::task::spawn_blocking(move || this.get_counter()).await?;
        if count < self.cycle_length {
            let this = self.clone();
            let count = tokio::task::spawn_blocking(move || this.increment_counter()).await??;
            tracing::debug!(count, cycle = self.cycle_length, "summary counter advanced");
            return Ok(CycleOutcome::Counted(count));
        }

        let store = store.clone();
        let last_n = self.cycle_length as usize;
        let recent_text = tokio::task::spawn_blocking(move || -> Result<String, SummaryError> {
            let records: Vec<MemoryRecord> = store
                .load(Some(last_n))?
                .into_iter()
                .map(MemoryRecord::from)
                .collect();
            Ok(ConversationStore::format(&records))
        })
        .await??;

        let record = self.create_summary(prompt, &recent_text).await?;
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.reset_counter()).await??;
        Ok(CycleOutcome::Summarized(record))
    }

    /// The whole summary log, or only its last `last_n` records.
    pub fn load(&self, last_n: Option<usize>) -> Result<Vec<SummaryRecord>, SummaryError> {
        let mut records: Vec<SummaryRecord> = read_json(&self.log_path)?.unwrap_or_default();
        if let Some(n) = last_n {
            let skip = records.len().saturating_sub(n);
            records.drain(..skip);
        }
        Ok(records)
    }

    pub fn search(
        &self,
        query: &str,
        k: usize,
        min_score: f32,
    ) -> Result<Vec<ScoredSummary>, SummaryError> {
        let hits = self.index.search(query, k, min_score)?;
        let mut out = Vec::with_capacity(hits.len());
        for hit in hits {
            out.push(ScoredSummary {
                record: serde_json::from_value(hit.metadata)?,
                score: Some(hit.score),
            });
        }
        Ok(out)
    }

    pub fn filter(
        records: Vec<ScoredSummary>,
        max_tokens: usize,
        sort_by_score: bool,
    ) -> Vec<ScoredSummary> {
        filter_by_budget(records, max_tokens, sort_by_score)
    }

    pub fn format(records: &[ScoredSummary]) -> String {
        format_records(records)
    }
}
