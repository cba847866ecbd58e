//! Conversation log: grouping, persistence and indexing of turns.
//!
//! [`ConversationStore::save`] folds a flat message sequence into [`Turn`]s,
//! appends them to `turns.json` and indexes every turn that carries user text
//! into `turns.index.db` keyed by its `chat_id`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::embedding::EmbeddingProvider;
use crate::llm::{Entry, Role};

use super::budget::{filter_by_budget, format_records};
use super::index::{IndexError, VectorIndex};
use super::json_store::{append_json, read_json, JsonStoreError};
use super::types::{Action, MemoryRecord, Turn};

pub const TURNS_FILE: &str = "turns.json";
pub const TURNS_INDEX_FILE: &str = "turns.index.db";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Json(#[from] JsonStoreError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("turn encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct ConversationStore {
    log_path: PathBuf,
    index: VectorIndex,
}

impl ConversationStore {
    pub fn new(session_dir: impl AsRef<Path>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        let dir = session_dir.as_ref();
        Self {
            log_path: dir.join(TURNS_FILE),
            index: VectorIndex::new(dir.join(TURNS_INDEX_FILE), embedder),
        }
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Group `entries` into turns, append them and index those with user text.
    ///
    /// Returns the turns that were appended.
    pub fn save(&self, entries: &[Entry]) -> Result<Vec<Turn>, StoreError> {
        let turns = group_turns(entries);
        if turns.is_empty() {
            return Ok(turns);
        }

        let total = append_json(&self.log_path, &turns)?;
        tracing::info!(appended = turns.len(), total, "turns saved");

        for turn in &turns {
            let Some(user) = turn.user.as_deref().filter(|u| !u.is_empty()) else {
                continue;
            };
            let metadata = serde_json::to_value(turn)?;
            self.index.add_text(user, &turn.chat_id, &metadata)?;
            tracing::debug!(chat_id = %turn.chat_id, "turn indexed");
        }

        Ok(turns)
    }

    /// The whole log, or only its last `last_n` turns.
    pub fn load(&self, last_n: Option<usize>) -> Result<Vec<Turn>, StoreError> {
        let mut turns: Vec<Turn> = read_json(&self.log_path)?.unwrap_or_default();
        if let Some(n) = last_n {
            let skip = turns.len().saturating_sub(n);
            turns.drain(..skip);
        }
        Ok(turns)
    }

    pub fn load_all(&self) -> Result<Vec<Turn>, StoreError> {
        self.load(None)
    }

    /// Turns whose user text is similar to `query`, annotated with their score.
    pub fn search(
        &self,
        query: &str,
        k: usize,
        min_score: f32,
    ) -> Result<Vec<MemoryRecord>, StoreError> {
        let hits = self.index.search(query, k, min_score)?;
        let mut records = Vec::with_capacity(hits.len());
        for hit in hits {
            let turn: Turn = serde_json::from_value(hit.metadata)?;
            records.push(MemoryRecord {
                turn,
                score: Some(hit.score),
            });
        }
        Ok(records)
    }

    /// Trim records to `max_tokens`; see [`filter_by_budget`].
    pub fn filter(
        records: Vec<MemoryRecord>,
        max_tokens: usize,
        sort_by_score: bool,
    ) -> Vec<MemoryRecord> {
        filter_by_budget(records, max_tokens, sort_by_score)
    }

    /// Transcript of `records`, blocks separated by a blank line.
    pub fn format(records: &[MemoryRecord]) -> String {
        format_records(records)
    }
}

/// Fold a flat message sequence into turns.
///
/// A user message opens a new turn once the current one has content. A call
/// becomes an [`Action`] only when its output arrives before the turn closes;
/// unmatched calls and outputs are dropped. System messages are ignored.
pub fn group_turns(entries: &[Entry]) -> Vec<Turn> {
    let mut turns = Vec::new();
    let mut current = Turn::new();
    let mut pending: HashMap<&str, (&str, &str)> = HashMap::new();

    for entry in entries {
        match entry {
            Entry::Message {
                role: Role::User,
                content,
            } => {
                if current.has_content() {
                    drop_dangling(&mut pending, &current.chat_id);
                    turns.push(std::mem::take(&mut current));
                }
                current.user = Some(content.clone());
            }
            Entry::Message {
                role: Role::Assistant,
                content,
            } => {
                current.assistant = Some(content.clone());
            }
            Entry::Message {
                role: Role::System,
                ..
            } => {}
            Entry::FunctionCall {
                call_id,
                name,
                arguments,
            } => {
                pending.insert(call_id.as_str(), (name.as_str(), arguments.as_str()));
            }
            Entry::FunctionCallOutput { call_id, output } => {
                match pending.remove(call_id.as_str()) {
                    Some((name, arguments)) => current.actions.push(Action {
                        call_id: call_id.clone(),
                        name: name.to_string(),
                        arguments: arguments.to_string(),
                        output: output.clone(),
                    }),
                    None => tracing::warn!(call_id = %call_id, "dropping tool output without a matching call"),
                }
            }
        }
    }

    drop_dangling(&mut pending, &current.chat_id);
    if current.has_content() {
        turns.push(current);
    }
    turns
}

fn drop_dangling(pending: &mut HashMap<&str, (&str, &str)>, chat_id: &str) {
    for (call_id, (name, _)) in pending.drain() {
        tracing::warn!(chat_id, call_id, tool = name, "dropping tool call without an output");
    }
}
