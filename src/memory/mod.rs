//! Conversation memory: the turn log, vector indexes, summaries and the
//! context views built from them.

pub mod budget;
pub mod index;
pub mod json_store;
pub mod lock;
pub mod store;
pub mod summarizer;
pub mod types;
pub mod views;

pub use index::{IndexError, VectorIndex};
pub use store::{ConversationStore, StoreError};
pub use summarizer::{CycleOutcome, SummaryError, Summarizer};
pub use views::{RecentMemory, RelevantMemory, SummaryMemory};
