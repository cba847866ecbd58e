//! Persisted record types.
//!
//! [`Turn`] (one grouped user/tool/assistant exchange), [`Action`] (a completed
//! tool invocation inside a turn), [`SummaryRecord`] and the cycle
//! [`CounterState`]. Scored wrappers carry a similarity score that is only
//! attached at search time and never written back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp layout used in transcripts.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Generate a prefixed, time-sortable identifier (`msg_…`, `smr_…`).
pub fn new_id(prefix: &str) -> String {
    format!("{prefix}_{}", uuid::Uuid::now_v7().simple())
}

/// One tool invocation: the call and its matching output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub call_id: String,
    pub name: String,
    /// Raw JSON argument string as sent by the model.
    pub arguments: String,
    pub output: String,
}

/// One grouped unit of user input, tool actions and assistant output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub chat_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assistant: Option<String>,
}

impl Turn {
    pub fn new() -> Self {
        Self {
            chat_id: new_id("msg"),
            timestamp: Utc::now(),
            user: None,
            actions: Vec::new(),
            assistant: None,
        }
    }

    /// True once the turn holds user text, assistant text or an action.
    pub fn has_content(&self) -> bool {
        self.user.as_deref().is_some_and(|s| !s.is_empty())
            || self.assistant.as_deref().is_some_and(|s| !s.is_empty())
            || !self.actions.is_empty()
    }

    /// Transcript block: time, user, each action call and output, assistant.
    pub fn transcript(&self) -> String {
        let mut lines = vec![format!("Time: {}", self.timestamp.format(TIME_FORMAT))];
        if let Some(user) = &self.user {
            lines.push(format!("User: {user}"));
        }
        for action in &self.actions {
            lines.push(format!("Action Call: {}({})", action.name, action.arguments));
            lines.push(format!("Action Out: {}", action.output));
        }
        if let Some(assistant) = &self.assistant {
            lines.push(format!("Assistant: {assistant}"));
        }
        lines.join("\n")
    }
}

impl Default for Turn {
    fn default() -> Self {
        Self::new()
    }
}

/// A turn returned from vector search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryRecord {
    #[serde(flatten)]
    pub turn: Turn,
    #[serde(skip)]
    pub score: Option<f32>,
}

impl From<Turn> for MemoryRecord {
    fn from(turn: Turn) -> Self {
        Self { turn, score: None }
    }
}

/// A condensed digest of recent turns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub summary_id: String,
    pub summary: String,
    pub date: DateTime<Utc>,
}

impl SummaryRecord {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary_id: new_id("smr"),
            summary: summary.into(),
            date: Utc::now(),
        }
    }

    pub fn transcript(&self) -> String {
        format!(
            "Date: {}\nSummary: {}",
            self.date.format(TIME_FORMAT),
            self.summary
        )
    }
}

/// A summary returned from vector search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredSummary {
    #[serde(flatten)]
    pub record: SummaryRecord,
    #[serde(skip)]
    pub score: Option<f32>,
}

impl From<SummaryRecord> for ScoredSummary {
    fn from(record: SummaryRecord) -> Self {
        Self {
            record,
            score: None,
        }
    }
}

/// Records that can be trimmed to a token budget.
pub trait Scored {
    fn score(&self) -> Option<f32>;
    fn transcript(&self) -> String;
}

impl Scored for MemoryRecord {
    fn score(&self) -> Option<f32> {
        self.score
    }

    fn transcript(&self) -> String {
        self.turn.transcript()
    }
}

impl Scored for ScoredSummary {
    fn score(&self) -> Option<f32> {
        self.score
    }

    fn transcript(&self) -> String {
        self.record.transcript()
    }
}

/// Rounds completed since the last summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterState {
    pub count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_carry_prefix_and_are_unique() {
        let a = new_id("msg");
        let b = new_id("msg");
        assert!(a.starts_with("msg_"));
        assert_ne!(a, b);
    }

    #[test]
    fn empty_turn_has_no_content() {
        let mut turn = Turn::new();
        assert!(!turn.has_content());
        turn.user = Some(String::new());
        assert!(!turn.has_content());
        turn.assistant = Some("hi".into());
        assert!(turn.has_content());
    }

    #[test]
    fn transcript_lists_actions_between_user_and_assistant() {
        let mut turn = Turn::new();
        turn.user = Some("read a.txt".into());
        turn.actions.push(Action {
            call_id: "c1".into(),
            name: "read_file".into(),
            arguments: r#"{"filepath":"a.txt"}"#.into(),
            output: "hello".into(),
        });
        turn.assistant = Some("It says hello.".into());

        let text = turn.transcript();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("Time: "));
        assert_eq!(lines[1], "User: read a.txt");
        assert_eq!(lines[2], r#"Action Call: read_file({"filepath":"a.txt"})"#);
        assert_eq!(lines[3], "Action Out: hello");
        assert_eq!(lines[4], "Assistant: It says hello.");
    }

    #[test]
    fn turn_json_omits_empty_fields() {
        let mut turn = Turn::new();
        turn.user = Some("hi".into());
        let json = serde_json::to_value(&turn).unwrap();
        assert!(json.get("actions").is_none());
        assert!(json.get("assistant").is_none());
        let back: Turn = serde_json::from_value(json).unwrap();
        assert_eq!(back, turn);
    }
}
