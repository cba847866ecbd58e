//! Token estimation and budget trimming for context views.

use super::types::Scored;

/// Separator between transcript blocks.
pub const BLOCK_SEPARATOR: &str = "\n\n";

/// Rough token count: one token per four characters, rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Join record transcripts into one context string.
pub fn format_records<T: Scored>(records: &[T]) -> String {
    records
        .iter()
        .map(Scored::transcript)
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

/// Trim `records` until their formatted text fits `max_tokens`.
///
/// With `sort_by_score` the records are ordered best-first and the lowest
/// scores are dropped; otherwise the input order is kept and the oldest
/// (leading) records are dropped. A non-empty input always keeps one record.
pub fn filter_by_budget<T: Scored>(
    mut records: Vec<T>,
    max_tokens: usize,
    sort_by_score: bool,
) -> Vec<T> {
    if sort_by_score {
        records.sort_by(|a, b| {
            let a = a.score().unwrap_or(f32::NEG_INFINITY);
            let b = b.score().unwrap_or(f32::NEG_INFINITY);
            b.total_cmp(&a)
        });
    }

    let before = records.len();
    while records.len() > 1 && estimate_tokens(&format_records(&records)) > max_tokens {
        if sort_by_score {
            records.pop();
        } else {
            records.remove(0);
        }
    }

    if records.len() < before {
        tracing::debug!(before, after = records.len(), max_tokens, "trimmed records to budget");
    }
    records
}
