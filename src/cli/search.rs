use std::sync::Arc;

use anyhow::Result;

use recollect::config::RecollectConfig;
use recollect::embedding::{self, EmbeddingProvider};
use recollect::memory::ConversationStore;
use recollect::memory::types::TIME_FORMAT;

/// Run a semantic search over turns (or summaries) from the terminal.
pub async fn search(
    config: &RecollectConfig,
    query: &str,
    summaries: bool,
    limit: usize,
) -> Result<()> {
    let provider: Arc<dyn EmbeddingProvider> =
        Arc::from(embedding::create_provider(&config.embedding)?);
    let session_dir = config.session_dir();
    let query = query.to_string();

    if summaries {
        let index = recollect::memory::VectorIndex::new(
            session_dir.join(recollect::memory::summarizer::SUMMARIES_INDEX_FILE),
            provider,
        );
        let hits = tokio::task::spawn_blocking(move || index.search(&query, limit, f32::MIN))
            .await??;
        if hits.is_empty() {
            println!("No results found.");
            return Ok(());
        }
        for (i, hit) in hits.iter().enumerate() {
            println!("  {}. {} (score: {:.4})", i + 1, hit.key, hit.score);
            println!("     {}", hit.metadata["summary"].as_str().unwrap_or_default());
            println!();
        }
        return Ok(());
    }

    let store = ConversationStore::new(&session_dir, provider);
    let records = tokio::task::spawn_blocking(move || store.search(&query, limit, f32::MIN))
        .await??;
    if records.is_empty() {
        println!("No results found.");
        return Ok(());
    }
    for (i, record) in records.iter().enumerate() {
        println!(
            "  {}. [{}] {} (score: {:.4})",
            i + 1,
            record.turn.timestamp.format(TIME_FORMAT),
            record.turn.chat_id,
            record.score.unwrap_or_default(),
        );
        println!("     {}", record.turn.user.as_deref().unwrap_or_default());
        println!();
    }
    Ok(())
}
