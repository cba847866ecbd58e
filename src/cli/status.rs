//! CLI `status` command: counters and sizes for the current session.

use anyhow::Result;

use recollect::config::RecollectConfig;
use recollect::db;
use recollect::memory::json_store::read_json;
use recollect::memory::lock::SessionLock;
use recollect::memory::store::{TURNS_FILE, TURNS_INDEX_FILE};
use recollect::memory::summarizer::{COUNTER_FILE, SUMMARIES_FILE, SUMMARIES_INDEX_FILE};
use recollect::memory::types::{CounterState, SummaryRecord, Turn};

pub fn status(config: &RecollectConfig) -> Result<()> {
    let dir = config.session_dir();
    let turns: Vec<Turn> = read_json(&dir.join(TURNS_FILE))?.unwrap_or_default();
    let summaries: Vec<SummaryRecord> = read_json(&dir.join(SUMMARIES_FILE))?.unwrap_or_default();
    let counter: CounterState = read_json(&dir.join(COUNTER_FILE))
        .ok()
        .flatten()
        .unwrap_or_default();

    println!("Session '{}'", config.storage.session_id);
    println!("{}", "=".repeat(40));
    println!("  Directory:       {}", dir.display());
    println!("  Turns:           {}", turns.len());
    println!("  Summaries:       {}", summaries.len());
    println!(
        "  Summary cycle:   {}/{}",
        counter.count, config.memory.summary_cycle
    );
    let writer = if SessionLock::writer_active(&dir)? { "active" } else { "idle" };
    println!("  Writer:          {writer}");
    println!();

    for (label, file) in [("Turn index", TURNS_INDEX_FILE), ("Summary index", SUMMARIES_INDEX_FILE)] {
        match db::index_stats(dir.join(file))? {
            Some(stats) => println!(
                "  {label:<16} {} entries, {} dims, schema v{}, {}",
                stats.entries,
                stats.dimensions,
                stats.schema_version,
                format_bytes(stats.file_size)
            ),
            None => println!("  {label:<16} (not created yet)"),
        }
    }
    println!();
    println!("  Model:           {} (summaries: {})", config.model.model, config.model.summary_model);
    println!("  Workspace:       {}", config.resolved_workspace_dir().display());
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
