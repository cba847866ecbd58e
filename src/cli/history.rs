use anyhow::Result;

use recollect::config::RecollectConfig;
use recollect::memory::json_store::read_json;
use recollect::memory::store::TURNS_FILE;
use recollect::memory::types::{Turn, TIME_FORMAT};

/// Print logged turns, oldest first.
pub fn history(config: &RecollectConfig, last: Option<usize>) -> Result<()> {
    let path = config.session_dir().join(TURNS_FILE);
    let mut turns: Vec<Turn> = read_json(&path)?.unwrap_or_default();
    if let Some(n) = last {
        let skip = turns.len().saturating_sub(n);
        turns.drain(..skip);
    }

    if turns.is_empty() {
        println!("No turns logged for session '{}'.", config.storage.session_id);
        return Ok(());
    }

    for turn in &turns {
        println!("[{}] {}", turn.timestamp.format(TIME_FORMAT), turn.chat_id);
        if let Some(user) = &turn.user {
            println!("  user:      {user}");
        }
        for action in &turn.actions {
            println!("  tool:      {}({})", action.name, action.arguments);
        }
        if let Some(assistant) = &turn.assistant {
            println!("  assistant: {assistant}");
        }
        println!();
    }
    Ok(())
}
