//! `ask` and `chat`: run prompts through the assistant.

use std::io::{BufRead, Write};

use anyhow::Result;

use recollect::agent::Assistant;
use recollect::config::RecollectConfig;

pub async fn ask(config: &RecollectConfig, prompt: &str) -> Result<()> {
    let assistant = Assistant::from_config(config)?;
    println!("{}", assistant.ask(prompt).await);
    Ok(())
}

/// Line-oriented REPL; `exit` or `quit` (or EOF) ends it.
pub async fn chat(config: &RecollectConfig) -> Result<()> {
    let assistant = Assistant::from_config(config)?;
    println!(
        "Session '{}'. Type `exit` to quit.",
        config.storage.session_id
    );

    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let prompt = line.trim();
        if prompt.is_empty() {
            continue;
        }
        if matches!(prompt.to_lowercase().as_str(), "exit" | "quit") {
            break;
        }

        let answer = assistant.ask(prompt).await;
        println!("\n{answer}\n");
    }
    Ok(())
}
