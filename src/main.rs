mod cli;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use recollect::config::RecollectConfig;

#[derive(Parser)]
#[command(name = "recollect", version, about = "Tool-calling assistant with tiered conversation memory")]
struct Cli {
    /// Config file (defaults to ~/.recollect/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Session to use, overriding the configured one
    #[arg(long, global = true)]
    session: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive conversation (type `exit` or `quit` to leave)
    Chat,
    /// Ask a single question and print the answer
    Ask {
        /// The prompt
        prompt: String,
    },
    /// Print logged turns
    History {
        /// Only the last N turns
        #[arg(long)]
        last: Option<usize>,
    },
    /// Semantic search over past turns or summaries
    Search {
        query: String,
        /// Search summaries instead of turns
        #[arg(long)]
        summaries: bool,
        /// Maximum number of results
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Show session counters and sizes
    Status,
    /// Manage the embedding model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download the embedding model to ~/.recollect/models/
    Download,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => RecollectConfig::load_from(path)?,
        None => RecollectConfig::load()?,
    };
    if let Some(session) = cli.session {
        config.storage.session_id = session;
    }

    // Log to stderr so stdout stays clean for the conversation.
    let filter =
        EnvFilter::try_new(&config.agent.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Chat => cli::chat::chat(&config).await?,
        Command::Ask { prompt } => cli::chat::ask(&config, &prompt).await?,
        Command::History { last } => cli::history::history(&config, last)?,
        Command::Search {
            query,
            summaries,
            limit,
        } => cli::search::search(&config, &query, summaries, limit).await?,
        Command::Status => cli::status::status(&config)?,
        Command::Model { action } => match action {
            ModelAction::Download => cli::model_download(&config.embedding).await?,
        },
    }

    Ok(())
}
