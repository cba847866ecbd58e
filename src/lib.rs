//! Tiered conversation memory for a tool-calling assistant.
//!
//! Recollect keeps a persistent log of conversation turns, indexes them for
//! semantic recall, condenses them into periodic summaries, and feeds all of
//! it back to the model as context while the model works through a
//! function-calling loop over a sandboxed set of file tools.
//!
//! | View | Source | Trimming |
//! |------|--------|----------|
//! | **Recent** | last N turns | oldest dropped first |
//! | **Relevant** | turn index, minus the recent window | lowest score dropped first |
//! | **Summary** | summary index | lowest score dropped first |
//!
//! # Architecture
//!
//! - **Storage**: JSON logs with atomic replacement, plus one SQLite container
//!   per vector index ([sqlite-vec](https://github.com/asg017/sqlite-vec))
//! - **Embeddings**: Local ONNX Runtime with all-MiniLM-L6-v2 (384 dimensions)
//! - **Model**: any OpenAI-compatible `/chat/completions` endpoint
//! - **Concurrency**: one writer per session via an advisory file lock
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: SQLite index containers: schema and migrations
//! - [`embedding`]: Text-to-vector embedding pipeline via ONNX Runtime
//! - [`llm`]: Chat-completion client and message types
//! - [`memory`]: Turn log, vector index, summaries and context views
//! - [`tools`]: File tools and the registry that executes them
//! - [`agent`]: The tool-calling loop and prompt orchestration

pub mod agent;
pub mod config;
pub mod db;
pub mod embedding;
pub mod llm;
pub mod memory;
pub mod tools;
