//! Datalyst - Supervisor-Orchestrated Data Analytics
//!
//! A multi-agent workflow over tabular datasets: a supervisor reads the
//! conversation so far and routes between specialist agents (cleaning,
//! clustering, visualization) until the requested analysis is complete.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **LLM**: LLM provider abstraction with Ollama implementation
//! - **Graph**: The orchestration core — supervisor routing, context
//!   injection, delta extraction, checkpointed session state
//! - **Agents**: Bounded specialist agents with per-invocation step ceilings
//! - **Tools**: Tool registry with the data analysis tools
//! - **CLI**: Command-line interface and REPL
//!
//! # Usage
//!
//! ```rust,no_run
//! use datalyst::core::Config;
//! use datalyst::graph::AnalysisGraph;
//!
//! #[tokio::main]
//! async fn main() {
//!     let graph = AnalysisGraph::new(&Config::load());
//!     let outcome = graph
//!         .run_turn("session-1", "clean and cluster into 3 groups", Some("data/raw.csv".into()))
//!         .await
//!         .unwrap();
//!     println!("{}", outcome.summary);
//! }
//! ```

pub mod agents;
pub mod cli;
pub mod core;
pub mod graph;
pub mod llm;
pub mod tools;

// Re-export commonly used items
pub use crate::cli::Repl;
pub use crate::core::{Config, DatalystError, Result};
pub use crate::graph::AnalysisGraph;
