//! The orchestration core
//!
//! Supervisor routing, context injection, delta extraction, and the cyclic
//! graph that binds them together over checkpointed session state.

pub mod checkpoint;
pub mod context;
pub mod extract;
#[allow(clippy::module_inception)]
pub mod graph;
pub mod state;
pub mod supervisor;

pub use checkpoint::CheckpointStore;
pub use context::context_message;
pub use extract::extract_saved_path;
pub use graph::{AnalysisGraph, GraphEvent, TurnOutcome};
pub use state::{Action, SessionState};
pub use supervisor::{parse_decision, Supervisor};
