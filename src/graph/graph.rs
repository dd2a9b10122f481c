//! The analysis graph
//!
//! A cyclic control-flow machine: the supervisor picks a specialist, the
//! specialist runs and returns, and control goes back to the supervisor
//! until it decides to finish. Return-to-supervisor is the only edge out of
//! a specialist node. The graph is the sole writer of session state.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::agents::Specialist;
use crate::core::{Config, DatalystError, Message, Result, ToolCategory};
use crate::graph::checkpoint::CheckpointStore;
use crate::graph::context::context_message;
use crate::graph::extract::extract_saved_path;
use crate::graph::state::{Action, SessionState};
use crate::graph::supervisor::Supervisor;
use crate::llm::{LLMProvider, OllamaClient};
use crate::tools::ToolRegistry;

/// One step of graph execution, for the presentation layer
#[derive(Debug, Clone)]
pub enum GraphEvent {
    /// The supervisor picked the next action
    Decision { action: Action },
    /// A specialist node was entered
    NodeEntered { agent: String },
    /// A specialist finished; its report and the pointer after extraction
    WorkerReport {
        agent: String,
        report: String,
        data_path: Option<String>,
    },
    /// The turn reached the terminal state
    Finished { summary: String },
}

/// Result of one user turn
#[derive(Debug)]
pub struct TurnOutcome {
    /// The final specialist report of the turn
    pub summary: String,
    /// Active dataset artifact after the turn
    pub data_path: Option<String>,
    /// Every event the turn produced, in order
    pub trace: Vec<GraphEvent>,
    /// Number of supervisor decisions taken
    pub steps: usize,
}

/// Collects events and forwards them to an optional live channel
struct EventSink {
    tx: Option<UnboundedSender<GraphEvent>>,
    trace: Vec<GraphEvent>,
}

impl EventSink {
    fn new(tx: Option<UnboundedSender<GraphEvent>>) -> Self {
        Self {
            tx,
            trace: Vec::new(),
        }
    }

    fn emit(&mut self, event: GraphEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event.clone());
        }
        self.trace.push(event);
    }
}

/// The orchestration graph binding supervisor and specialists
pub struct AnalysisGraph {
    supervisor: Supervisor,
    cleaning: Specialist,
    clustering: Specialist,
    visualization: Specialist,
    checkpoints: CheckpointStore,
    worker_step_ceiling: usize,
    turn_step_ceiling: usize,
}

impl AnalysisGraph {
    /// Create a graph backed by Ollama, per the configuration
    pub fn new(config: &Config) -> Self {
        let llm: Arc<dyn LLMProvider> = Arc::new(OllamaClient::from_config(config));
        Self::with_provider(config, llm)
    }

    /// Create a graph over any LLM backend
    pub fn with_provider(config: &Config, llm: Arc<dyn LLMProvider>) -> Self {
        let tools = Arc::new(ToolRegistry::new());

        let specialist = |name: &str, category: ToolCategory, prompt: &str| {
            Specialist::builder(name, category)
                .system_prompt(prompt)
                .llm(llm.clone())
                .model(config.models.specialist.clone())
                .tools(tools.clone())
                .step_ceiling(config.graph.worker_step_ceiling)
                .build()
        };

        let cleaning = specialist(
            Action::Cleaning.name(),
            ToolCategory::Cleaning,
            "You are a data quality specialist. Use 'clean_data' to fix nulls and \
             outliers and 'perform_eda' to analyze distributions and correlations.",
        );
        let clustering = specialist(
            Action::Clustering.name(),
            ToolCategory::Clustering,
            "You are a clustering specialist. Use 'perform_clustering' to segment the \
             dataset with K-Means.",
        );
        let visualization = specialist(
            Action::Visualization.name(),
            ToolCategory::Visualization,
            "You are a visualization specialist. Use 'generate_visualization' to prepare \
             the cluster scatter plot.",
        );

        let checkpoints = if config.session.persist {
            CheckpointStore::with_dir(config.session.resolved_dir())
        } else {
            CheckpointStore::new()
        };

        Self {
            supervisor: Supervisor::new(llm, config.models.supervisor.clone()),
            cleaning,
            clustering,
            visualization,
            checkpoints,
            worker_step_ceiling: config.graph.worker_step_ceiling,
            turn_step_ceiling: config.graph.turn_step_ceiling,
        }
    }

    /// Current state of a session, if it exists
    pub fn session_state(&self, session_id: &str) -> Option<SessionState> {
        self.checkpoints.load(session_id)
    }

    /// Discard a session entirely
    pub fn reset_session(&self, session_id: &str) {
        self.checkpoints.reset(session_id);
    }

    /// Run one user turn to the terminal state
    pub async fn run_turn(
        &self,
        session_id: &str,
        user_input: &str,
        upload: Option<String>,
    ) -> Result<TurnOutcome> {
        self.run_turn_with_events(session_id, user_input, upload, None)
            .await
    }

    /// Run one user turn, streaming events to `events` as they happen
    ///
    /// `upload` replaces the active resource pointer before the turn starts
    /// (a freshly uploaded dataset). The session is created on first use and
    /// checkpointed after every committed delta, so an abandoned turn leaves
    /// no half-applied delta behind.
    pub async fn run_turn_with_events(
        &self,
        session_id: &str,
        user_input: &str,
        upload: Option<String>,
        events: Option<UnboundedSender<GraphEvent>>,
    ) -> Result<TurnOutcome> {
        let mut state = self
            .checkpoints
            .load(session_id)
            .unwrap_or_else(|| SessionState::new(None));
        if let Some(path) = upload {
            state.data_path = Some(path);
        }
        state.append(vec![Message::user(user_input)]);
        self.checkpoints.save(session_id, &state);

        let mut sink = EventSink::new(events);
        let mut steps = 0usize;

        info!(session_id, "turn started");

        loop {
            if steps >= self.turn_step_ceiling {
                return Err(DatalystError::GraphCeiling(self.turn_step_ceiling));
            }
            steps += 1;

            // Supervisor decision; backend failures abort the turn here
            let action = self.supervisor.decide(&state).await?;
            state.next_action = Some(action);
            self.checkpoints.save(session_id, &state);
            sink.emit(GraphEvent::Decision { action });

            if action.is_terminal() {
                break;
            }

            let specialist = self.specialist_for(action);
            sink.emit(GraphEvent::NodeEntered {
                agent: specialist.name().to_string(),
            });

            // Hand the specialist the full history plus the injected context
            // entry, and record the length so the delta is exactly what this
            // invocation contributed
            let mut augmented = state.messages.clone();
            augmented.push(context_message(state.data_path.as_deref()));
            let before = augmented.len();

            let mut outcome = specialist.invoke(augmented).await?;
            let delta: Vec<Message> = outcome.messages.split_off(before);

            if let Some(path) = extract_saved_path(&delta) {
                debug!(%path, "resource pointer updated");
                state.data_path = Some(path);
            }
            let report = delta
                .iter()
                .rev()
                .find(|m| m.is_assistant())
                .map(|m| m.content.clone())
                .unwrap_or_default();

            // Commit: delta plus pointer update land together
            state.append(delta);
            self.checkpoints.save(session_id, &state);

            sink.emit(GraphEvent::WorkerReport {
                agent: specialist.name().to_string(),
                report,
                data_path: state.data_path.clone(),
            });

            if !outcome.completed {
                // The committed delta stays; the turn itself is aborted
                return Err(DatalystError::StepCeiling {
                    agent: specialist.name().to_string(),
                    ceiling: self.worker_step_ceiling,
                });
            }
        }

        let summary = state
            .last_assistant_report()
            .unwrap_or("Task complete.")
            .to_string();
        self.checkpoints.save(session_id, &state);
        sink.emit(GraphEvent::Finished {
            summary: summary.clone(),
        });
        info!(session_id, steps, "turn finished");

        Ok(TurnOutcome {
            summary,
            data_path: state.data_path,
            trace: sink.trace,
            steps,
        })
    }

    /// Resolve a non-terminal action to its specialist node
    fn specialist_for(&self, action: Action) -> &Specialist {
        match action {
            Action::Cleaning => &self.cleaning,
            Action::Clustering => &self.clustering,
            Action::Visualization => &self.visualization,
            Action::Finish => unreachable!("terminal action has no specialist node"),
        }
    }
}
