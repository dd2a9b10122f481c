//! Orchestration integration tests
//!
//! Drives the full analysis graph with a scripted LLM backend and real CSV
//! fixtures: routing, delta isolation, pointer propagation, ceilings, and
//! failure semantics.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use datalyst::core::{Config, DatalystError, Message, Result, ToolCall, ToolDefinition};
use datalyst::graph::{Action, AnalysisGraph, GraphEvent};
use datalyst::llm::{GenerateOptions, LLMProvider, LLMResponse};

/// One scripted backend reply
enum Step {
    Reply(LLMResponse),
    Fail(String),
}

/// Backend that replays a fixed sequence of responses
///
/// Turn execution is strictly sequential, so supervisor and specialist calls
/// consume from the same queue in a deterministic order.
struct ScriptedProvider {
    steps: Mutex<VecDeque<Step>>,
}

impl ScriptedProvider {
    fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
        })
    }

    fn next(&self) -> Result<LLMResponse> {
        match self.steps.lock().unwrap().pop_front() {
            Some(Step::Reply(response)) => Ok(response),
            Some(Step::Fail(msg)) => Err(DatalystError::Ollama(msg)),
            None => Err(DatalystError::Other("script exhausted".to_string())),
        }
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn chat(
        &self,
        _model: &str,
        _messages: &[Message],
        _options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        self.next()
    }

    async fn chat_with_tools(
        &self,
        _model: &str,
        _messages: &[Message],
        _tools: &[ToolDefinition],
        _options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        self.next()
    }

    async fn is_model_available(&self, _model: &str) -> Result<bool> {
        Ok(true)
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Backend whose specialists loop on tool calls forever
struct LoopingProvider {
    decision: String,
    tool_call: ToolCall,
}

#[async_trait]
impl LLMProvider for LoopingProvider {
    async fn chat(
        &self,
        _model: &str,
        _messages: &[Message],
        _options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        Ok(LLMResponse::text(self.decision.clone()))
    }

    async fn chat_with_tools(
        &self,
        _model: &str,
        _messages: &[Message],
        _tools: &[ToolDefinition],
        _options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        Ok(LLMResponse::with_tool_calls(
            "",
            vec![self.tool_call.clone()],
        ))
    }

    async fn is_model_available(&self, _model: &str) -> Result<bool> {
        Ok(true)
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "looping"
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.session.persist = false;
    config
}

/// Ten well-behaved rows: two numeric features, no nulls, no outliers
fn write_raw_csv(dir: &std::path::Path) -> String {
    let path = dir.join("raw.csv");
    let mut content = String::from("x,y\n");
    for i in 0..10 {
        content.push_str(&format!("{},{}\n", i, i * 2));
    }
    std::fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

fn decisions(trace: &[GraphEvent]) -> Vec<Action> {
    trace
        .iter()
        .filter_map(|e| match e {
            GraphEvent::Decision { action } => Some(*action),
            _ => None,
        })
        .collect()
}

fn nodes_entered(trace: &[GraphEvent]) -> Vec<String> {
    trace
        .iter()
        .filter_map(|e| match e {
            GraphEvent::NodeEntered { agent } => Some(agent.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn clean_then_cluster_without_visualization() {
    let dir = tempfile::tempdir().unwrap();
    let raw = write_raw_csv(dir.path());
    let cleaned = raw.replace("raw.csv", "raw_cleaned.csv");
    let clustered = raw.replace("raw.csv", "raw_cleaned_clustered.csv");

    let provider = ScriptedProvider::new(vec![
        // Supervisor: data quality first
        Step::Reply(LLMResponse::text("cleaning_agent")),
        // Cleaning specialist: one clean_data call, then a closing report
        Step::Reply(LLMResponse::with_tool_calls(
            "",
            vec![ToolCall::new("clean_data", json!({ "file_path": raw }))],
        )),
        Step::Reply(LLMResponse::text(
            "Task Complete. Data is ready for clustering.",
        )),
        // Supervisor: clustering was requested
        Step::Reply(LLMResponse::text("clustering_agent")),
        // Clustering specialist works on the cleaned artifact
        Step::Reply(LLMResponse::with_tool_calls(
            "",
            vec![ToolCall::new(
                "perform_clustering",
                json!({ "file_path": cleaned, "columns": ["x", "y"], "k": 3 }),
            )],
        )),
        Step::Reply(LLMResponse::text(
            "Task Complete. Three segments identified.",
        )),
        // Supervisor: everything requested has evidence in history
        Step::Reply(LLMResponse::text("FINISH")),
    ]);

    let graph = AnalysisGraph::with_provider(&test_config(), provider);
    let outcome = graph
        .run_turn("session-1", "clean and cluster into 3 groups", Some(raw))
        .await
        .unwrap();

    assert_eq!(
        decisions(&outcome.trace),
        vec![Action::Cleaning, Action::Clustering, Action::Finish]
    );
    assert_eq!(
        nodes_entered(&outcome.trace),
        vec!["cleaning_agent", "clustering_agent"]
    );
    assert_eq!(outcome.data_path.as_deref(), Some(clustered.as_str()));
    assert_eq!(outcome.summary, "Task Complete. Three segments identified.");
    assert!(std::path::Path::new(&clustered).exists());

    // The clustered artifact carries the plotting columns
    let header = std::fs::read_to_string(&clustered)
        .unwrap()
        .lines()
        .next()
        .unwrap()
        .to_string();
    assert!(header.contains("Cluster"));
    assert!(header.contains("PCA1"));
    assert!(header.contains("PCA2"));
}

#[tokio::test]
async fn committed_history_never_contains_injected_context() {
    let dir = tempfile::tempdir().unwrap();
    let raw = write_raw_csv(dir.path());

    let provider = ScriptedProvider::new(vec![
        Step::Reply(LLMResponse::text("cleaning_agent")),
        Step::Reply(LLMResponse::with_tool_calls(
            "",
            vec![ToolCall::new("perform_eda", json!({ "file_path": raw }))],
        )),
        Step::Reply(LLMResponse::text("Task Complete. EDA report above.")),
        Step::Reply(LLMResponse::text("FINISH")),
    ]);

    let graph = AnalysisGraph::with_provider(&test_config(), provider);
    graph
        .run_turn("session-1", "run EDA", Some(raw))
        .await
        .unwrap();

    let state = graph.session_state("session-1").unwrap();
    // user + assistant(tool call) + tool result + closing report
    assert_eq!(state.messages.len(), 4);
    assert!(
        state.messages.iter().all(|m| m.role != "system"),
        "the injected context entry must not be committed"
    );
    assert_eq!(state.messages[0].role, "user");
}

#[tokio::test]
async fn pointer_carried_over_when_no_marker_appears() {
    let dir = tempfile::tempdir().unwrap();
    let raw = write_raw_csv(dir.path());

    let provider = ScriptedProvider::new(vec![
        Step::Reply(LLMResponse::text("cleaning_agent")),
        // Specialist reports without producing any artifact
        Step::Reply(LLMResponse::text("Task Complete. Nothing to clean.")),
        Step::Reply(LLMResponse::text("FINISH")),
    ]);

    let graph = AnalysisGraph::with_provider(&test_config(), provider);
    let outcome = graph
        .run_turn("session-1", "check the data", Some(raw.clone()))
        .await
        .unwrap();

    assert_eq!(outcome.data_path.as_deref(), Some(raw.as_str()));
}

#[tokio::test]
async fn chatty_supervisor_answer_routes_to_the_mentioned_agent() {
    let dir = tempfile::tempdir().unwrap();
    let raw = write_raw_csv(dir.path());

    let provider = ScriptedProvider::new(vec![
        Step::Reply(LLMResponse::text(
            "I think we should proceed with clustering_agent next.",
        )),
        Step::Reply(LLMResponse::with_tool_calls(
            "",
            vec![ToolCall::new(
                "perform_clustering",
                json!({ "file_path": raw, "k": 2 }),
            )],
        )),
        Step::Reply(LLMResponse::text("Task Complete. Two segments.")),
        Step::Reply(LLMResponse::text("FINISH")),
    ]);

    let graph = AnalysisGraph::with_provider(&test_config(), provider);
    let outcome = graph
        .run_turn("session-1", "cluster this", Some(raw))
        .await
        .unwrap();

    assert_eq!(
        decisions(&outcome.trace)[0],
        Action::Clustering,
        "prose around the agent name must not default to FINISH"
    );
}

#[tokio::test]
async fn unparseable_decision_fails_safe_to_finish() {
    let provider = ScriptedProvider::new(vec![Step::Reply(LLMResponse::text(
        "Hmm, I am not sure what to do here.",
    ))]);

    let graph = AnalysisGraph::with_provider(&test_config(), provider);
    let outcome = graph
        .run_turn("session-1", "do something", None)
        .await
        .unwrap();

    assert_eq!(decisions(&outcome.trace), vec![Action::Finish]);
    assert_eq!(outcome.steps, 1);
    assert!(nodes_entered(&outcome.trace).is_empty());
}

#[tokio::test]
async fn worker_step_ceiling_aborts_the_turn_but_keeps_the_delta() {
    let dir = tempfile::tempdir().unwrap();
    let raw = write_raw_csv(dir.path());

    let mut config = test_config();
    config.graph.worker_step_ceiling = 2;

    let provider = Arc::new(LoopingProvider {
        decision: "cleaning_agent".to_string(),
        tool_call: ToolCall::new("perform_eda", json!({ "file_path": raw.clone() })),
    });

    let graph = AnalysisGraph::with_provider(&config, provider);
    let err = graph
        .run_turn("session-1", "analyze", Some(raw))
        .await
        .unwrap_err();

    match err {
        DatalystError::StepCeiling { agent, ceiling } => {
            assert_eq!(agent, "cleaning_agent");
            assert_eq!(ceiling, 2);
        }
        other => panic!("expected StepCeiling, got {other}"),
    }

    // The messages the specialist produced before the breach persist
    let state = graph.session_state("session-1").unwrap();
    assert!(state.messages.len() > 1, "delta must be committed");
    assert!(state.messages.iter().all(|m| m.role != "system"));
}

#[tokio::test]
async fn turn_step_ceiling_is_reported_not_silently_cut() {
    let mut config = test_config();
    config.graph.turn_step_ceiling = 2;

    // The supervisor keeps re-selecting the cleaning agent, which keeps
    // reporting without making progress
    let provider = ScriptedProvider::new(vec![
        Step::Reply(LLMResponse::text("cleaning_agent")),
        Step::Reply(LLMResponse::text("Task Complete.")),
        Step::Reply(LLMResponse::text("cleaning_agent")),
        Step::Reply(LLMResponse::text("Task Complete.")),
    ]);

    let graph = AnalysisGraph::with_provider(&config, provider);
    let err = graph
        .run_turn("session-1", "clean", None)
        .await
        .unwrap_err();

    assert!(matches!(err, DatalystError::GraphCeiling(2)));
}

#[tokio::test]
async fn backend_failure_propagates_instead_of_defaulting() {
    let provider = ScriptedProvider::new(vec![Step::Fail("connection refused".to_string())]);

    let graph = AnalysisGraph::with_provider(&test_config(), provider);
    let err = graph
        .run_turn("session-1", "clean the data", None)
        .await
        .unwrap_err();

    assert!(
        matches!(err, DatalystError::Ollama(_)),
        "backend unavailability must never be parsed as a FINISH decision"
    );
}

#[tokio::test]
async fn tool_failure_surfaces_as_text_and_returns_to_supervisor() {
    let provider = ScriptedProvider::new(vec![
        Step::Reply(LLMResponse::text("cleaning_agent")),
        // The specialist aims at a path that does not exist
        Step::Reply(LLMResponse::with_tool_calls(
            "",
            vec![ToolCall::new(
                "clean_data",
                json!({ "file_path": "/nonexistent/data.csv" }),
            )],
        )),
        Step::Reply(LLMResponse::text("Task Complete. Cleaning failed.")),
        // The supervisor sees the error report and decides to stop
        Step::Reply(LLMResponse::text("FINISH")),
    ]);

    let graph = AnalysisGraph::with_provider(&test_config(), provider);
    let outcome = graph
        .run_turn("session-1", "clean", None)
        .await
        .unwrap();

    let state = graph.session_state("session-1").unwrap();
    assert!(
        state
            .messages
            .iter()
            .any(|m| m.role == "tool" && m.content.starts_with("Error during cleaning:")),
        "tool failure must appear as report text in history"
    );
    // The failed tool produced no artifact, so no pointer was picked up
    assert_eq!(outcome.data_path, None);
}

#[tokio::test]
async fn session_state_accumulates_across_turns() {
    let provider = ScriptedProvider::new(vec![
        // Turn one
        Step::Reply(LLMResponse::text("cleaning_agent")),
        Step::Reply(LLMResponse::text("Task Complete. Looks clean already.")),
        Step::Reply(LLMResponse::text("FINISH")),
        // Turn two
        Step::Reply(LLMResponse::text("FINISH")),
    ]);

    let graph = AnalysisGraph::with_provider(&test_config(), provider);
    graph
        .run_turn("session-1", "check the data", None)
        .await
        .unwrap();
    let after_first = graph.session_state("session-1").unwrap().messages.len();

    graph
        .run_turn("session-1", "thanks, that is all", None)
        .await
        .unwrap();
    let state = graph.session_state("session-1").unwrap();

    assert_eq!(state.messages.len(), after_first + 1);
    assert_eq!(state.messages[0].content, "check the data");

    // Explicit reset tears the session down
    graph.reset_session("session-1");
    assert!(graph.session_state("session-1").is_none());
}
