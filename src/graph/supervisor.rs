//! Supervisor routing
//!
//! Inspects the full conversation plus the active data file and picks the
//! next specialist, or FINISH. The non-deterministic backend call and the
//! deterministic decision extraction are separate stages: `parse_decision`
//! is a pure function over the raw answer text.

use std::sync::Arc;

use tracing::debug;

use crate::core::{Message, Result};
use crate::graph::state::{Action, SessionState};
use crate::llm::{GenerateOptions, LLMProvider};

/// The routing component
pub struct Supervisor {
    llm: Arc<dyn LLMProvider>,
    model: String,
}

impl Supervisor {
    pub fn new(llm: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
        }
    }

    /// Decide the next action from the current state
    ///
    /// Reads the whole history; appends nothing to it. Backend transport
    /// failure propagates — the FINISH fail-safe covers unparseable answers
    /// only, never an unreachable backend.
    pub async fn decide(&self, state: &SessionState) -> Result<Action> {
        let mut messages = vec![Message::system(self.decision_prompt(state))];
        messages.extend(state.messages.iter().cloned());

        let response = self
            .llm
            .chat(
                &self.model,
                &messages,
                Some(GenerateOptions {
                    temperature: Some(0.0),
                    ..Default::default()
                }),
            )
            .await?;

        let action = parse_decision(&response.content);
        debug!(raw = %response.content.trim(), %action, "supervisor decision");
        Ok(action)
    }

    /// Build the routing prompt with the plan, the active file, and the
    /// hard rules against premature FINISH
    fn decision_prompt(&self, state: &SessionState) -> String {
        let members: Vec<&str> = Action::MEMBERS.iter().map(|a| a.name()).collect();
        let active = state.data_path.as_deref().unwrap_or("None");

        format!(
            "You are a dedicated Autonomous Data Analytics Manager. \
             Your goal is to COMPLETELY execute the user's requested workflow without \
             stopping for human input until the very end.\n\
             \n\
             Current members: {members:?}\n\
             Active Data File: {active}\n\
             \n\
             THE PLAN (Execute in Order):\n\
             1. CHECK DATA: If nulls/outliers exist -> call cleaning_agent.\n\
             2. ANALYZE: If the user wants EDA -> call cleaning_agent (perform_eda).\n\
             3. CLUSTER: If the user requested clustering -> call clustering_agent. \
             (CRITICAL: Do not skip this if requested!)\n\
             4. VISUALIZE: If the user requested plots/viz -> call visualization_agent.\n\
             \n\
             STRICT RULES:\n\
             - CHECK THE CHAT HISTORY. Have you performed clustering yet? If no, and the \
             user asked for it, CALL clustering_agent.\n\
             - Have you performed visualization yet? If no, and the user asked for it, \
             CALL visualization_agent.\n\
             - Ignore any polite 'Let me know/Ask me' text from the sub-agents. They are \
             subordinates. You are the boss.\n\
             - If the cleaning agent says 'ready for clustering', YOU MUST CALL clustering_agent.\n\
             - DO NOT CALL FINISH until every requested stage has produced evidence in the \
             history (for a visualization request, that means a 'Cluster Visualization' report).\n\
             \n\
             Reply ONLY with the name of the next agent or FINISH."
        )
    }
}

/// Extract one closed-set action from a free-text decision
///
/// Scans for member agent names as substrings in plan order; the first hit
/// wins, so a mentioned agent always beats a FINISH token in the same text.
/// With no member name present the result is FINISH — including for empty,
/// whitespace, or nonsense input — so an uninterpretable decision can never
/// loop the graph.
pub fn parse_decision(content: &str) -> Action {
    for action in Action::MEMBERS {
        if content.contains(action.name()) {
            return action;
        }
    }
    Action::Finish
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_names_resolve() {
        assert_eq!(parse_decision("cleaning_agent"), Action::Cleaning);
        assert_eq!(parse_decision("clustering_agent"), Action::Clustering);
        assert_eq!(parse_decision("visualization_agent"), Action::Visualization);
        assert_eq!(parse_decision("FINISH"), Action::Finish);
    }

    #[test]
    fn test_chatty_answer_is_extracted() {
        assert_eq!(
            parse_decision("I think we should proceed with clustering_agent next."),
            Action::Clustering
        );
    }

    #[test]
    fn test_agent_mention_beats_finish_token() {
        assert_eq!(
            parse_decision("The work looks done, FINISH... although visualization_agent has not run."),
            Action::Visualization
        );
    }

    #[test]
    fn test_fail_safe_default() {
        assert_eq!(parse_decision(""), Action::Finish);
        assert_eq!(parse_decision("   \n\t "), Action::Finish);
        assert_eq!(parse_decision("no recognizable decision here"), Action::Finish);
    }

    #[test]
    fn test_multiple_agents_resolve_in_plan_order() {
        assert_eq!(
            parse_decision("cleaning_agent then clustering_agent then visualization_agent"),
            Action::Cleaning
        );
        assert_eq!(
            parse_decision("visualization_agent or maybe clustering_agent"),
            Action::Clustering
        );
    }
}
