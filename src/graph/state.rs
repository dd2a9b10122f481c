//! Conversation state for the analysis graph
//!
//! One `SessionState` per session id, owned by the graph; components receive
//! it per call and never read process-wide globals.

use serde::{Deserialize, Serialize};

use crate::core::Message;

/// The closed set of routing decisions the supervisor can make
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Run the cleaning/EDA specialist
    Cleaning,
    /// Run the clustering specialist
    Clustering,
    /// Run the visualization specialist
    Visualization,
    /// End the turn
    Finish,
}

impl Action {
    /// Member agents in declared plan order. The scan order doubles as the
    /// tie-break when a decision text mentions more than one agent.
    pub const MEMBERS: [Action; 3] = [Action::Cleaning, Action::Clustering, Action::Visualization];

    /// The terminal token
    pub const FINISH_TOKEN: &'static str = "FINISH";

    /// Wire name of this action
    pub fn name(&self) -> &'static str {
        match self {
            Action::Cleaning => "cleaning_agent",
            Action::Clustering => "clustering_agent",
            Action::Visualization => "visualization_agent",
            Action::Finish => Self::FINISH_TOKEN,
        }
    }

    /// Whether this action ends the turn
    pub fn is_terminal(&self) -> bool {
        matches!(self, Action::Finish)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Shared conversation state for one session
///
/// `messages` is append-only: worker output is committed strictly after the
/// full existing sequence, and nothing is ever removed or reordered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    /// Full conversation history
    pub messages: Vec<Message>,
    /// Active resource pointer: the current authoritative dataset artifact
    pub data_path: Option<String>,
    /// The supervisor's most recent decision; overwritten each turn step
    pub next_action: Option<Action>,
}

impl SessionState {
    /// Create a fresh state seeded with an optional uploaded dataset
    pub fn new(data_path: Option<String>) -> Self {
        Self {
            messages: Vec::new(),
            data_path,
            next_action: None,
        }
    }

    /// Append a batch of messages after the full existing sequence
    pub fn append(&mut self, delta: Vec<Message>) {
        self.messages.extend(delta);
    }

    /// Content of the most recent assistant message, if any
    pub fn last_assistant_report(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.is_assistant())
            .map(|m| m.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names() {
        assert_eq!(Action::Cleaning.name(), "cleaning_agent");
        assert_eq!(Action::Clustering.name(), "clustering_agent");
        assert_eq!(Action::Visualization.name(), "visualization_agent");
        assert_eq!(Action::Finish.name(), "FINISH");
        assert!(Action::Finish.is_terminal());
        assert!(!Action::Cleaning.is_terminal());
    }

    #[test]
    fn test_append_preserves_order() {
        let mut state = SessionState::new(None);
        state.append(vec![Message::user("hello")]);
        state.append(vec![Message::assistant("report"), Message::tool("result")]);

        assert_eq!(state.messages.len(), 3);
        assert_eq!(state.messages[0].role, "user");
        assert_eq!(state.last_assistant_report(), Some("report"));
    }
}
