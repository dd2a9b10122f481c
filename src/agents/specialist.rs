//! Specialist agents
//!
//! Bounded task executors: each wraps one tool category and an internal
//! reasoning loop that decides which tools to invoke and when to stop. The
//! loop carries a hard step ceiling; running into it is reported through the
//! outcome, never hidden by truncation.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::{Message, Result, ToolCategory, ToolDefinition, ToolResult};
use crate::llm::{GenerateOptions, LLMProvider};
use crate::tools::ToolRegistry;

/// A specialist agent with a fixed tool category
pub struct Specialist {
    /// Name of this specialist (matches its routing action)
    name: String,
    /// System prompt defining the specialist's role
    system_prompt: String,
    /// Tool category this specialist may use
    category: ToolCategory,
    /// LLM backend
    llm: Arc<dyn LLMProvider>,
    /// Model to use
    model: String,
    /// Tool registry
    tools: Arc<ToolRegistry>,
    /// Maximum reasoning steps per invocation
    step_ceiling: usize,
}

/// Everything one invocation produced
///
/// `messages` is the full transcript the specialist worked on, with its own
/// contributions appended at the end; `completed` is false when the step
/// ceiling cut the loop short.
pub struct InvokeOutcome {
    pub messages: Vec<Message>,
    pub completed: bool,
}

/// Builder for creating Specialists
pub struct SpecialistBuilder {
    name: String,
    system_prompt: Option<String>,
    category: ToolCategory,
    llm: Option<Arc<dyn LLMProvider>>,
    model: Option<String>,
    tools: Option<Arc<ToolRegistry>>,
    step_ceiling: usize,
}

impl SpecialistBuilder {
    /// Create a new builder with the given name and tool category
    pub fn new(name: impl Into<String>, category: ToolCategory) -> Self {
        Self {
            name: name.into(),
            system_prompt: None,
            category,
            llm: None,
            model: None,
            tools: None,
            step_ceiling: 25,
        }
    }

    /// Set the system prompt
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Set the LLM backend
    pub fn llm(mut self, llm: Arc<dyn LLMProvider>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Set the model to use
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the tool registry
    pub fn tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Set the step ceiling
    pub fn step_ceiling(mut self, ceiling: usize) -> Self {
        self.step_ceiling = ceiling;
        self
    }

    /// Build the Specialist
    ///
    /// Panics only on a wiring mistake (missing backend or registry), which
    /// is a programming error, not a runtime condition.
    pub fn build(self) -> Specialist {
        Specialist {
            system_prompt: self.system_prompt.unwrap_or_else(|| {
                format!(
                    "You are the '{}' specialist. Complete your assigned task using your tools.",
                    self.name
                )
            }),
            name: self.name,
            category: self.category,
            llm: self.llm.expect("specialist requires an LLM backend"),
            model: self.model.expect("specialist requires a model"),
            tools: self.tools.expect("specialist requires a tool registry"),
            step_ceiling: self.step_ceiling,
        }
    }
}

impl Specialist {
    /// Create a builder
    pub fn builder(name: impl Into<String>, category: ToolCategory) -> SpecialistBuilder {
        SpecialistBuilder::new(name, category)
    }

    /// Get the name of this specialist
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the internal reasoning loop over the given transcript
    ///
    /// The transcript is taken by value and returned with this specialist's
    /// contributions appended; the caller computes the delta from the length
    /// it recorded beforehand. Shared state is never touched here.
    pub async fn invoke(&self, mut messages: Vec<Message>) -> Result<InvokeOutcome> {
        let definitions: Vec<ToolDefinition> = self
            .tools
            .definitions_by_category(self.category)
            .into_iter()
            .cloned()
            .collect();

        for step in 0..self.step_ceiling {
            // The role prompt is call payload, not transcript
            let mut call_messages = Vec::with_capacity(messages.len() + 1);
            call_messages.push(Message::system(&self.system_prompt));
            call_messages.extend(messages.iter().cloned());

            let response = self
                .llm
                .chat_with_tools(
                    &self.model,
                    &call_messages,
                    &definitions,
                    Some(GenerateOptions {
                        temperature: Some(0.1),
                        ..Default::default()
                    }),
                )
                .await?;

            if response.tool_calls.is_empty() {
                // No tool calls = the specialist's closing report
                let report = if response.content.trim().is_empty() {
                    "Task complete.".to_string()
                } else {
                    response.content
                };
                messages.push(Message::assistant(report));
                return Ok(InvokeOutcome {
                    messages,
                    completed: true,
                });
            }

            debug!(
                agent = %self.name,
                step,
                tools = response.tool_calls.len(),
                "executing tool calls"
            );
            messages.push(Message::assistant_with_calls(
                response.content,
                response.tool_calls.clone(),
            ));

            for call in &response.tool_calls {
                let result = match self.tools.execute(call).await {
                    Ok(result) => result,
                    // Dispatch failures become report text like any tool
                    // error; the supervisor decides what happens next
                    Err(e) => ToolResult::failure(
                        &call.name,
                        format!("Error during {}: {}", call.name, e),
                    ),
                };
                messages.push(Message::tool(result.output));
            }
        }

        warn!(agent = %self.name, ceiling = self.step_ceiling, "step ceiling reached");
        Ok(InvokeOutcome {
            messages,
            completed: false,
        })
    }
}
