//! Custom error types for Datalyst
//!
//! Provides a unified error handling system across all modules.

use thiserror::Error;

/// Main error type for Datalyst operations
#[derive(Error, Debug)]
pub enum DatalystError {
    /// Ollama connection or API errors
    #[error("Ollama error: {0}")]
    Ollama(String),

    /// Tool execution errors
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Model not available
    #[error("Model '{0}' not available in Ollama. Run: ollama pull {0}")]
    ModelNotFound(String),

    /// A specialist exhausted its per-invocation reasoning budget
    #[error("specialist '{agent}' exceeded its step ceiling of {ceiling} reasoning steps")]
    StepCeiling { agent: String, ceiling: usize },

    /// The graph exhausted its per-turn supervisor step ceiling
    #[error("analysis graph exceeded {0} supervisor steps without reaching FINISH")]
    GraphCeiling(usize),

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for Datalyst operations
pub type Result<T> = std::result::Result<T, DatalystError>;

impl DatalystError {
    /// Create an Ollama error
    pub fn ollama(msg: impl Into<String>) -> Self {
        Self::Ollama(msg.into())
    }

    /// Create a tool execution error
    pub fn tool(msg: impl Into<String>) -> Self {
        Self::ToolExecution(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
