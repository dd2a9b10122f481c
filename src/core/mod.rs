//! Core types, configuration, and error handling

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, GraphConfig, ModelConfig, OllamaConfig, SessionConfig};
pub use error::{DatalystError, Result};
pub use types::{
    FunctionDefinition, Message, ToolCall, ToolCategory, ToolDefinition, ToolResult,
};
