//! Configuration management for Datalyst
//!
//! Supports environment variables, config files, and runtime overrides.
//! Models are interchangeable via settings.
//!
//! Config file location: ~/.config/datalyst/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::core::error::{DatalystError, Result};

/// Main configuration for Datalyst
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Ollama configuration
    pub ollama: OllamaConfig,
    /// Model configuration
    pub models: ModelConfig,
    /// Graph execution limits
    #[serde(default)]
    pub graph: GraphConfig,
    /// Session checkpoint configuration
    #[serde(default)]
    pub session: SessionConfig,
}

/// Ollama server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Host address (default: localhost)
    pub host: String,
    /// Port number (default: 11434)
    pub port: u16,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Model configuration - interchangeable models
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model used for supervisor routing decisions
    pub supervisor: String,
    /// Model used by the specialist agents (tool calling)
    pub specialist: String,
}

/// Limits on graph execution
///
/// Both ceilings count discrete reasoning steps, not wall-clock time, and a
/// breach is reported as an error rather than retried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Maximum reasoning steps per specialist invocation
    pub worker_step_ceiling: usize,
    /// Maximum supervisor decisions per user turn
    pub turn_step_ceiling: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            worker_step_ceiling: 25,
            turn_step_ceiling: 40,
        }
    }
}

/// Session checkpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Whether session state is written to disk after each commit
    pub persist: bool,
    /// Directory for session files; defaults to ./.datalyst/sessions
    pub dir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            persist: true,
            dir: None,
        }
    }
}

impl SessionConfig {
    /// Resolve the session directory
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| {
            env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(".datalyst")
                .join("sessions")
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama: OllamaConfig::default(),
            models: ModelConfig::default(),
            graph: GraphConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: env::var("OLLAMA_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env::var("OLLAMA_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(11434),
            timeout_secs: 120,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            supervisor: env::var("DATALYST_SUPERVISOR_MODEL")
                .unwrap_or_else(|_| "qwen3:8b".to_string()),
            specialist: env::var("DATALYST_SPECIALIST_MODEL")
                .unwrap_or_else(|_| "qwen3:8b".to_string()),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("datalyst")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load() -> Self {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        if let Ok(config) = Self::load_from_file() {
            return config;
        }

        // Fall back to defaults (which respect env vars)
        Self::default()
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(DatalystError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| DatalystError::config(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| DatalystError::config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::config_dir();
        let config_path = Self::config_file();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .map_err(|e| DatalystError::config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| DatalystError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)
            .map_err(|e| DatalystError::config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Get the full Ollama API URL
    pub fn ollama_url(&self) -> String {
        format!("http://{}:{}", self.ollama.host, self.ollama.port)
    }

    /// Update the supervisor model
    pub fn set_supervisor(&mut self, model: impl Into<String>) {
        self.models.supervisor = model.into();
    }

    /// Update the specialist model
    pub fn set_specialist(&mut self, model: impl Into<String>) {
        self.models.specialist = model.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.ollama.port, 11434);
        assert_eq!(config.graph.worker_step_ceiling, 25);
        assert_eq!(config.graph.turn_step_ceiling, 40);
        assert!(config.session.persist);
    }

    #[test]
    fn test_ollama_url() {
        let config = Config::default();
        assert_eq!(config.ollama_url(), "http://localhost:11434");
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("supervisor"));
        assert!(toml_str.contains("worker_step_ceiling"));
    }

    #[test]
    fn test_config_dir() {
        let dir = Config::config_dir();
        assert!(dir.to_string_lossy().contains("datalyst"));
    }
}
