//! Interactive REPL for Datalyst
//!
//! Provides the main user interaction loop: load a dataset, watch the
//! supervisor orchestrate the specialists, ask follow-up questions.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use uuid::Uuid;

use crate::cli::commands::{help_text, parse_command, Command};
use crate::core::{Config, DatalystError, Result};
use crate::graph::{AnalysisGraph, GraphEvent};
use crate::llm::{LLMProvider, OllamaClient};
use crate::tools::data::frame::Table;

/// Default request when a dataset is loaded without an explicit prompt
const AUTO_PIPELINE_PROMPT: &str =
    "Perform full data cleaning (nulls, outliers), exploratory analysis (EDA), \
     and then cluster all numeric features into 3 groups and visualize.";

/// Interactive REPL (Read-Eval-Print Loop)
pub struct Repl {
    config: Config,
    graph: AnalysisGraph,
    llm: Arc<OllamaClient>,
    session_id: String,
    pending_upload: Option<String>,
}

impl Repl {
    /// Create a REPL with the given configuration
    pub fn with_config(config: Config) -> Self {
        let llm = Arc::new(OllamaClient::from_config(&config));
        let graph = AnalysisGraph::with_provider(&config, llm.clone());

        Self {
            config,
            graph,
            llm,
            session_id: Uuid::new_v4().to_string(),
            pending_upload: None,
        }
    }

    /// Check that the backend is reachable and the configured models exist
    pub async fn initialize(&self) -> Result<()> {
        for model in [
            &self.config.models.supervisor,
            &self.config.models.specialist,
        ] {
            if !self.llm.is_model_available(model).await? {
                return Err(DatalystError::ModelNotFound(model.clone()));
            }
        }
        Ok(())
    }

    /// Stage a dataset for the next turn; returns its absolute path
    pub fn stage_upload(&mut self, path: &str) -> Result<String> {
        let absolute = std::fs::canonicalize(path)
            .map_err(|e| DatalystError::Other(format!("Cannot load '{}': {}", path, e)))?
            .to_string_lossy()
            .into_owned();
        self.pending_upload = Some(absolute.clone());
        Ok(absolute)
    }

    /// Run one request through the graph, printing the trace as it happens
    pub async fn process(&mut self, input: &str) -> Result<()> {
        let (tx, rx) = mpsc::unbounded_channel();
        let printer = tokio::spawn(async move {
            let mut events = UnboundedReceiverStream::new(rx);
            while let Some(event) = events.next().await {
                print_event(&event);
            }
        });

        let result = self
            .graph
            .run_turn_with_events(
                &self.session_id,
                input,
                self.pending_upload.take(),
                Some(tx),
            )
            .await;

        // Sender side is dropped once the turn ends; drain the printer
        let _ = printer.await;

        match result {
            Ok(outcome) => {
                println!("\nAssistant:\n{}\n", outcome.summary);
                if let Some(path) = &outcome.data_path {
                    println!("Active data file: {}\n", path);
                }
            }
            Err(e) => {
                eprintln!("\nError: {}\n", e);
            }
        }

        Ok(())
    }

    /// Run the REPL
    pub async fn run(&mut self) -> Result<()> {
        self.print_banner();

        print!("Connecting to backend...");
        io::stdout().flush()?;
        match self.initialize().await {
            Ok(()) => println!(" ready.\n"),
            Err(e) => {
                println!("\n\nInitialization error: {}\n", e);
                return Ok(());
            }
        }

        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            print!("You: ");
            stdout.flush()?;

            let mut input = String::new();
            match stdin.lock().read_line(&mut input) {
                Ok(0) => {
                    // EOF (Ctrl+D)
                    println!("\nGoodbye!");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("Error reading input: {}", e);
                    continue;
                }
            }

            let input = input.trim();
            if input.is_empty() {
                continue;
            }

            match parse_command(input) {
                Command::Exit => {
                    println!("\nGoodbye!");
                    break;
                }
                Command::Help => println!("{}\n", help_text()),
                Command::Unknown(msg) => println!("{}\n", msg),
                Command::Reset => {
                    self.graph.reset_session(&self.session_id);
                    self.session_id = Uuid::new_v4().to_string();
                    self.pending_upload = None;
                    println!("Session cleared.\n");
                }
                Command::Status => println!("{}\n", self.status_text()),
                Command::Models => match self.llm.list_models().await {
                    Ok(models) => {
                        let list = models
                            .iter()
                            .map(|m| format!("  - {}", m))
                            .collect::<Vec<_>>()
                            .join("\n");
                        println!(
                            "Available models:\n{}\n\nCurrent:\n  Supervisor: {}\n  Specialist: {}\n",
                            list, self.config.models.supervisor, self.config.models.specialist
                        );
                    }
                    Err(e) => eprintln!("Error: {}\n", e),
                },
                Command::Load(path) => match self.stage_upload(&path) {
                    Ok(absolute) => {
                        self.print_preview(&absolute);
                        println!("Starting autonomous analysis pipeline...\n");
                        self.process(AUTO_PIPELINE_PROMPT).await?;
                    }
                    Err(e) => eprintln!("{}\n", e),
                },
                Command::Chat(text) => {
                    self.process(&text).await?;
                }
            }
        }

        Ok(())
    }

    /// Print a short preview of a loaded dataset
    fn print_preview(&self, path: &str) {
        match Table::read_csv(path) {
            Ok(table) => {
                println!(
                    "Loaded {} ({} rows). Columns: {}",
                    path,
                    table.row_count(),
                    table.headers.join(", ")
                );
            }
            Err(e) => println!("Loaded {} (preview unavailable: {})", path, e),
        }
    }

    fn status_text(&self) -> String {
        let state = self.graph.session_state(&self.session_id);
        format!(
            "Datalyst Status:\n\
             ─────────────────────────────\n\
             Session:     {}\n\
             Supervisor:  {}\n\
             Specialist:  {}\n\
             Active file: {}\n\
             History:     {} messages",
            self.session_id,
            self.config.models.supervisor,
            self.config.models.specialist,
            state
                .as_ref()
                .and_then(|s| s.data_path.clone())
                .or_else(|| self.pending_upload.clone())
                .unwrap_or_else(|| "none".to_string()),
            state.map(|s| s.messages.len()).unwrap_or(0),
        )
    }

    /// Print the startup banner
    fn print_banner(&self) {
        println!("\nDatalyst — Multi-Agent Data Analytics Supervisor");
        println!("─────────────────────────────────────────────────");
        println!("Ollama:     {}", self.config.ollama_url());
        println!("Supervisor: {}", self.config.models.supervisor);
        println!("Specialist: {}", self.config.models.specialist);
        println!();
        println!("Commands: load <path>, status, models, clear, help, exit");
        println!("─────────────────────────────────────────────────");
    }
}

/// Render one graph event for the terminal trace
pub fn print_event(event: &GraphEvent) {
    match event {
        GraphEvent::Decision { action } => {
            println!("[supervisor] next -> {}", action);
        }
        GraphEvent::NodeEntered { agent } => {
            println!("[{}] working...", agent);
        }
        GraphEvent::WorkerReport {
            agent,
            report,
            data_path,
        } => {
            println!("[{}] {}", agent, report);
            if let Some(path) = data_path {
                println!("[{}] active file: {}", agent, path);
            }
        }
        GraphEvent::Finished { .. } => {}
    }
}
