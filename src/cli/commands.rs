//! CLI commands
//!
//! Special commands that can be executed in the REPL.

/// A parsed line of REPL input
pub enum Command {
    /// Plain chat input for the analysis graph
    Chat(String),
    /// Load a dataset and start the autonomous pipeline
    Load(String),
    /// Show help text
    Help,
    /// List available backend models
    Models,
    /// Show session status
    Status,
    /// Reset the session
    Reset,
    /// Exit the REPL
    Exit,
    /// Unrecognized slash command
    Unknown(String),
}

/// Parse one line of input
pub fn parse_command(input: &str) -> Command {
    let input = input.trim();
    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0].to_lowercase();
    let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd.as_str() {
        "exit" | "quit" | "q" => Command::Exit,
        "clear" | "reset" => Command::Reset,
        "help" | "?" => Command::Help,
        "models" => Command::Models,
        "status" => Command::Status,
        "load" if !args.is_empty() => Command::Load(args.to_string()),
        "load" => Command::Unknown("load requires a file path".to_string()),
        _ => {
            if input.starts_with('/') {
                Command::Unknown(format!(
                    "Unknown command: {}. Type 'help' for available commands.",
                    cmd
                ))
            } else {
                Command::Chat(input.to_string())
            }
        }
    }
}

/// Help text for the REPL
pub fn help_text() -> String {
    "Commands:\n\
     ─────────────────────────────\n\
     load <path>   Load a CSV dataset and run the full analysis pipeline\n\
     status        Show session id, active file, and message count\n\
     models        List models available on the backend\n\
     clear/reset   Discard the session and start fresh\n\
     help          Show this help\n\
     exit          Quit\n\
     \n\
     Anything else is sent to the supervisor as a request, e.g.\n\
     'clean the data and cluster it into 4 groups'."
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert!(matches!(parse_command("exit"), Command::Exit));
        assert!(matches!(parse_command("  reset  "), Command::Reset));
        assert!(matches!(parse_command("load data.csv"), Command::Load(p) if p == "data.csv"));
        assert!(matches!(parse_command("load"), Command::Unknown(_)));
        assert!(matches!(parse_command("/wat"), Command::Unknown(_)));
        assert!(matches!(
            parse_command("cluster into 3 groups"),
            Command::Chat(_)
        ));
    }
}
