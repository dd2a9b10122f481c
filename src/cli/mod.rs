//! Command-line interface and REPL

pub mod commands;
pub mod repl;

pub use repl::Repl;
