//! CLI layer for deepquest.
//!
//! Provides the command-line interface using clap, with commands for
//! researching a query, reviewing and running plans, probing a single
//! search source, and scaffolding prompt templates.

pub mod commands;
pub mod output;
pub mod parser;
pub mod progress;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands, SessionOptions};
