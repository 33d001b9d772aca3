//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// deepquest: plan-execute-replan research assistant.
///
/// Plans research steps for a query, executes them concurrently against
/// web, `ArXiv`, `NewsAPI`, SEC and Wikipedia sources through LLM function
/// calling, and writes a long-form report.
#[derive(Parser, Debug)]
#[command(name = "deepquest")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). Logs go to stderr.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// Directory containing prompt template files.
    ///
    /// Falls back to `DEEPQUEST_PROMPT_DIR`, then `~/.config/deepquest/prompts`.
    #[arg(long, global = true)]
    pub prompt_dir: Option<PathBuf>,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Knobs shared by the commands that execute a session.
#[derive(Args, Debug, Clone, Default)]
pub struct SessionOptions {
    /// Ceiling on the total number of planned steps.
    #[arg(long)]
    pub max_steps: Option<usize>,

    /// Steps executed concurrently per batch.
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Productive replan rounds before replanning stops.
    #[arg(long)]
    pub max_replan_rounds: Option<usize>,

    /// Have an evaluator check the report and regenerate it if needed.
    #[arg(long)]
    pub evaluate: bool,

    /// Report generations when --evaluate is set.
    #[arg(long)]
    pub max_attempts: Option<usize>,

    /// Model (or Azure deployment) for every role unless overridden by env.
    #[arg(long)]
    pub model: Option<String>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Research a query end to end: plan, execute, replan, report.
    #[command(after_help = r#"Examples:
  deepquest research "What is the capital of France?"
  deepquest research "State of solid-state batteries" --max-steps 10 --evaluate
  deepquest research "EV market 2025" --output report.md
  deepquest --format json research "Tesla 10-K highlights" > session.json
"#)]
    Research {
        /// The research query.
        query: String,

        /// Session knobs.
        #[command(flatten)]
        options: SessionOptions,

        /// Write the report (or partial context on failure) to this file.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate a plan for review without executing it.
    ///
    /// Writes `{"query": ..., "steps": [...]}`. Edit the steps, then pass
    /// the file to `deepquest run`.
    #[command(after_help = r#"Examples:
  deepquest plan "History of the transistor" --output plan.json
  $EDITOR plan.json
  deepquest run plan.json
"#)]
    Plan {
        /// The research query.
        query: String,

        /// Ceiling on the number of planned steps.
        #[arg(long)]
        max_steps: Option<usize>,

        /// Write the plan to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Execute a reviewed plan file.
    Run {
        /// Plan file written by `deepquest plan`.
        plan_file: PathBuf,

        /// Session knobs.
        #[command(flatten)]
        options: SessionOptions,

        /// Write the report (or partial context on failure) to this file.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Query a single search source.
    #[command(after_help = r#"Examples:
  deepquest search wikipedia "Paris"
  deepquest search arxiv "retrieval augmented generation"
  deepquest search sec "Tesla"
"#)]
    Search {
        /// Source name: google, arxiv, newsapi, sec, wikipedia.
        source: String,

        /// Search query.
        query: String,
    },

    /// Write the default prompt templates for customization.
    ///
    /// Existing files are left untouched.
    InitPrompts {
        /// Target directory (defaults to `~/.config/deepquest/prompts`).
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}
