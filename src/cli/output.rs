//! Output formatting for CLI commands.

use std::fmt::Write;

use serde::Serialize;

use crate::core::{ResearchPlan, ResearchSession};

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Parses a format name; anything other than `json` is text.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    /// Serializes `value` as pretty JSON.
    #[must_use]
    pub fn to_json<T: Serialize + ?Sized>(self, value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }
}

/// Formats a finished session: the report plus a one-line summary.
#[must_use]
pub fn format_session(session: &ResearchSession, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format.to_json(session),
        OutputFormat::Text => {
            let Some(report) = session.report() else {
                return format!("No plan available for: {}\n", session.query());
            };
            let (completed, total) = session.progress();
            let mut output = report.trim_end().to_string();
            let _ = write!(
                output,
                "\n\n---\nSteps: {completed}/{total} completed | Replan rounds: {}{}\n",
                session.replan().rounds(),
                if session.replan().limit_reached() {
                    " (limit reached)"
                } else {
                    ""
                }
            );
            output
        }
    }
}

/// Formats a plan for review.
///
/// Both formats emit JSON so the result can be edited and fed to `run`.
#[must_use]
pub fn format_plan(plan: &ResearchPlan, format: OutputFormat) -> String {
    let mut output = format.to_json(plan);
    output.push('\n');
    output
}

/// Formats a plan as a numbered list for the terminal.
#[must_use]
pub fn format_plan_summary(plan: &ResearchPlan) -> String {
    let mut output = format!("Plan for: {}\n", plan.query);
    for (i, step) in plan.steps.iter().enumerate() {
        let _ = writeln!(output, "  {}. {step}", i + 1);
    }
    output
}

/// Formats the partial state of a halted session.
///
/// Text output is the accumulated context; JSON output is the whole session.
#[must_use]
pub fn format_partial(session: &ResearchSession, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format.to_json(session),
        OutputFormat::Text => {
            let mut output = format!("# Partial research: {}\n", session.query());
            output.push_str(session.context());
            output
        }
    }
}

/// Formats a single-source search result.
#[must_use]
pub fn format_search(source: &str, query: &str, text: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!("{text}\n"),
        OutputFormat::Json => format.to_json(&serde_json::json!({
            "source": source,
            "query": query,
            "result": text,
        })),
    }
}
