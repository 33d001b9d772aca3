//! CLI command implementations.
//!
//! Contains the business logic for each CLI command. Async work runs on a
//! tokio runtime created per command.

use std::path::Path;
use std::sync::Arc;

use crate::agent::planner::validate_query;
use crate::agent::{
    AgentConfig, GENERIC_FAILURE_MESSAGE, Orchestrator, PromptSet, SessionObserver,
    create_provider,
};
use crate::cli::output::{
    OutputFormat, format_partial, format_plan, format_plan_summary, format_search, format_session,
};
use crate::cli::parser::{Cli, Commands, SessionOptions};
use crate::cli::progress::ProgressObserver;
use crate::core::{ResearchPlan, ResearchSession, SessionPhase};
use crate::error::{CommandError, Result};
use crate::gateway::{GatewayConfig, ToolGateway};

/// Executes the CLI command.
///
/// # Arguments
///
/// * `cli` - Parsed CLI arguments.
///
/// # Returns
///
/// Result with output string on success.
///
/// # Errors
///
/// Returns an error if the command fails to execute. A research session
/// that halts reports [`CommandError::SessionFailed`] with its progress.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);
    let prompt_dir = cli.prompt_dir.as_deref();

    match &cli.command {
        Commands::Research {
            query,
            options,
            output,
        } => cmd_research(query, options, prompt_dir, output.as_deref(), format),
        Commands::Plan {
            query,
            max_steps,
            output,
        } => cmd_plan(query, *max_steps, prompt_dir, output.as_deref(), format),
        Commands::Run {
            plan_file,
            options,
            output,
        } => cmd_run(plan_file, options, prompt_dir, output.as_deref(), format),
        Commands::Search { source, query } => cmd_search(source, query, format),
        Commands::InitPrompts { dir } => cmd_init_prompts(dir.as_deref(), format),
    }
}

// ==================== Setup ====================

/// Builds agent configuration from env + CLI overrides.
fn agent_config(options: &SessionOptions, prompt_dir: Option<&Path>) -> Result<AgentConfig> {
    let mut builder = AgentConfig::builder().from_env();
    if let Some(model) = &options.model {
        builder = builder.planner_model(model);
    }
    if let Some(n) = options.max_steps {
        builder = builder.max_steps(n);
    }
    if let Some(n) = options.batch_size {
        builder = builder.batch_size(n);
    }
    if let Some(n) = options.max_replan_rounds {
        builder = builder.max_replan_rounds(n);
    }
    if let Some(n) = options.max_attempts {
        builder = builder.max_attempts(n);
    }
    if options.evaluate {
        builder = builder.evaluate_report(true);
    }
    if let Some(dir) = prompt_dir {
        builder = builder.prompt_dir(dir);
    }

    builder.build().map_err(|e| {
        CommandError::ExecutionFailed(format!("Agent configuration error: {e}")).into()
    })
}

fn build_orchestrator(config: AgentConfig, format: OutputFormat) -> Result<Orchestrator> {
    let provider = create_provider(&config).map_err(|e| {
        CommandError::ExecutionFailed(format!("Provider creation failed: {e}"))
    })?;
    let gateway = ToolGateway::new(&GatewayConfig::from_env())?;

    let observer: Arc<dyn SessionObserver> = match format {
        OutputFormat::Text => Arc::new(ProgressObserver::new()),
        OutputFormat::Json => Arc::new(ProgressObserver::hidden()),
    };

    Ok(
        Orchestrator::new(Arc::from(provider), Arc::new(gateway), config)
            .with_observer(observer),
    )
}

/// Creates a tokio runtime as sync/async bridge.
fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}")).into()
    })
}

fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

// ==================== Research Commands ====================

fn cmd_research(
    query: &str,
    options: &SessionOptions,
    prompt_dir: Option<&Path>,
    output: Option<&Path>,
    format: OutputFormat,
) -> Result<String> {
    validate_query(query).map_err(|e| CommandError::ExecutionFailed(e.to_string()))?;
    let config = agent_config(options, prompt_dir)?;
    let orchestrator = build_orchestrator(config, format)?;
    let session = orchestrator.new_session(query);
    run_session(&orchestrator, session, output, format)
}

fn cmd_plan(
    query: &str,
    max_steps: Option<usize>,
    prompt_dir: Option<&Path>,
    output: Option<&Path>,
    format: OutputFormat,
) -> Result<String> {
    validate_query(query).map_err(|e| CommandError::ExecutionFailed(e.to_string()))?;
    let options = SessionOptions {
        max_steps,
        ..SessionOptions::default()
    };
    let config = agent_config(&options, prompt_dir)?;
    let orchestrator = build_orchestrator(config, format)?;
    let mut session = orchestrator.new_session(query);

    let rt = runtime()?;
    rt.block_on(orchestrator.plan(&mut session))
        .map_err(|e| CommandError::ExecutionFailed(format!("Planning failed: {e}")))?;

    if session.phase() == SessionPhase::Done {
        return Err(
            CommandError::ExecutionFailed(format!("No plan available for: {query}")).into(),
        );
    }

    let plan = session.to_plan();
    let rendered = format_plan(&plan, format);
    match output {
        Some(path) => {
            write_output(path, &rendered)?;
            Ok(format!(
                "{}\nPlan written to: {}\nEdit the steps, then run: deepquest run {}\n",
                format_plan_summary(&plan),
                path.display(),
                path.display()
            ))
        }
        None => Ok(rendered),
    }
}

fn cmd_run(
    plan_file: &Path,
    options: &SessionOptions,
    prompt_dir: Option<&Path>,
    output: Option<&Path>,
    format: OutputFormat,
) -> Result<String> {
    let raw = std::fs::read_to_string(plan_file).map_err(|e| {
        CommandError::InvalidPlan(format!("cannot read {}: {e}", plan_file.display()))
    })?;
    let plan: ResearchPlan = serde_json::from_str(&raw).map_err(|e| {
        CommandError::InvalidPlan(format!("{} is not a plan file: {e}", plan_file.display()))
    })?;
    plan.validate()
        .map_err(|e| CommandError::InvalidPlan(e.to_string()))?;

    let config = agent_config(options, prompt_dir)?;
    let session = ResearchSession::from_plan(plan, config.max_replan_rounds)
        .map_err(|e| CommandError::InvalidPlan(e.to_string()))?;
    let orchestrator = build_orchestrator(config, format)?;
    run_session(&orchestrator, session, output, format)
}

/// Runs a session and renders the report, or the partial state on failure.
fn run_session(
    orchestrator: &Orchestrator,
    mut session: ResearchSession,
    output: Option<&Path>,
    format: OutputFormat,
) -> Result<String> {
    let rt = runtime()?;
    let result = rt.block_on(orchestrator.run(&mut session));

    if let Err(e) = result {
        tracing::debug!(error = %e, "session failed");
        if let Some(path) = output {
            write_output(path, &format_partial(&session, format))?;
            tracing::info!(path = %path.display(), "partial progress written");
        }
        let (completed, total) = session.progress();
        return Err(CommandError::SessionFailed {
            message: session
                .failure()
                .unwrap_or(GENERIC_FAILURE_MESSAGE)
                .to_string(),
            completed,
            total,
        }
        .into());
    }

    let rendered = format_session(&session, format);
    match output {
        Some(path) => {
            write_output(path, &rendered)?;
            let (completed, total) = session.progress();
            Ok(format!(
                "Report written to: {} ({completed}/{total} steps completed)\n",
                path.display()
            ))
        }
        None => Ok(rendered),
    }
}

// ==================== Diagnostics ====================

fn cmd_search(source: &str, query: &str, format: OutputFormat) -> Result<String> {
    let gateway = ToolGateway::new(&GatewayConfig::from_env())?;
    let rt = runtime()?;
    let text = rt.block_on(gateway.query_source_by_name(source, query));
    Ok(format_search(source, query, &text, format))
}

fn cmd_init_prompts(dir: Option<&Path>, format: OutputFormat) -> Result<String> {
    let target_dir = dir
        .map(std::path::PathBuf::from)
        .or_else(PromptSet::default_dir)
        .ok_or_else(|| {
            CommandError::ExecutionFailed(
                "Could not determine home directory for default prompt path".to_string(),
            )
        })?;

    let written = PromptSet::write_defaults(&target_dir).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to write prompt templates: {e}"))
    })?;

    match format {
        OutputFormat::Text => {
            if written.is_empty() {
                return Ok(format!(
                    "All prompt templates already exist in: {}\n",
                    target_dir.display()
                ));
            }
            let mut output = format!(
                "Wrote {} prompt template(s) to: {}\n",
                written.len(),
                target_dir.display()
            );
            for path in &written {
                output.push_str("  ");
                output.push_str(
                    path.file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or("unknown"),
                );
                output.push('\n');
            }
            output.push_str("\nEdit these files to customize agent system prompts.\n");
            Ok(output)
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "directory": target_dir.to_string_lossy(),
                "written": written.iter().map(|p| p.to_string_lossy().into_owned()).collect::<Vec<_>>(),
                "count": written.len()
            });
            Ok(format.to_json(&json))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tempfile::TempDir;

    #[test]
    fn test_cmd_init_prompts() {
        let temp_dir = TempDir::new().unwrap_or_else(|_| unreachable!());
        let result = cmd_init_prompts(Some(temp_dir.path()), OutputFormat::Text);
        let text = result.unwrap_or_default();
        assert!(text.contains("Wrote 5 prompt template(s)"));
        assert!(temp_dir.path().join("planner.md").exists());

        let again = cmd_init_prompts(Some(temp_dir.path()), OutputFormat::Text);
        assert!(again.unwrap_or_default().contains("already exist"));
    }

    #[test]
    fn test_cmd_init_prompts_json() {
        let temp_dir = TempDir::new().unwrap_or_else(|_| unreachable!());
        let text =
            cmd_init_prompts(Some(temp_dir.path()), OutputFormat::Json).unwrap_or_default();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap_or_default();
        assert_eq!(json["count"], 5);
    }

    #[test]
    fn test_cmd_run_rejects_malformed_plan() {
        let temp_dir = TempDir::new().unwrap_or_else(|_| unreachable!());
        let path = temp_dir.path().join("plan.json");
        std::fs::write(&path, "not json").unwrap_or_else(|_| unreachable!());

        let result = cmd_run(
            &path,
            &SessionOptions::default(),
            None,
            None,
            OutputFormat::Text,
        );
        assert!(matches!(
            result,
            Err(Error::Command(CommandError::InvalidPlan(_)))
        ));
    }

    #[test]
    fn test_cmd_run_rejects_empty_plan() {
        let temp_dir = TempDir::new().unwrap_or_else(|_| unreachable!());
        let path = temp_dir.path().join("plan.json");
        std::fs::write(&path, r#"{"query": "France", "steps": ["  "]}"#)
            .unwrap_or_else(|_| unreachable!());

        let result = cmd_run(
            &path,
            &SessionOptions::default(),
            None,
            None,
            OutputFormat::Text,
        );
        assert!(matches!(
            result,
            Err(Error::Command(CommandError::InvalidPlan(_)))
        ));
    }

    #[test]
    fn test_cmd_research_rejects_blank_query() {
        let result = cmd_research(
            "  ",
            &SessionOptions::default(),
            None,
            None,
            OutputFormat::Text,
        );
        assert!(matches!(
            result,
            Err(Error::Command(CommandError::ExecutionFailed(_)))
        ));
    }

    #[test]
    fn test_cmd_search_unknown_source() {
        let text = cmd_search("bing", "rust", OutputFormat::Text).unwrap_or_default();
        assert_eq!(text, "[Gateway] Source 'bing' not supported.\n");
    }

    #[test]
    fn test_write_output_creates_parent() {
        let temp_dir = TempDir::new().unwrap_or_else(|_| unreachable!());
        let path = temp_dir.path().join("nested/report.md");
        assert!(write_output(&path, "report").is_ok());
        assert_eq!(std::fs::read_to_string(path).unwrap_or_default(), "report");
    }
}
