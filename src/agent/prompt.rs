//! System prompts and template builders for agents.
//!
//! System prompts fix each agent's role. Template builders format the user
//! message for one call from the query, the step list, or the accumulated
//! research context.

use std::fmt::Write;
use std::path::Path;

/// System prompt for the planner agent.
pub const PLANNER_SYSTEM_PROMPT: &str = "You are a research planning assistant.";

/// System prompt for the replanner agent.
pub const REPLANNER_SYSTEM_PROMPT: &str = "You are a research planning assistant.";

/// System prompt for the step executor.
pub const EXECUTOR_SYSTEM_PROMPT: &str = "You are a helpful research assistant.";

/// System prompt for the report writer.
pub const WRITER_SYSTEM_PROMPT: &str = "You are a research report writing assistant.";

/// System prompt for the report evaluator.
pub const EVALUATOR_SYSTEM_PROMPT: &str = "You are a critical research report evaluator.";

/// Default prompt directory under user config.
const DEFAULT_PROMPT_DIR: &str = ".config/deepquest/prompts";

/// Environment variable overriding the prompt directory.
pub const PROMPT_DIR_ENV: &str = "DEEPQUEST_PROMPT_DIR";

const PLANNER_FILENAME: &str = "planner.md";
const REPLANNER_FILENAME: &str = "replanner.md";
const EXECUTOR_FILENAME: &str = "executor.md";
const WRITER_FILENAME: &str = "writer.md";
const EVALUATOR_FILENAME: &str = "evaluator.md";

/// A set of system prompts for all agents.
///
/// Loaded from external template files when available, falling back to
/// compiled-in defaults. Use [`PromptSet::load`] to resolve the prompt
/// directory from CLI flags, environment variables, or the default path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    /// System prompt for the planner.
    pub planner: String,
    /// System prompt for the replanner.
    pub replanner: String,
    /// System prompt for the step executor.
    pub executor: String,
    /// System prompt for the report writer.
    pub writer: String,
    /// System prompt for the report evaluator.
    pub evaluator: String,
}

impl PromptSet {
    /// Loads prompts from the given directory, falling back to compiled-in defaults.
    ///
    /// Resolution order for `prompt_dir`:
    /// 1. Explicit `prompt_dir` argument (from `--prompt-dir` CLI flag)
    /// 2. `DEEPQUEST_PROMPT_DIR` environment variable
    /// 3. `~/.config/deepquest/prompts/`
    ///
    /// Each file is loaded independently; a missing or blank file uses its default.
    #[must_use]
    pub fn load(prompt_dir: Option<&Path>) -> Self {
        let resolved_dir = prompt_dir
            .map(std::path::PathBuf::from)
            .or_else(|| std::env::var(PROMPT_DIR_ENV).ok().map(std::path::PathBuf::from))
            .or_else(Self::default_dir);

        let load_file = |filename: &str, default: &str| -> String {
            resolved_dir
                .as_ref()
                .map(|dir| dir.join(filename))
                .and_then(|path| std::fs::read_to_string(&path).ok())
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            planner: load_file(PLANNER_FILENAME, PLANNER_SYSTEM_PROMPT),
            replanner: load_file(REPLANNER_FILENAME, REPLANNER_SYSTEM_PROMPT),
            executor: load_file(EXECUTOR_FILENAME, EXECUTOR_SYSTEM_PROMPT),
            writer: load_file(WRITER_FILENAME, WRITER_SYSTEM_PROMPT),
            evaluator: load_file(EVALUATOR_FILENAME, EVALUATOR_SYSTEM_PROMPT),
        }
    }

    /// Returns compiled-in defaults without checking the filesystem.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            planner: PLANNER_SYSTEM_PROMPT.to_string(),
            replanner: REPLANNER_SYSTEM_PROMPT.to_string(),
            executor: EXECUTOR_SYSTEM_PROMPT.to_string(),
            writer: WRITER_SYSTEM_PROMPT.to_string(),
            evaluator: EVALUATOR_SYSTEM_PROMPT.to_string(),
        }
    }

    /// Writes the compiled-in default prompts to the given directory.
    ///
    /// Creates the directory if it does not exist. Existing files are
    /// **not** overwritten; use this for initial scaffolding only.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if directory creation or file writing fails.
    pub fn write_defaults(dir: &Path) -> std::io::Result<Vec<std::path::PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let templates = [
            (PLANNER_FILENAME, PLANNER_SYSTEM_PROMPT),
            (REPLANNER_FILENAME, REPLANNER_SYSTEM_PROMPT),
            (EXECUTOR_FILENAME, EXECUTOR_SYSTEM_PROMPT),
            (WRITER_FILENAME, WRITER_SYSTEM_PROMPT),
            (EVALUATOR_FILENAME, EVALUATOR_SYSTEM_PROMPT),
        ];

        let mut written = Vec::new();
        for (filename, content) in &templates {
            let path = dir.join(filename);
            if !path.exists() {
                std::fs::write(&path, content)?;
                written.push(path);
            }
        }

        Ok(written)
    }

    /// Returns the default prompt directory under the user's home.
    ///
    /// Returns `None` if the home directory cannot be determined.
    #[must_use]
    pub fn default_dir() -> Option<std::path::PathBuf> {
        dirs::home_dir().map(|h| h.join(DEFAULT_PROMPT_DIR))
    }
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Builds the planner's user message.
#[must_use]
pub fn build_planner_prompt(query: &str, max_steps: usize) -> String {
    format!(
        "You are an expert research agent. Given the following user query, create a clear, \
         step-by-step research plan. Each step should be actionable and focused on gathering \
         or synthesizing information needed to answer the query. Do not add unnecessary steps. \
         Return the plan as a numbered list. Do not exceed {max_steps} steps in your plan.\n\n\
         User Query: {query}"
    )
}

/// Builds the replanner's user message.
///
/// The current step list is included so the model can avoid repeating it;
/// the merge still drops duplicates on its own.
#[must_use]
pub fn build_replanner_prompt(context: &str, steps: &[String], max_steps: usize) -> String {
    let mut plan = String::new();
    for (i, step) in steps.iter().enumerate() {
        let _ = writeln!(plan, "{}. {step}", i + 1);
    }

    format!(
        "Given the completed steps and results so far:\n{context}\n\n\
         Current plan:\n{plan}\n\
         As an autonomous agent, do you need to add any new steps to fully answer the original \
         query? If yes, list them as a numbered list, but do not exceed a total of {max_steps} \
         steps in the plan (count including already completed and planned steps). \
         If not, reply 'No additional steps needed.' \
         Do not return already present steps in the new plan."
    )
}

/// Builds the step executor's user message.
#[must_use]
pub fn build_executor_prompt(step: &str, context: &str) -> String {
    format!(
        "Please answer the following research question using the available tools and online \
         sources as needed.\n\n\
         Research Question: {step}\n\n\
         Context: {context}"
    )
}

/// Builds the report writer's user message.
#[must_use]
pub fn build_writer_prompt(context: &str) -> String {
    format!(
        "Given the following completed research steps and their results:\n{context}\n\n\
         As an autonomous research agent, write a highly detailed, exhaustive, and \
         well-structured research report that answers the original query. \
         Include attribution to all sources referenced or used in any step. \
         Ensure that every piece of information, even if only slightly related to the research \
         topic, is included and clearly explained. Organize the report with clear sections, \
         provide in-depth analysis, and cite all sources explicitly. \
         Include a bibliography or references section at the end listing all sources. \
         Also state the total number of resources used in the report, including web pages, \
         papers, and articles."
    )
}

/// Builds the evaluator's user message for one generated report.
#[must_use]
pub fn build_evaluator_prompt(target: &str, report: &str) -> String {
    format!(
        "Research Target: {target}\n\n\
         Generated Report:\n{report}\n\n\
         As an evaluation agent, assess if the report fully and satisfactorily meets the \
         research target. Reply with 'YES' if it does, or 'NO' if it does not. \
         If 'NO', briefly state what is missing or could be improved."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_planner_prompt() {
        let prompt = build_planner_prompt("What is the capital of France?", 5);
        assert!(prompt.contains("User Query: What is the capital of France?"));
        assert!(prompt.contains("Do not exceed 5 steps"));
        assert!(prompt.contains("numbered list"));
    }

    #[test]
    fn test_build_replanner_prompt() {
        let steps = vec!["Search Wikipedia".to_string(), "Check news".to_string()];
        let prompt = build_replanner_prompt("\nStep: a\nResult: b\n", &steps, 20);
        assert!(prompt.contains("Step: a\nResult: b"));
        assert!(prompt.contains("1. Search Wikipedia\n2. Check news\n"));
        assert!(prompt.contains("total of 20 steps"));
        assert!(prompt.contains("No additional steps needed."));
    }

    #[test]
    fn test_build_executor_prompt() {
        let prompt = build_executor_prompt("Find the capital", "");
        assert!(prompt.contains("Research Question: Find the capital"));
        assert!(prompt.ends_with("Context: "));
    }

    #[test]
    fn test_build_writer_prompt() {
        let prompt = build_writer_prompt("ctx");
        assert!(prompt.contains("ctx"));
        assert!(prompt.contains("references section"));
        assert!(prompt.contains("total number of resources"));
    }

    #[test]
    fn test_build_evaluator_prompt() {
        let prompt = build_evaluator_prompt("France", "Paris is the capital.");
        assert!(prompt.starts_with("Research Target: France"));
        assert!(prompt.contains("Generated Report:\nParis is the capital."));
        assert!(prompt.contains("'YES'"));
    }

    #[test]
    fn test_load_falls_back_per_file() {
        let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
        std::fs::write(dir.path().join("writer.md"), "Custom writer.")
            .unwrap_or_else(|_| unreachable!());
        std::fs::write(dir.path().join("planner.md"), "  \n").unwrap_or_else(|_| unreachable!());

        let prompts = PromptSet::load(Some(dir.path()));
        assert_eq!(prompts.writer, "Custom writer.");
        assert_eq!(prompts.planner, PLANNER_SYSTEM_PROMPT);
        assert_eq!(prompts.evaluator, EVALUATOR_SYSTEM_PROMPT);
    }

    #[test]
    fn test_write_defaults_keeps_existing() {
        let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
        std::fs::write(dir.path().join("executor.md"), "mine").unwrap_or_else(|_| unreachable!());

        let written = PromptSet::write_defaults(dir.path()).unwrap_or_default();
        assert_eq!(written.len(), 4);
        let kept = std::fs::read_to_string(dir.path().join("executor.md")).unwrap_or_default();
        assert_eq!(kept, "mine");
        assert_eq!(PromptSet::load(Some(dir.path())).planner, PLANNER_SYSTEM_PROMPT);
    }
}
