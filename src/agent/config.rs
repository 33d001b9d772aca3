//! Agent configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::AgentError;

/// Default model (or Azure deployment name) for every role.
pub const DEFAULT_MODEL: &str = "gpt-4.1";
/// Default Azure OpenAI API version.
pub const DEFAULT_API_VERSION: &str = "2025-03-01-preview";
/// Default ceiling on planned steps.
pub const DEFAULT_MAX_STEPS: usize = 20;
/// Default number of steps executed concurrently.
pub const DEFAULT_BATCH_SIZE: usize = 3;
/// Default productive replan rounds before the cap latches.
pub const DEFAULT_MAX_REPLAN_ROUNDS: usize = 3;
/// Default report generations in the evaluation loop.
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;
/// Default planner/replanner max tokens.
const DEFAULT_PLANNER_MAX_TOKENS: u32 = 2048;
/// Default step executor max tokens.
const DEFAULT_EXECUTOR_MAX_TOKENS: u32 = 4096;
/// Default writer max tokens. Reports are long-form.
const DEFAULT_WRITER_MAX_TOKENS: u32 = 16384;
/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for the agent system.
#[derive(Clone)]
pub struct AgentConfig {
    /// LLM provider name (`"openai"` or `"azure"`).
    pub provider: String,
    /// API key for the provider.
    pub api_key: String,
    /// Base URL override (`OpenAI`-compatible proxies) or the Azure endpoint.
    pub base_url: Option<String>,
    /// Azure OpenAI API version.
    pub api_version: String,
    /// Model for the planner and replanner (the Azure deployment name for `azure`).
    pub planner_model: String,
    /// Model for step execution.
    pub executor_model: String,
    /// Model for the report writer and evaluator.
    pub writer_model: String,
    /// Ceiling on the total number of planned steps.
    pub max_steps: usize,
    /// Steps executed concurrently per batch.
    pub batch_size: usize,
    /// Productive replan rounds before replanning stops.
    pub max_replan_rounds: usize,
    /// Report generations when evaluation is enabled.
    pub max_attempts: usize,
    /// Whether the report goes through the evaluate-and-retry loop.
    pub evaluate_report: bool,
    /// Maximum tokens for planner and replanner responses.
    pub planner_max_tokens: u32,
    /// Maximum tokens for step executor responses.
    pub executor_max_tokens: u32,
    /// Maximum tokens for the report.
    pub writer_max_tokens: u32,
    /// Request timeout.
    pub timeout: Duration,
    /// Directory containing prompt template files.
    ///
    /// When set, system prompts are loaded from markdown files in this
    /// directory, falling back to compiled-in defaults for any missing files.
    pub prompt_dir: Option<PathBuf>,
}

impl AgentConfig {
    /// Creates a new builder for `AgentConfig`.
    #[must_use]
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key is found.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::builder().from_env().build()
    }
}

impl std::fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentConfig")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("planner_model", &self.planner_model)
            .field("executor_model", &self.executor_model)
            .field("writer_model", &self.writer_model)
            .field("max_steps", &self.max_steps)
            .field("batch_size", &self.batch_size)
            .field("max_replan_rounds", &self.max_replan_rounds)
            .field("max_attempts", &self.max_attempts)
            .field("evaluate_report", &self.evaluate_report)
            .field("timeout", &self.timeout)
            .field("prompt_dir", &self.prompt_dir)
            .finish_non_exhaustive()
    }
}

/// Builder for [`AgentConfig`].
#[derive(Debug, Clone, Default)]
pub struct AgentConfigBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    api_version: Option<String>,
    planner_model: Option<String>,
    executor_model: Option<String>,
    writer_model: Option<String>,
    max_steps: Option<usize>,
    batch_size: Option<usize>,
    max_replan_rounds: Option<usize>,
    max_attempts: Option<usize>,
    evaluate_report: Option<bool>,
    planner_max_tokens: Option<u32>,
    executor_max_tokens: Option<u32>,
    writer_max_tokens: Option<u32>,
    timeout: Option<Duration>,
    prompt_dir: Option<PathBuf>,
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl AgentConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.provider.is_none() {
            self.provider = std::env::var("DEEPQUEST_PROVIDER").ok();
        }
        let azure = self.provider.as_deref() == Some("azure");
        if self.api_key.is_none() {
            let primary = if azure {
                "AZURE_OPENAI_API_KEY"
            } else {
                "OPENAI_API_KEY"
            };
            self.api_key = std::env::var(primary)
                .or_else(|_| std::env::var("DEEPQUEST_API_KEY"))
                .ok();
        }
        if self.base_url.is_none() {
            let primary = if azure {
                "AZURE_OPENAI_ENDPOINT"
            } else {
                "OPENAI_BASE_URL"
            };
            self.base_url = std::env::var(primary)
                .or_else(|_| std::env::var("DEEPQUEST_BASE_URL"))
                .ok();
        }
        if self.api_version.is_none() {
            self.api_version = std::env::var("DEEPQUEST_API_VERSION").ok();
        }
        if self.planner_model.is_none() {
            self.planner_model = std::env::var("DEEPQUEST_MODEL").ok();
        }
        if self.executor_model.is_none() {
            self.executor_model = std::env::var("DEEPQUEST_EXECUTOR_MODEL").ok();
        }
        if self.writer_model.is_none() {
            self.writer_model = std::env::var("DEEPQUEST_WRITER_MODEL").ok();
        }
        if self.max_steps.is_none() {
            self.max_steps = env_parse("DEEPQUEST_MAX_STEPS");
        }
        if self.batch_size.is_none() {
            self.batch_size = env_parse("DEEPQUEST_BATCH_SIZE");
        }
        if self.max_replan_rounds.is_none() {
            self.max_replan_rounds = env_parse("DEEPQUEST_MAX_REPLAN_ROUNDS");
        }
        if self.max_attempts.is_none() {
            self.max_attempts = env_parse("DEEPQUEST_MAX_ATTEMPTS");
        }
        if self.prompt_dir.is_none() {
            self.prompt_dir = std::env::var("DEEPQUEST_PROMPT_DIR")
                .ok()
                .map(PathBuf::from);
        }
        self
    }

    /// Sets the LLM provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL override (or Azure endpoint).
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the Azure API version.
    #[must_use]
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Sets the planner and replanner model.
    #[must_use]
    pub fn planner_model(mut self, model: impl Into<String>) -> Self {
        self.planner_model = Some(model.into());
        self
    }

    /// Sets the step executor model.
    #[must_use]
    pub fn executor_model(mut self, model: impl Into<String>) -> Self {
        self.executor_model = Some(model.into());
        self
    }

    /// Sets the writer model.
    #[must_use]
    pub fn writer_model(mut self, model: impl Into<String>) -> Self {
        self.writer_model = Some(model.into());
        self
    }

    /// Sets the step ceiling.
    #[must_use]
    pub const fn max_steps(mut self, n: usize) -> Self {
        self.max_steps = Some(n);
        self
    }

    /// Sets the batch size.
    #[must_use]
    pub const fn batch_size(mut self, n: usize) -> Self {
        self.batch_size = Some(n);
        self
    }

    /// Sets the replan round cap.
    #[must_use]
    pub const fn max_replan_rounds(mut self, n: usize) -> Self {
        self.max_replan_rounds = Some(n);
        self
    }

    /// Sets the report attempt limit.
    #[must_use]
    pub const fn max_attempts(mut self, n: usize) -> Self {
        self.max_attempts = Some(n);
        self
    }

    /// Enables or disables report evaluation.
    #[must_use]
    pub const fn evaluate_report(mut self, enabled: bool) -> Self {
        self.evaluate_report = Some(enabled);
        self
    }

    /// Sets the writer max tokens.
    #[must_use]
    pub const fn writer_max_tokens(mut self, n: u32) -> Self {
        self.writer_max_tokens = Some(n);
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Sets the prompt template directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Builds the [`AgentConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key was set, or
    /// [`AgentError::InvalidConfig`] if a count is zero.
    pub fn build(self) -> Result<AgentConfig, AgentError> {
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(AgentError::ApiKeyMissing)?;

        let planner_model = self
            .planner_model
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let config = AgentConfig {
            provider: self.provider.unwrap_or_else(|| "openai".to_string()),
            api_key,
            base_url: self.base_url,
            api_version: self
                .api_version
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            executor_model: self
                .executor_model
                .unwrap_or_else(|| planner_model.clone()),
            writer_model: self
                .writer_model
                .unwrap_or_else(|| planner_model.clone()),
            planner_model,
            max_steps: self.max_steps.unwrap_or(DEFAULT_MAX_STEPS),
            batch_size: self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE),
            max_replan_rounds: self
                .max_replan_rounds
                .unwrap_or(DEFAULT_MAX_REPLAN_ROUNDS),
            max_attempts: self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
            evaluate_report: self.evaluate_report.unwrap_or(false),
            planner_max_tokens: self
                .planner_max_tokens
                .unwrap_or(DEFAULT_PLANNER_MAX_TOKENS),
            executor_max_tokens: self
                .executor_max_tokens
                .unwrap_or(DEFAULT_EXECUTOR_MAX_TOKENS),
            writer_max_tokens: self
                .writer_max_tokens
                .unwrap_or(DEFAULT_WRITER_MAX_TOKENS),
            timeout: self
                .timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            prompt_dir: self.prompt_dir,
        };

        for (name, value) in [
            ("max_steps", config.max_steps),
            ("batch_size", config.batch_size),
            ("max_attempts", config.max_attempts),
        ] {
            if value == 0 {
                return Err(AgentError::InvalidConfig {
                    message: format!("{name} must be at least 1"),
                });
            }
        }

        Ok(config)
    }
}
