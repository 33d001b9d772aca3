//! Error types for deepquest.
//!
//! Each layer has its own error enum: [`AgentError`] for LLM-driven
//! planning, execution and synthesis, [`SearchError`] for the search
//! source transport, and [`CommandError`] for the CLI. [`Error`]
//! aggregates them for the crate-level [`Result`] alias.

use thiserror::Error;

/// Crate-level result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Agent, planning, or orchestration failure.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// Search source failure that escaped the gateway.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// CLI command failure.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Filesystem or stream I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the agent layer (LLM calls, planning, orchestration).
#[derive(Debug, Error)]
pub enum AgentError {
    /// No API key was configured.
    #[error(
        "API key not configured (set OPENAI_API_KEY, AZURE_OPENAI_API_KEY or DEEPQUEST_API_KEY)"
    )]
    ApiKeyMissing,

    /// Unknown LLM provider name.
    #[error("unsupported LLM provider: {name}")]
    UnsupportedProvider {
        /// The provider name that was requested.
        name: String,
    },

    /// A configuration value is out of range or inconsistent.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// What is wrong with the configuration.
        message: String,
    },

    /// The completion endpoint returned an error or could not be reached.
    #[error("API request failed: {message}")]
    ApiRequest {
        /// Provider error description.
        message: String,
        /// HTTP status, when the provider reported one.
        status: Option<u16>,
    },

    /// The model response could not be interpreted.
    #[error("failed to parse model response: {message}")]
    ResponseParse {
        /// What went wrong.
        message: String,
        /// The raw response content.
        content: String,
    },

    /// A tool call could not be dispatched.
    #[error("tool '{name}' failed: {message}")]
    ToolExecution {
        /// Tool name as requested by the model.
        name: String,
        /// Failure description.
        message: String,
    },

    /// A research step failed while executing.
    #[error("step '{step}' failed: {source}")]
    StepFailed {
        /// The step directive that failed.
        step: String,
        /// Underlying failure.
        #[source]
        source: Box<AgentError>,
    },

    /// Session state machine misuse or task failure.
    #[error("orchestration error: {message}")]
    Orchestration {
        /// Failure description.
        message: String,
    },
}

/// Errors raised by search source implementations.
///
/// These never reach the step executor: the gateway retries transient
/// failures and then folds the error into an `"... Error: ..."` result string.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The provider answered with a non-success status.
    #[error("{status} - {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response excerpt or reason phrase.
        message: String,
    },

    /// The request never completed (connect, timeout, TLS, body read).
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider payload did not have the expected shape.
    #[error("malformed response: {message}")]
    Malformed {
        /// Parse failure description.
        message: String,
    },

    /// A required API credential is not configured.
    #[error("missing credential: {name}")]
    MissingCredential {
        /// Environment variable that supplies the credential.
        name: &'static str,
    },
}

impl SearchError {
    /// Returns `true` for failures worth retrying: transport faults,
    /// rate limiting, and server-side errors.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            Self::Malformed { .. } | Self::MissingCredential { .. } => false,
        }
    }
}

/// Errors raised by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command could not run to completion.
    #[error("{0}")]
    ExecutionFailed(String),

    /// Output could not be rendered.
    #[error("output formatting failed: {0}")]
    OutputFormat(String),

    /// A plan file could not be read or is invalid.
    #[error("invalid plan file: {0}")]
    InvalidPlan(String),

    /// A research session halted after a fatal error.
    #[error("{message} ({completed}/{total} steps completed)")]
    SessionFailed {
        /// User-facing failure message.
        message: String,
        /// Steps completed before the halt.
        completed: usize,
        /// Steps in the plan at the time of the halt.
        total: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_transient_classification() {
        let server = SearchError::Http {
            status: 503,
            message: "unavailable".to_string(),
        };
        let throttled = SearchError::Http {
            status: 429,
            message: "slow down".to_string(),
        };
        let client = SearchError::Http {
            status: 404,
            message: "missing".to_string(),
        };
        assert!(server.is_transient());
        assert!(throttled.is_transient());
        assert!(!client.is_transient());
    }

    #[test]
    fn test_permanent_errors_not_transient() {
        assert!(!SearchError::MissingCredential { name: "NEWSAPI_KEY" }.is_transient());
        assert!(
            !SearchError::Malformed {
                message: "bad json".to_string()
            }
            .is_transient()
        );
    }

    #[test]
    fn test_step_failed_display_includes_cause() {
        let err = AgentError::StepFailed {
            step: "Find filings".to_string(),
            source: Box::new(AgentError::ApiRequest {
                message: "timeout".to_string(),
                status: None,
            }),
        };
        let text = err.to_string();
        assert!(text.contains("Find filings"));
        assert!(text.contains("timeout"));
    }

    #[test]
    fn test_session_failed_display() {
        let err = CommandError::SessionFailed {
            message: "Research session failed, try again shortly.".to_string(),
            completed: 2,
            total: 5,
        };
        assert!(err.to_string().ends_with("(2/5 steps completed)"));
    }
}
