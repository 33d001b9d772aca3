//! # deepquest
//!
//! Plan-execute-replan research assistant.
//!
//! Given a research query, deepquest asks an LLM for a numbered plan,
//! executes the steps in concurrent batches (each step is one
//! function-calling round against web search, `ArXiv`, `NewsAPI`, SEC and
//! Wikipedia), lets the model extend the plan between batches until a
//! replan cap latches, and finally writes a long-form report from the
//! accumulated context.
//!
//! ## Layout
//!
//! - [`core`]: session state, plan parsing and the replan merge law
//! - [`gateway`]: search sources behind a retrying [`gateway::ToolGateway`]
//! - [`agent`]: LLM providers, agents and the [`agent::Orchestrator`]
//! - [`cli`]: the `deepquest` command line
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use deepquest::agent::{AgentConfig, Orchestrator, create_provider};
//! use deepquest::gateway::{GatewayConfig, ToolGateway};
//!
//! # async fn run() -> deepquest::Result<()> {
//! let config = AgentConfig::from_env()?;
//! let provider = create_provider(&config)?;
//! let gateway = ToolGateway::new(&GatewayConfig::from_env())?;
//! let orchestrator = Orchestrator::new(Arc::from(provider), Arc::new(gateway), config);
//!
//! let session = orchestrator.research("What is the capital of France?").await?;
//! if let Some(report) = session.report() {
//!     tracing::info!(len = report.len(), "report ready");
//! }
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod error;
pub mod gateway;

pub use error::{AgentError, CommandError, Error, Result, SearchError};
