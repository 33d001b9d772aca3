//! LLM-driven research agents.
//!
//! Plans research steps, executes them through a function-calling round
//! against the search [`ToolGateway`](crate::gateway::ToolGateway), extends
//! the plan between batches, and writes the final report. Uses a pluggable
//! provider abstraction backed by OpenAI-compatible and Azure APIs.
//!
//! # Architecture
//!
//! ```text
//! User query → Orchestrator
//!   ├── PlannerAgent (numbered step list)
//!   ├── loop while steps are pending
//!   │   ├── JoinSet of batch_size StepExecutors
//!   │   │   └── completion → optional tool call → completion
//!   │   └── ReplannerAgent (append steps until the cap latches)
//!   └── WriterAgent (optionally EvaluatorAgent, retried) → report
//! ```

pub mod client;
pub mod config;
pub mod executor;
pub mod message;
pub mod observer;
pub mod orchestrator;
pub mod planner;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod tool;
pub mod traits;
pub mod writer;

// Re-export key types
pub use client::create_provider;
pub use config::AgentConfig;
pub use executor::StepExecutor;
pub use message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage, ToolChoice};
pub use observer::{NoopObserver, SessionEvent, SessionObserver};
pub use orchestrator::{GENERIC_FAILURE_MESSAGE, Orchestrator};
pub use planner::{PlannerAgent, ReplannerAgent};
pub use prompt::PromptSet;
pub use provider::LlmProvider;
pub use tool::{ToolCall, ToolDefinition, ToolResult, ToolSet};
pub use traits::{Agent, AgentResponse};
pub use writer::{EvaluatorAgent, WriterAgent, evaluate_and_retry};
