//! Tool type definitions for function-calling.
//!
//! Provides provider-agnostic types for tool definitions, calls, and results.
//! The step executor offers one search tool per [`Source`]; each takes a
//! single required `query` string.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::gateway::Source;

/// A tool definition that can be sent to an LLM for function-calling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (must match dispatch table in executor).
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// JSON Schema object describing the tool's parameters.
    pub parameters: serde_json::Value,
}

/// A tool call requested by the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this call (assigned by the provider).
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// JSON-encoded arguments for the tool.
    pub arguments: String,
}

/// The result of executing a tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// ID of the tool call this result corresponds to.
    pub tool_call_id: String,
    /// Result content (search entries on success, a bracketed notice otherwise).
    pub content: String,
    /// Whether this result represents an error.
    pub is_error: bool,
}

/// Arguments shared by every search tool.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchArgs {
    /// The search query.
    pub query: String,
}

/// A set of tool definitions scoped to an agent role.
///
/// The step executor gets [`ToolSet::research_tools`]; the planner, replanner
/// and writer run without tools.
#[derive(Debug, Clone, Default)]
pub struct ToolSet {
    definitions: Vec<ToolDefinition>,
}

impl ToolSet {
    /// Returns the tool definitions in this set.
    #[must_use]
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Returns `true` if this set contains no tools.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Returns the number of tools in this set.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.definitions.len()
    }

    /// One search tool per source, in menu order.
    #[must_use]
    pub fn research_tools() -> Self {
        Self::for_sources(&Source::ALL)
    }

    fn for_sources(sources: &[Source]) -> Self {
        Self {
            definitions: sources.iter().copied().map(def_search).collect(),
        }
    }

    /// Empty tool set (no tools available).
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }
}

/// Defines the search tool for `source`.
fn def_search(source: Source) -> ToolDefinition {
    ToolDefinition {
        name: source.tool_name().to_string(),
        description: source.tool_description().to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": format!("The search query for {}.", source.display_name())
                }
            },
            "required": ["query"],
            "additionalProperties": false
        }),
    }
}
