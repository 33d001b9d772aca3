//! `OpenAI` provider implementation using the `async-openai` crate.
//!
//! Supports any `OpenAI`-compatible API via the base URL override in
//! [`AgentConfig`], and Azure `OpenAI` deployments via [`AzureConfig`].
//! Azure routes by deployment rather than by the request's model field, so
//! the Azure provider keeps one client per configured deployment.

use async_openai::Client;
use async_openai::config::{AzureConfig, Config, OpenAIConfig};
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessage,
    ChatCompletionRequestAssistantMessageContent, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessage, ChatCompletionRequestSystemMessageContent,
    ChatCompletionRequestToolMessage, ChatCompletionRequestToolMessageContent,
    ChatCompletionRequestUserMessage, ChatCompletionRequestUserMessageContent, ChatCompletionTool,
    ChatCompletionToolChoiceOption, ChatCompletionToolType, CreateChatCompletionRequest,
    FunctionCall, FunctionObject,
};
use async_trait::async_trait;

use crate::agent::config::AgentConfig;
use crate::agent::message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage, ToolChoice};
use crate::agent::provider::LlmProvider;
use crate::agent::tool::ToolCall;
use crate::error::AgentError;

/// `OpenAI`-compatible LLM provider.
///
/// Wraps `async-openai` clients for chat completions. `C` is
/// [`OpenAIConfig`] for `OpenAI` and compatible APIs, or [`AzureConfig`]
/// for Azure deployments.
pub struct OpenAiProvider<C: Config = OpenAIConfig> {
    name: &'static str,
    /// `(model or deployment, client)`; the first entry is the fallback.
    clients: Vec<(String, Client<C>)>,
}

impl OpenAiProvider<OpenAIConfig> {
    /// Creates an `OpenAI` provider from agent configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfig`] if the HTTP client cannot be built.
    pub fn new(config: &AgentConfig) -> Result<Self, AgentError> {
        let mut openai_config = OpenAIConfig::new().with_api_key(&config.api_key);

        if let Some(ref base_url) = config.base_url {
            openai_config = openai_config.with_api_base(base_url);
        }

        let client = Client::with_config(openai_config).with_http_client(http_client(config)?);
        Ok(Self {
            name: "openai",
            clients: vec![(config.planner_model.clone(), client)],
        })
    }
}

impl OpenAiProvider<AzureConfig> {
    /// Creates an Azure `OpenAI` provider from agent configuration.
    ///
    /// The planner, executor and writer models are treated as deployment
    /// names; one client is created per distinct deployment.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfig`] if no endpoint is configured or
    /// the HTTP client cannot be built.
    pub fn azure(config: &AgentConfig) -> Result<Self, AgentError> {
        let endpoint = config
            .base_url
            .as_deref()
            .ok_or_else(|| AgentError::InvalidConfig {
                message: "Azure provider requires AZURE_OPENAI_ENDPOINT".to_string(),
            })?;
        let http = http_client(config)?;

        let mut clients: Vec<(String, Client<AzureConfig>)> = Vec::new();
        for deployment in [
            &config.planner_model,
            &config.executor_model,
            &config.writer_model,
        ] {
            if clients.iter().any(|(name, _)| name == deployment) {
                continue;
            }
            let azure_config = AzureConfig::new()
                .with_api_base(endpoint)
                .with_api_key(&config.api_key)
                .with_api_version(&config.api_version)
                .with_deployment_id(deployment);
            clients.push((
                deployment.clone(),
                Client::with_config(azure_config).with_http_client(http.clone()),
            ));
        }

        Ok(Self {
            name: "azure",
            clients,
        })
    }
}

impl<C: Config> OpenAiProvider<C> {
    fn client_for(&self, model: &str) -> Result<&Client<C>, AgentError> {
        self.clients
            .iter()
            .find(|(name, _)| name == model)
            .or_else(|| self.clients.first())
            .map(|(_, client)| client)
            .ok_or_else(|| AgentError::InvalidConfig {
                message: "no completion client configured".to_string(),
            })
    }
}

fn http_client(config: &AgentConfig) -> Result<reqwest::Client, AgentError> {
    reqwest::Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|e| AgentError::InvalidConfig {
            message: format!("HTTP client: {e}"),
        })
}

/// Converts our message type to the `OpenAI` SDK type.
fn convert_message(msg: &ChatMessage) -> ChatCompletionRequestMessage {
    match msg.role {
        Role::System => ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
            content: ChatCompletionRequestSystemMessageContent::Text(msg.content.clone()),
            name: None,
        }),
        Role::User => ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
            content: ChatCompletionRequestUserMessageContent::Text(msg.content.clone()),
            name: None,
        }),
        Role::Assistant => {
            let tool_calls = if msg.tool_calls.is_empty() {
                None
            } else {
                Some(
                    msg.tool_calls
                        .iter()
                        .map(|tc| ChatCompletionMessageToolCall {
                            id: tc.id.clone(),
                            r#type: ChatCompletionToolType::Function,
                            function: FunctionCall {
                                name: tc.name.clone(),
                                arguments: tc.arguments.clone(),
                            },
                        })
                        .collect(),
                )
            };

            let content = if msg.content.is_empty() {
                None
            } else {
                Some(ChatCompletionRequestAssistantMessageContent::Text(
                    msg.content.clone(),
                ))
            };

            #[allow(deprecated)]
            ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                content,
                name: None,
                tool_calls,
                refusal: None,
                audio: None,
                function_call: None,
            })
        }
        Role::Tool => ChatCompletionRequestMessage::Tool(ChatCompletionRequestToolMessage {
            content: ChatCompletionRequestToolMessageContent::Text(msg.content.clone()),
            tool_call_id: msg.tool_call_id.clone().unwrap_or_default(),
        }),
    }
}

/// Builds an `OpenAI` chat completion request from our generic request.
///
/// When tools are offered, parallel tool calls are disabled: the step
/// executor honours a single call per step.
fn build_request(request: &ChatRequest) -> CreateChatCompletionRequest {
    let messages: Vec<_> = request.messages.iter().map(convert_message).collect();

    let tools = if request.tools.is_empty() {
        None
    } else {
        Some(
            request
                .tools
                .iter()
                .map(|td| ChatCompletionTool {
                    r#type: ChatCompletionToolType::Function,
                    function: FunctionObject {
                        name: td.name.clone(),
                        description: Some(td.description.clone()),
                        parameters: Some(td.parameters.clone()),
                        strict: None,
                    },
                })
                .collect::<Vec<_>>(),
        )
    };

    let has_tools = tools.is_some();
    let tool_choice = if has_tools {
        request.tool_choice.map(|choice| match choice {
            ToolChoice::Auto => ChatCompletionToolChoiceOption::Auto,
            ToolChoice::None => ChatCompletionToolChoiceOption::None,
        })
    } else {
        None
    };

    CreateChatCompletionRequest {
        model: request.model.clone(),
        messages,
        temperature: request.temperature,
        max_completion_tokens: request.max_tokens,
        tools,
        tool_choice,
        parallel_tool_calls: has_tools.then_some(false),
        ..Default::default()
    }
}

impl<C: Config> std::fmt::Debug for OpenAiProvider<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let models: Vec<&str> = self.clients.iter().map(|(m, _)| m.as_str()).collect();
        f.debug_struct("OpenAiProvider")
            .field("name", &self.name)
            .field("models", &models)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<C: Config + Send + Sync> LlmProvider for OpenAiProvider<C> {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
        let openai_request = build_request(request);

        let response = self
            .client_for(&request.model)?
            .chat()
            .create(openai_request)
            .await
            .map_err(|e| AgentError::ApiRequest {
                message: e.to_string(),
                status: None,
            })?;

        let choice = response.choices.first();

        let content = choice
            .and_then(|c| c.message.content.as_ref())
            .cloned()
            .unwrap_or_default();

        let tool_calls = choice
            .and_then(|c| c.message.tool_calls.as_ref())
            .map(|tcs| {
                tcs.iter()
                    .map(|tc| ToolCall {
                        id: tc.id.clone(),
                        name: tc.function.name.clone(),
                        arguments: tc.function.arguments.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let finish_reason = choice.and_then(|c| {
            c.finish_reason
                .as_ref()
                .map(|fr| format!("{fr:?}").to_lowercase())
        });

        let usage = response
            .usage
            .map_or_else(TokenUsage::default, |u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            });

        Ok(ChatResponse {
            content,
            model: response.model,
            usage,
            tool_calls,
            finish_reason,
        })
    }
}
