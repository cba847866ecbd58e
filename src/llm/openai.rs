//! OpenAI-compatible `/chat/completions` client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{
    CompletionRequest, CompletionResponse, Entry, LlmClient, LlmError, Role, TokenUsage, ToolCall,
};
use crate::config::ModelConfig;

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    /// Build the main-model client from config; fails without an API key.
    pub fn from_config(config: &ModelConfig) -> Result<Self, LlmError> {
        Self::for_model(config, &config.model)
    }

    /// Same endpoint and credentials, different model (e.g. the summary model).
    pub fn for_model(config: &ModelConfig, model: &str) -> Result<Self, LlmError> {
        let api_key = config.api_key.clone().ok_or(LlmError::MissingApiKey)?;
        Ok(Self::new(api_key, model).with_base_url(&config.base_url))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, PartialEq)]
struct WireMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    kind: String,
    function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct WireFunctionCall {
    name: String,
    arguments: String,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction<'a>,
}

#[derive(Serialize)]
struct WireFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a serde_json::Value,
}

#[derive(Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
}

#[derive(Deserialize)]
struct WireResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<WireToolCall>>,
    reasoning_content: Option<String>,
}

#[derive(Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// Map the flat entry sequence onto chat messages.
///
/// Consecutive function calls (and the assistant text right before them)
/// collapse into one assistant message so every `tool` message follows the
/// assistant turn that requested it.
fn to_wire_messages(entries: &[Entry]) -> Vec<WireMessage> {
    let mut messages: Vec<WireMessage> = Vec::with_capacity(entries.len());
    let mut assistant_open = false;

    for entry in entries {
        match entry {
            Entry::Message { role, content } => {
                let role = match role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                };
                messages.push(WireMessage {
                    role,
                    content: Some(content.clone()),
                    tool_call_id: None,
                    tool_calls: None,
                });
                assistant_open = role == "assistant";
            }
            Entry::FunctionCall {
                call_id,
                name,
                arguments,
            } => {
                let call = WireToolCall {
                    id: call_id.clone(),
                    kind: function_type(),
                    function: WireFunctionCall {
                        name: name.clone(),
                        arguments: arguments.clone(),
                    },
                };
                match messages.last_mut() {
                    Some(last) if assistant_open => {
                        last.tool_calls.get_or_insert_with(Vec::new).push(call);
                    }
                    _ => messages.push(WireMessage {
                        role: "assistant",
                        content: None,
                        tool_call_id: None,
                        tool_calls: Some(vec![call]),
                    }),
                }
                assistant_open = true;
            }
            Entry::FunctionCallOutput { call_id, output } => {
                messages.push(WireMessage {
                    role: "tool",
                    content: Some(output.clone()),
                    tool_call_id: Some(call_id.clone()),
                    tool_calls: None,
                });
                assistant_open = false;
            }
        }
    }

    messages
}

#[async_trait]
impl LlmClient for OpenAiClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let tools = (!request.tools.is_empty()).then(|| {
            request
                .tools
                .iter()
                .map(|t| WireTool {
                    kind: "function",
                    function: WireFunction {
                        name: &t.name,
                        description: &t.description,
                        parameters: &t.parameters,
                    },
                })
                .collect()
        });

        let body = WireRequest {
            model: &self.model,
            messages: to_wire_messages(&request.messages),
            tools,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let data: WireResponse = response.json().await?;
        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("response has no choices".to_string()))?;

        tracing::info!(
            model = %self.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "model call completed"
        );

        Ok(CompletionResponse {
            text: choice.message.content,
            tool_calls: choice
                .message
                .tool_calls
                .unwrap_or_default()
                .into_iter()
                .map(|tc| ToolCall {
                    id: tc.id,
                    name: tc.function.name,
                    arguments: tc.function.arguments,
                })
                .collect(),
            reasoning: choice.message.reasoning_content.into_iter().collect(),
            usage: data.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        })
    }
}
