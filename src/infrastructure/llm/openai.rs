// OpenAI chat-completions adapter
//
// Also works with OpenAI-compatible servers (vLLM, LM Studio, ...).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::agents::executor::{CompletionProvider, CompletionRequest};
use crate::agents::messages::MessageRole;
use crate::errors::{OrchestrationError, OrchestrationResult};

pub struct OpenAiProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    default_model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatRequestMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequestMessage<'a> {
    role: MessageRole,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl OpenAiProvider {
    pub fn new(endpoint: String, api_key: String, default_model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            default_model,
        }
    }

    fn body<'a>(&'a self, request: &'a CompletionRequest) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        messages.push(ChatRequestMessage {
            role: MessageRole::System,
            content: &request.system,
        });
        messages.extend(request.messages.iter().map(|m| ChatRequestMessage {
            role: m.role,
            content: &m.content,
        }));

        ChatRequest {
            model: request
                .options
                .model
                .as_deref()
                .unwrap_or(self.default_model.as_str()),
            messages,
            temperature: request.options.temperature,
            max_tokens: request.options.max_tokens,
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, request: &CompletionRequest) -> OrchestrationResult<String> {
        let url = format!("{}/chat/completions", self.endpoint.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.body(request))
            .send()
            .await
            .map_err(|e| OrchestrationError::Completion(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(OrchestrationError::Completion(match status.as_u16() {
                401 | 403 => format!("authentication rejected: {}", error_text),
                429 => "rate limited".to_string(),
                _ => format!("HTTP {}: {}", status, error_text),
            }));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| OrchestrationError::Completion(format!("Failed to parse response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| OrchestrationError::Completion("No response from model".to_string()))
    }

    fn provider_name(&self) -> &str {
        "openai"
    }
}
