//! DigitalOcean Gradient provider.
//!
//! Gradient exposes an OpenAI-compatible chat completions endpoint. The
//! provider sends the prompt as a single user message and returns the first
//! choice's content. The credential comes from `DIGITALOCEAN_ACCESS_TOKEN`
//! unless configured otherwise.

use crate::llm::http;
use crate::llm::provider::LLMProvider;
use crate::llm::types::{LLMError, LLMRequest, LLMResponse, ProviderConfig, TokenUsage};
use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

/// OpenAI-compatible chat completions provider backed by DigitalOcean Gradient
pub struct GradientProvider {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}

impl GradientProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, LLMError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            LLMError::ProviderUnavailable(format!(
                "No Gradient credential configured (set {})",
                config
                    .api_key_env
                    .as_deref()
                    .unwrap_or_else(|| config.provider_type.default_credential_env())
            ))
        })?;

        Ok(Self {
            client: http::build_client(config.timeout())?,
            api_key,
            endpoint: format!("{}/chat/completions", config.endpoint()),
            model: config.model_id(),
        })
    }

    fn build_body<'a>(&'a self, request: &'a LLMRequest) -> ChatCompletionRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system_message.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        ChatCompletionRequest {
            model: &self.model,
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }

    fn to_response(
        &self,
        request: &LLMRequest,
        completion: ChatCompletionResponse,
        started: Instant,
    ) -> LLMResponse {
        // A missing message is passed through as empty text; the caller decides
        // whether that is acceptable.
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        let token_usage = completion
            .usage
            .map(|usage| TokenUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            })
            .unwrap_or_default();

        LLMResponse {
            request_id: request.id,
            content,
            model_used: completion.model.unwrap_or_else(|| self.model.clone()),
            token_usage,
            execution_time: started.elapsed(),
        }
    }
}

impl LLMProvider for GradientProvider {
    fn execute_request(&self, request: LLMRequest) -> BoxFuture<'_, Result<LLMResponse, LLMError>> {
        Box::pin(async move {
            let started = Instant::now();
            debug!(model = %self.model, request_id = %request.id, "Sending Gradient chat completion");

            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&self.build_body(&request))
                .send()
                .await
                .map_err(http::map_transport_error)?;

            let completion: ChatCompletionResponse = http::check_status(response)
                .await?
                .json()
                .await
                .map_err(http::map_transport_error)?;

            Ok(self.to_response(&request, completion, started))
        })
    }

    fn provider_name(&self) -> &str {
        "gradient"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
