//! Google Gemini provider.
//!
//! Calls the Generative Language `generateContent` endpoint and concatenates
//! the text parts of the first candidate. The credential comes from
//! `GEMINI_API_KEY` unless configured otherwise.

use crate::llm::http;
use crate::llm::provider::LLMProvider;
use crate::llm::types::{LLMError, LLMRequest, LLMResponse, ProviderConfig, TokenUsage};
use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

/// Gemini `generateContent` provider
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
    #[serde(default)]
    total_token_count: u64,
}

impl GeminiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, LLMError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            LLMError::ProviderUnavailable(format!(
                "No Gemini credential configured (set {})",
                config
                    .api_key_env
                    .as_deref()
                    .unwrap_or_else(|| config.provider_type.default_credential_env())
            ))
        })?;
        let model = config.model_id();

        Ok(Self {
            client: http::build_client(config.timeout())?,
            api_key,
            endpoint: format!("{}/models/{}:generateContent", config.endpoint(), model),
            model,
        })
    }

    fn build_body<'a>(&self, request: &'a LLMRequest) -> GenerateContentRequest<'a> {
        let generation_config = if request.max_tokens.is_some() || request.temperature.is_some() {
            Some(GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            })
        } else {
            None
        };

        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            system_instruction: request.system_message.as_deref().map(|text| Content {
                role: None,
                parts: vec![Part { text }],
            }),
            generation_config,
        }
    }

    fn to_response(
        &self,
        request: &LLMRequest,
        generated: GenerateContentResponse,
        started: Instant,
    ) -> Result<LLMResponse, LLMError> {
        let candidate = generated.candidates.into_iter().next().ok_or_else(|| {
            LLMError::InvalidResponse("Gemini returned no candidates".to_string())
        })?;

        let content: String = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        let token_usage = generated
            .usage_metadata
            .map(|usage| TokenUsage {
                input_tokens: usage.prompt_token_count,
                output_tokens: usage.candidates_token_count,
                total_tokens: usage.total_token_count,
            })
            .unwrap_or_default();

        Ok(LLMResponse {
            request_id: request.id,
            content: content.trim().to_string(),
            model_used: generated.model_version.unwrap_or_else(|| self.model.clone()),
            token_usage,
            execution_time: started.elapsed(),
        })
    }
}

impl LLMProvider for GeminiProvider {
    fn execute_request(&self, request: LLMRequest) -> BoxFuture<'_, Result<LLMResponse, LLMError>> {
        Box::pin(async move {
            let started = Instant::now();
            debug!(model = %self.model, request_id = %request.id, "Sending Gemini generateContent");

            let response = self
                .client
                .post(&self.endpoint)
                .header("x-goog-api-key", &self.api_key)
                .json(&self.build_body(&request))
                .send()
                .await
                .map_err(http::map_transport_error)?;

            let generated: GenerateContentResponse = http::check_status(response)
                .await?
                .json()
                .await
                .map_err(http::map_transport_error)?;

            self.to_response(&request, generated, started)
        })
    }

    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
