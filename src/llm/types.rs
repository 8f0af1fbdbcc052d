use crate::env;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Generic LLM request that can be implemented by any provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMRequest {
    pub id: Uuid,
    pub prompt: String,
    pub max_tokens: Option<u64>,
    pub temperature: Option<f32>,
    pub system_message: Option<String>,
}

impl LLMRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }
}

/// Generic LLM response from any provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMResponse {
    pub request_id: Uuid,
    pub content: String,
    pub model_used: String,
    pub token_usage: TokenUsage,
    pub execution_time: Duration,
}

/// Token usage statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

/// Provider-specific configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider_type: ProviderType,
    /// Inline credential; takes precedence over `api_key_env`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Environment variable holding the credential
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Lower values are tried first
    #[serde(default)]
    pub priority: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    env::provider::DEFAULT_TIMEOUT_SECS
}

/// Supported LLM providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// DigitalOcean Gradient serverless inference
    Gradient,
    /// Google Gemini
    Gemini,
}

impl ProviderType {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderType::Gradient => "gradient",
            ProviderType::Gemini => "gemini",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderType::Gradient => env::provider::GRADIENT_DEFAULT_MODEL,
            ProviderType::Gemini => env::provider::GEMINI_DEFAULT_MODEL,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderType::Gradient => env::provider::GRADIENT_BASE_URL,
            ProviderType::Gemini => env::provider::GEMINI_BASE_URL,
        }
    }

    pub fn default_credential_env(&self) -> &'static str {
        match self {
            ProviderType::Gradient => env::provider::GRADIENT_TOKEN_ENV,
            ProviderType::Gemini => env::provider::GEMINI_KEY_ENV,
        }
    }
}

impl ProviderConfig {
    pub fn new(provider_type: ProviderType) -> Self {
        Self {
            provider_type,
            api_key: None,
            api_key_env: None,
            base_url: None,
            model: None,
            priority: 0,
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Resolve the credential from the inline key or the environment.
    ///
    /// Blank values count as absent.
    pub fn resolve_api_key(&self) -> Option<String> {
        let inline = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string);

        inline.or_else(|| {
            let var = self
                .api_key_env
                .as_deref()
                .unwrap_or_else(|| self.provider_type.default_credential_env());
            std::env::var(var)
                .ok()
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty())
        })
    }

    pub fn model_id(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.provider_type.default_model().to_string())
    }

    pub fn endpoint(&self) -> String {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider_type.default_base_url())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Generic LLM errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum LLMError {
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Provider-specific error: {0}")]
    ProviderSpecific(String),
}

impl Default for LLMRequest {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt: String::new(),
            max_tokens: None,
            temperature: None,
            system_message: None,
        }
    }
}
