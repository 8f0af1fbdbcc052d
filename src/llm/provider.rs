use crate::llm::gemini_provider::GeminiProvider;
use crate::llm::gradient_provider::GradientProvider;
use crate::llm::types::{LLMError, LLMRequest, LLMResponse, ProviderConfig, ProviderType};
use futures::future::BoxFuture;
use std::sync::Arc;

/// Generic LLM Provider trait that can be implemented by any LLM service
pub trait LLMProvider: Send + Sync {
    /// Execute a single prompt and return the raw completion text
    fn execute_request(&self, request: LLMRequest) -> BoxFuture<'_, Result<LLMResponse, LLMError>>;

    /// Get provider name/identifier
    fn provider_name(&self) -> &str;

    /// Model identifier this provider sends requests to
    fn model(&self) -> &str;
}

/// Factory for creating LLM providers
pub struct LLMProviderFactory;

impl LLMProviderFactory {
    /// Create a provider from configuration.
    ///
    /// Fails with [`LLMError::ProviderUnavailable`] when no credential is configured.
    pub fn create_provider(config: ProviderConfig) -> Result<Arc<dyn LLMProvider>, LLMError> {
        match config.provider_type {
            ProviderType::Gradient => Ok(Arc::new(GradientProvider::new(config)?)),
            ProviderType::Gemini => Ok(Arc::new(GeminiProvider::new(config)?)),
        }
    }
}
