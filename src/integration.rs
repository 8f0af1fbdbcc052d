//! # Document Assistant
//!
//! Wires configuration into the two independent pipelines and exposes one
//! entry point per use case:
//!
//! - **[`DocumentAssistant`]**: builds the provider chain and the extraction
//!   engine from an [`AssistantConfig`]
//! - **[`RetryPolicy`]**: caller-side retry for extraction with exponential
//!   backoff over a bounded number of attempts
//!
//! ```text
//!  URL ──► ExtractionEngine ──► text ──┐
//!                                      ▼
//!                  OperationRequest ──► Orchestrator ──► providers ──► static fallback
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use legalitea::{AssistantConfig, DocumentAssistant};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let assistant = DocumentAssistant::new(AssistantConfig::default());
//!
//!     let outcome = assistant
//!         .analyze("The Tenant shall pay rent monthly.", None, None)
//!         .await;
//!     println!("{}", serde_json::to_string_pretty(&outcome.result)?);
//!
//!     let (page, analysis) = assistant.analyze_url("https://example.com/terms", None, None).await?;
//!     println!("{}: {}", page.title, serde_json::to_string(&analysis.result)?);
//!     Ok(())
//! }
//! ```

use crate::analysis::{
    InvocationOutcome, OperationRequest, Orchestrator, OrchestratorOptions, ProviderStatus,
    ValidationMode,
};
use crate::env;
use crate::extraction::{
    ExtractedDocument, ExtractionEngine, ExtractionError, RendererConfig, RendererKind,
};
use crate::llm::{ProviderConfig, ProviderType};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Complete runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Target language for generated content (code or name)
    pub language: String,
    /// Quiz difficulty, passed to the prompt verbatim
    pub difficulty: String,
    pub document_type: String,
    pub orchestrator: OrchestratorSettings,
    pub extraction: ExtractionSettings,
    /// Provider chain, tried in ascending priority
    pub providers: Vec<ProviderConfig>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            difficulty: "medium".to_string(),
            document_type: "document".to_string(),
            orchestrator: OrchestratorSettings::default(),
            extraction: ExtractionSettings::default(),
            providers: vec![
                ProviderConfig::new(ProviderType::Gradient).with_priority(0),
                ProviderConfig::new(ProviderType::Gemini).with_priority(1),
            ],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorSettings {
    pub validation: ValidationMode,
    pub offline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breaker_reset_secs: Option<u64>,
}

impl OrchestratorSettings {
    pub fn to_options(&self) -> OrchestratorOptions {
        OrchestratorOptions {
            validation: self.validation,
            offline: self.offline,
            breaker_reset: self.breaker_reset_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    pub renderer: RendererKind,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            renderer: RendererKind::default(),
            timeout_secs: env::extraction::DEFAULT_TIMEOUT_SECS,
            user_agent: env::extraction::DEFAULT_USER_AGENT.to_string(),
            max_attempts: env::extraction::DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: env::extraction::DEFAULT_BASE_DELAY_MS,
        }
    }
}

impl ExtractionSettings {
    pub fn renderer_config(&self) -> RendererConfig {
        RendererConfig {
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
            max_redirects: env::extraction::MAX_REDIRECTS,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.base_delay_ms))
    }
}

/// Bounded retry with exponential backoff for retryable extraction errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        ExtractionSettings::default().retry_policy()
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay after failed attempt `attempt` (1-based): base, 2x base, 4x base, ...
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1).min(16)))
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or runs out of attempts. The last error is returned.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, ExtractionError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ExtractionError>>,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(attempt, max_attempts = self.max_attempts, ?delay, "Attempt failed, retrying: {}", error);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

/// Snapshot of the assistant's configuration and provider chain
#[derive(Debug, Clone, Serialize)]
pub struct AssistantStatus {
    pub language: String,
    pub offline: bool,
    pub validation: ValidationMode,
    pub providers: Vec<ProviderStatus>,
}

/// Entry point for every use case
pub struct DocumentAssistant {
    config: AssistantConfig,
    orchestrator: Arc<Orchestrator>,
    extractor: ExtractionEngine,
    retry: RetryPolicy,
}

impl DocumentAssistant {
    pub fn new(config: AssistantConfig) -> Self {
        let orchestrator = Orchestrator::from_configs(&config.providers, config.orchestrator.to_options());
        let extractor = ExtractionEngine::with_renderer(
            config.extraction.renderer,
            config.extraction.renderer_config(),
        );
        Self::with_components(config, Arc::new(orchestrator), extractor)
    }

    /// Assemble from prebuilt parts, e.g. an orchestrator over custom providers.
    pub fn with_components(
        config: AssistantConfig,
        orchestrator: Arc<Orchestrator>,
        extractor: ExtractionEngine,
    ) -> Self {
        let retry = config.extraction.retry_policy();
        let available = orchestrator
            .provider_states()
            .iter()
            .filter(|status| status.available)
            .count();
        info!(
            providers = available,
            offline = config.orchestrator.offline,
            language = %config.language,
            "Document assistant ready"
        );

        Self {
            config,
            orchestrator,
            extractor,
            retry,
        }
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    fn language<'a>(&'a self, language: Option<&'a str>) -> &'a str {
        language.unwrap_or(&self.config.language)
    }

    pub async fn analyze(
        &self,
        text: &str,
        document_type: Option<&str>,
        language: Option<&str>,
    ) -> InvocationOutcome {
        let request = OperationRequest::analyze(
            text,
            document_type.unwrap_or(&self.config.document_type),
            self.language(language),
        );
        self.orchestrator.invoke(&request).await
    }

    pub async fn explain_term(
        &self,
        term: &str,
        context: Option<&str>,
        document_type: Option<&str>,
        language: Option<&str>,
    ) -> InvocationOutcome {
        let request = OperationRequest::explain_term(
            term,
            context.map(str::to_string),
            document_type.map(str::to_string),
            self.language(language),
        );
        self.orchestrator.invoke(&request).await
    }

    pub async fn generate_scenarios(
        &self,
        clause: &str,
        document_type: Option<&str>,
        language: Option<&str>,
    ) -> InvocationOutcome {
        let request = OperationRequest::generate_scenarios(
            clause,
            document_type.map(str::to_string),
            self.language(language),
        );
        self.orchestrator.invoke(&request).await
    }

    pub async fn generate_quiz(
        &self,
        document_text: &str,
        difficulty: Option<&str>,
        language: Option<&str>,
    ) -> InvocationOutcome {
        let request = OperationRequest::generate_quiz(
            document_text,
            difficulty.unwrap_or(&self.config.difficulty),
            self.language(language),
        );
        self.orchestrator.invoke(&request).await
    }

    /// Single extraction attempt
    pub async fn extract(&self, url: &str) -> Result<ExtractedDocument, ExtractionError> {
        self.extractor.extract(url).await
    }

    /// Extraction under the configured [`RetryPolicy`]
    pub async fn extract_with_retry(&self, url: &str) -> Result<ExtractedDocument, ExtractionError> {
        self.extract_with_policy(url, self.retry).await
    }

    pub async fn extract_with_policy(
        &self,
        url: &str,
        policy: RetryPolicy,
    ) -> Result<ExtractedDocument, ExtractionError> {
        policy.run(|_| self.extractor.extract(url)).await
    }

    /// Extract a page and analyze its text.
    pub async fn analyze_url(
        &self,
        url: &str,
        document_type: Option<&str>,
        language: Option<&str>,
    ) -> Result<(ExtractedDocument, InvocationOutcome)> {
        let page = self
            .extract_with_retry(url)
            .await
            .with_context(|| format!("Failed to extract content from {}", url))?;

        if page.is_empty() {
            warn!(url, "Extracted page has no text");
        }
        let outcome = self.analyze(&page.text, document_type, language).await;
        Ok((page, outcome))
    }

    pub fn status(&self) -> AssistantStatus {
        AssistantStatus {
            language: self.config.language.clone(),
            offline: self.config.orchestrator.offline,
            validation: self.config.orchestrator.validation,
            providers: self.orchestrator.provider_states(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
    }

    #[test]
    fn test_zero_attempts_means_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }

    #[tokio::test]
    async fn test_retries_retryable_errors_until_success() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let calls = AtomicU32::new(0);

        let result = policy
            .run(|attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        Err(ExtractionError::Navigation("reset".into()))
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let policy = RetryPolicy::new(2, Duration::from_millis(1));
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = policy
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ExtractionError::Timeout(Duration::from_secs(1))) }
            })
            .await;

        assert!(matches!(result, Err(ExtractionError::Timeout(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_input_errors_are_not_retried() {
        let policy = RetryPolicy::new(5, Duration::from_millis(1));
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = policy
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ExtractionError::UnsupportedScheme("ftp".into())) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_default_config() {
        let config = AssistantConfig::default();
        assert_eq!(config.language, "en");
        assert_eq!(config.difficulty, "medium");
        assert_eq!(config.providers.len(), 2);
        assert_eq!(config.providers[0].provider_type, ProviderType::Gradient);
        assert_eq!(config.extraction.retry_policy().base_delay, Duration::from_secs(1));
        assert!(config.orchestrator.to_options().breaker_reset.is_none());
        assert_eq!(config.extraction.renderer, RendererKind::Http);
        assert_eq!(DocumentAssistant::new(config).extractor.renderer_name(), "http");
    }

    #[tokio::test]
    async fn test_offline_assistant_answers_every_operation() {
        let mut config = AssistantConfig::default();
        config.orchestrator.offline = true;
        let assistant = DocumentAssistant::new(config);

        let analysis = assistant.analyze("The Tenant shall pay rent.", Some("lease"), None).await;
        assert!(analysis.is_fallback());

        let term = assistant.explain_term("escrow", None, None, None).await;
        let quiz = assistant.generate_quiz("text", None, Some("fr")).await;
        let scenarios = assistant.generate_scenarios("clause", None, None).await;
        assert!(term.is_fallback() && quiz.is_fallback() && scenarios.is_fallback());

        let status = assistant.status();
        assert!(status.offline);
        assert_eq!(status.providers.len(), 2);
    }
}
