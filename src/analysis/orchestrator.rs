//! Provider Orchestrator.
//!
//! Drives one operation through the provider chain: build the prompt, try
//! each available provider in priority order, accept the first response that
//! normalizes cleanly, and fall back to the static generator when the chain
//! is exhausted. Attempts are strictly sequential.

use crate::analysis::breaker::ProviderCircuitBreaker;
use crate::analysis::fallback::generate_fallback_analysis;
use crate::analysis::normalizer;
use crate::analysis::prompts::build_prompt;
use crate::analysis::types::{
    AnalysisError, AnalysisResult, InvocationOutcome, OperationKind, OperationRequest,
    OperationResult, ProviderFailure, Quiz, ResultSource, ScenarioSet, TermExplanation,
    ValidationMode,
};
use crate::llm::{LLMProvider, LLMProviderFactory, LLMRequest, ProviderConfig};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Behaviour switches for an [`Orchestrator`]
#[derive(Debug, Clone, Default)]
pub struct OrchestratorOptions {
    pub validation: ValidationMode,
    /// Skip every provider and answer from the static generator
    pub offline: bool,
    /// Re-enable tripped providers after this long; `None` keeps them off
    pub breaker_reset: Option<Duration>,
}

/// One position in the provider chain
struct ProviderSlot {
    name: String,
    /// Breaker key, unique within the chain
    key: String,
    model: String,
    priority: u32,
    /// Why the provider could not be created, e.g. missing credential
    provider: Result<Arc<dyn LLMProvider>, String>,
}

impl ProviderSlot {
    fn ready(priority: u32, provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            name: provider.provider_name().to_string(),
            key: String::new(),
            model: provider.model().to_string(),
            priority,
            provider: Ok(provider),
        }
    }
}

/// Availability view of one provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderStatus {
    pub name: String,
    pub model: String,
    pub priority: u32,
    pub available: bool,
}

/// Ordered fallback across providers ending in a static result.
///
/// Breaker state is keyed per chain position: the first slot with a given
/// provider name uses the bare name, later ones get `name#2`, `name#3` and
/// so on in chain order.
pub struct Orchestrator {
    slots: Vec<ProviderSlot>,
    breaker: Arc<ProviderCircuitBreaker>,
    options: OrchestratorOptions,
}

impl Orchestrator {
    /// Build a chain from ready providers, tried in ascending `priority`.
    pub fn new(providers: Vec<(u32, Arc<dyn LLMProvider>)>, options: OrchestratorOptions) -> Self {
        let breaker = match options.breaker_reset {
            Some(window) => ProviderCircuitBreaker::with_reset(window),
            None => ProviderCircuitBreaker::new(),
        };
        Self::with_breaker(providers, options, Arc::new(breaker))
    }

    /// Build a chain that records availability in an existing breaker.
    pub fn with_breaker(
        providers: Vec<(u32, Arc<dyn LLMProvider>)>,
        options: OrchestratorOptions,
        breaker: Arc<ProviderCircuitBreaker>,
    ) -> Self {
        let slots = providers
            .into_iter()
            .map(|(priority, provider)| ProviderSlot::ready(priority, provider))
            .collect();

        let mut orchestrator = Self {
            slots,
            breaker,
            options,
        };
        orchestrator.arrange_slots();
        orchestrator
    }

    /// Build a chain from provider configuration.
    ///
    /// Providers that cannot be created stay in the chain as permanently
    /// unavailable so they still show up in [`Orchestrator::provider_states`].
    pub fn from_configs(configs: &[ProviderConfig], options: OrchestratorOptions) -> Self {
        let mut orchestrator = Self::new(Vec::new(), options);

        for config in configs {
            let slot = match LLMProviderFactory::create_provider(config.clone()) {
                Ok(provider) => ProviderSlot::ready(config.priority, provider),
                Err(e) => {
                    let name = config.provider_type.name();
                    debug!(provider = name, "Provider unavailable: {}", e);
                    ProviderSlot {
                        name: name.to_string(),
                        key: String::new(),
                        model: config.model_id(),
                        priority: config.priority,
                        provider: Err(e.to_string()),
                    }
                }
            };
            orchestrator.slots.push(slot);
        }

        orchestrator.arrange_slots();
        for slot in &orchestrator.slots {
            if let Err(reason) = &slot.provider {
                orchestrator.breaker.disable(&slot.key, reason.clone());
            }
        }
        orchestrator
    }

    /// Sort by priority and give every slot its breaker key.
    fn arrange_slots(&mut self) {
        // Stable, so equal priorities keep their configured order.
        self.slots.sort_by_key(|slot| slot.priority);

        let mut seen: HashMap<String, usize> = HashMap::new();
        for slot in &mut self.slots {
            let count = seen.entry(slot.name.clone()).or_default();
            *count += 1;
            slot.key = match *count {
                1 => slot.name.clone(),
                n => format!("{}#{}", slot.name, n),
            };
        }
    }

    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    pub fn breaker(&self) -> &Arc<ProviderCircuitBreaker> {
        &self.breaker
    }

    /// Run one operation. Never fails; the worst case is the degraded result.
    pub async fn invoke(&self, request: &OperationRequest) -> InvocationOutcome {
        let kind = request.kind();

        if self.options.offline {
            debug!(operation = %kind, "Offline mode, using static result");
            return InvocationOutcome {
                result: OperationResult::degraded(request),
                source: ResultSource::StaticFallback,
                failures: Vec::new(),
            };
        }

        let prompt = build_prompt(request);
        let mut failures: Vec<ProviderFailure> = Vec::new();

        for slot in &self.slots {
            let Ok(provider) = &slot.provider else {
                continue;
            };
            // The breaker only gates full analysis; other kinds always attempt.
            if kind.trips_breaker() && !self.breaker.is_available(&slot.key) {
                debug!(provider = %slot.name, operation = %kind, "Skipping unavailable provider");
                continue;
            }

            debug!(provider = %slot.name, model = %slot.model, operation = %kind, "Attempting provider");
            match self.attempt(provider.as_ref(), kind, &prompt).await {
                Ok(result) => {
                    info!(
                        provider = %slot.name,
                        operation = %kind,
                        failed_attempts = failures.len(),
                        "Provider result accepted"
                    );
                    return InvocationOutcome {
                        result,
                        source: ResultSource::Provider(slot.name.clone()),
                        failures,
                    };
                }
                Err(error) => {
                    warn!(provider = %slot.name, operation = %kind, "Provider attempt failed: {}", error);
                    if kind.trips_breaker() {
                        self.breaker.trip(&slot.key, error.to_string());
                    }
                    failures.push(ProviderFailure {
                        provider: slot.name.clone(),
                        error,
                    });
                }
            }
        }

        warn!(
            operation = %kind,
            failed_attempts = failures.len(),
            "No provider produced a result, using static fallback"
        );
        InvocationOutcome {
            result: OperationResult::degraded(request),
            source: ResultSource::StaticFallback,
            failures,
        }
    }

    async fn attempt(
        &self,
        provider: &dyn LLMProvider,
        kind: OperationKind,
        prompt: &str,
    ) -> Result<OperationResult, AnalysisError> {
        let response = provider.execute_request(LLMRequest::new(prompt)).await?;
        normalizer::normalize(kind, &response.content, self.options.validation)
    }

    pub async fn analyze(&self, text: &str, document_type: &str, language: &str) -> AnalysisResult {
        let request = OperationRequest::analyze(text, document_type, language);
        match self.invoke(&request).await.result {
            OperationResult::Analysis(analysis) => *analysis,
            _ => generate_fallback_analysis(text, document_type),
        }
    }

    pub async fn explain_term(
        &self,
        term: &str,
        context: Option<&str>,
        document_type: Option<&str>,
        language: &str,
    ) -> TermExplanation {
        let request = OperationRequest::explain_term(
            term,
            context.map(str::to_string),
            document_type.map(str::to_string),
            language,
        );
        match self.invoke(&request).await.result {
            OperationResult::TermExplanation(explanation) => explanation,
            _ => TermExplanation::degraded(term),
        }
    }

    pub async fn generate_scenarios(
        &self,
        clause: &str,
        document_type: Option<&str>,
        language: &str,
    ) -> ScenarioSet {
        let request =
            OperationRequest::generate_scenarios(clause, document_type.map(str::to_string), language);
        match self.invoke(&request).await.result {
            OperationResult::Scenarios(scenarios) => scenarios,
            _ => ScenarioSet::degraded(),
        }
    }

    pub async fn generate_quiz(&self, document_text: &str, difficulty: &str, language: &str) -> Quiz {
        let request = OperationRequest::generate_quiz(document_text, difficulty, language);
        match self.invoke(&request).await.result {
            OperationResult::Quiz(quiz) => quiz,
            _ => Quiz::degraded(),
        }
    }

    /// Current availability of every provider, in chain order.
    pub fn provider_states(&self) -> Vec<ProviderStatus> {
        self.slots
            .iter()
            .map(|slot| ProviderStatus {
                name: slot.name.clone(),
                model: slot.model.clone(),
                priority: slot.priority,
                available: slot.provider.is_ok() && self.breaker.is_available(&slot.key),
            })
            .collect()
    }

    /// Whether at least one provider could currently be attempted.
    pub fn has_available_provider(&self) -> bool {
        self.provider_states().iter().any(|status| status.available)
    }
}
