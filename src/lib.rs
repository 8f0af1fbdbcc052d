//! # LegaliTea
//!
//! Plain-language analysis of legal documents. Requests go through an ordered
//! chain of LLM providers; when every provider fails, a deterministic offline
//! analysis takes over so a caller always receives a usable result.
//!
//! ## Architecture Overview
//!
//! - **[`llm`]**: Provider-agnostic LLM interface (DigitalOcean Gradient, Google Gemini)
//! - **[`analysis`]**: Prompt building, response normalization, the provider
//!   fallback orchestrator with its circuit breaker, and the static fallback generator
//! - **[`extraction`]**: Web page rendering and main-content text extraction
//! - **[`integration`]**: [`DocumentAssistant`], wiring configuration into both pipelines
//! - **[`cli`]**: Argument parsing and configuration discovery for the binary
//!
//! ## Features
//!
//! ### Document Analysis
//! - **Four operations**: full analysis, term explanation, what-if scenarios and quizzes
//! - **Any output language**: every prompt carries the requested target language
//! - **Validated results**: provider JSON is fence-stripped, parsed and checked
//!   for the required analysis sections before it is accepted
//!
//! ### Provider Fallback
//! - **Priority order**: providers are tried one at a time, lowest priority first
//! - **Circuit breaker**: a provider that fails an analysis is skipped for later analyses
//! - **Always answers**: an exhausted chain yields the static fallback result
//!
//! ### Content Extraction
//! - **Isolated sessions**: every extraction uses its own render session, released on every path
//! - **Boilerplate removal**: navigation, ads, cookie banners and similar chrome are dropped
//! - **Script-rendered pages**: the optional `browser` feature loads pages in headless Chromium
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use legalitea::{AssistantConfig, DocumentAssistant, OperationResult};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let assistant = DocumentAssistant::new(AssistantConfig::default());
//!
//!     let outcome = assistant
//!         .analyze("The Tenant shall pay a non-refundable deposit of $500.", Some("lease"), Some("es"))
//!         .await;
//!
//!     if let OperationResult::Analysis(analysis) = &outcome.result {
//!         println!("{} ({:?} risk)", analysis.summary.tldr, analysis.risk_assessment.overall_risk);
//!     }
//!     Ok(())
//! }
//! ```

/// Provider-agnostic LLM interface.
///
/// Uniform request/response types and one implementation per supported
/// provider, created from [`ProviderConfig`] entries.
pub mod llm;

/// Legal document analysis.
///
/// Prompts, normalization, the fallback orchestrator and the offline analysis.
pub mod analysis;

/// Web page content extraction.
pub mod extraction;

/// High-level entry point combining analysis and extraction.
pub mod integration;

/// Environment constants and path utilities.
///
/// Centralizes configuration locations, credential variable names and
/// provider defaults.
pub mod env;

// CLI module for command-line interface
pub mod cli;

// Re-export LLM abstraction types
pub use llm::{LLMError, LLMProvider, LLMRequest, LLMResponse, ProviderConfig, ProviderType};

// Re-export analysis types
pub use analysis::{
    AnalysisError, AnalysisResult, InvocationOutcome, OperationKind, OperationRequest,
    OperationResult, Orchestrator, OrchestratorOptions, ResultSource, ValidationMode,
};

// Re-export extraction types
pub use extraction::{ExtractedDocument, ExtractionEngine, ExtractionError};

// Re-export integration types
pub use integration::{AssistantConfig, DocumentAssistant, RetryPolicy};
