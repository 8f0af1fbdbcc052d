pub mod types;
pub mod prompts;
pub mod normalizer;
pub mod fallback;
pub mod breaker;
pub mod orchestrator;


pub use types::*;
pub use breaker::{BreakerState, ProviderCircuitBreaker};
pub use fallback::generate_fallback_analysis;
pub use normalizer::{normalize, strip_code_fence};
pub use orchestrator::{Orchestrator, OrchestratorOptions, ProviderStatus};
