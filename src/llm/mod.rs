pub mod gemini_provider;
pub mod gradient_provider;
pub mod http;
pub mod provider;
pub mod types;

pub use gemini_provider::GeminiProvider;
pub use gradient_provider::GradientProvider;
pub use provider::{LLMProvider, LLMProviderFactory};
pub use types::*;
