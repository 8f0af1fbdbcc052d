pub mod types;
pub mod renderer;
pub mod cleaner;
pub mod engine;

/// Headless browser rendering (requires `browser` feature).
#[cfg(feature = "browser")]
pub mod browser;

#[cfg(test)]
pub mod tests;

pub use types::*;
pub use engine::{ExtractionEngine, validate_url};
pub use renderer::{HttpRenderer, PageRenderer, RenderSession};

#[cfg(feature = "browser")]
pub use browser::BrowserRenderer;
