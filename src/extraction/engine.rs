use crate::extraction::cleaner;
use crate::extraction::renderer::{HttpRenderer, PageRenderer};
use crate::extraction::types::{ExtractedDocument, ExtractionError, RendererConfig, RendererKind};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Check that `raw` is an absolute http(s) URL with a host.
///
/// Runs before any network access.
pub fn validate_url(raw: &str) -> Result<Url, ExtractionError> {
    let url = Url::parse(raw.trim()).map_err(|e| ExtractionError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(ExtractionError::UnsupportedScheme(other.to_string())),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(ExtractionError::InvalidUrl {
            url: raw.to_string(),
            reason: "missing host".to_string(),
        });
    }
    Ok(url)
}

/// Turns a URL into clean article text.
///
/// Each call opens its own render session and drops it before returning.
/// Failures are returned as-is; retrying is left to the caller.
#[derive(Clone)]
pub struct ExtractionEngine {
    renderer: Arc<dyn PageRenderer>,
    timeout: Duration,
}

impl ExtractionEngine {
    pub fn new(renderer: Arc<dyn PageRenderer>, timeout: Duration) -> Self {
        Self { renderer, timeout }
    }

    /// Engine backed by [`HttpRenderer`]
    pub fn http(config: RendererConfig) -> Self {
        let timeout = config.timeout;
        Self::new(Arc::new(HttpRenderer::new(config)), timeout)
    }

    /// Engine backed by the renderer `kind` selects.
    ///
    /// Without the `browser` feature a browser request falls back to HTTP.
    pub fn with_renderer(kind: RendererKind, config: RendererConfig) -> Self {
        match kind {
            RendererKind::Http => Self::http(config),
            #[cfg(feature = "browser")]
            RendererKind::Browser => {
                let timeout = config.timeout;
                Self::new(Arc::new(crate::extraction::BrowserRenderer::new(config)), timeout)
            }
            #[cfg(not(feature = "browser"))]
            RendererKind::Browser => {
                tracing::warn!("Browser rendering needs the `browser` feature, using HTTP instead");
                Self::http(config)
            }
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn renderer_name(&self) -> &'static str {
        self.renderer.name()
    }

    pub async fn extract(&self, raw_url: &str) -> Result<ExtractedDocument, ExtractionError> {
        let url = validate_url(raw_url)?;
        info!(url = %url, renderer = self.renderer.name(), "Extracting page content");

        let page = {
            let mut session = self.renderer.open_session().await?;
            match tokio::time::timeout(self.timeout, session.load(&url)).await {
                Ok(loaded) => loaded?,
                Err(_) => return Err(ExtractionError::Timeout(self.timeout)),
            }
        };

        let document = cleaner::extract_document(&page.html);
        debug!(
            url = %page.final_url,
            title = %document.title,
            words = document.word_count(),
            "Page content extracted"
        );
        Ok(document)
    }
}

impl Default for ExtractionEngine {
    fn default() -> Self {
        Self::http(RendererConfig::default())
    }
}
