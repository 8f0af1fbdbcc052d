//! Page rendering capability.
//!
//! A [`PageRenderer`] hands out isolated [`RenderSession`]s. Each session owns
//! its own resources and releases them when dropped, so every exit path of an
//! extraction (success, error or timeout) tears the session down.

use crate::extraction::types::{ExtractionError, RenderedPage, RendererConfig};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, UPGRADE_INSECURE_REQUESTS};
use tracing::debug;
use url::Url;
use uuid::Uuid;

/// Source of isolated rendering contexts
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn open_session(&self) -> Result<Box<dyn RenderSession>, ExtractionError>;

    /// Short identifier used in logs
    fn name(&self) -> &'static str {
        "custom"
    }
}

/// One rendering context; released on drop
#[async_trait]
pub trait RenderSession: Send {
    /// Navigate to `url` and return the loaded markup.
    async fn load(&mut self, url: &Url) -> Result<RenderedPage, ExtractionError>;
}

/// Renderer that fetches markup over HTTP with browser-like headers.
///
/// Pages that build their content with scripts are returned as served.
#[derive(Debug, Clone, Default)]
pub struct HttpRenderer {
    config: RendererConfig,
}

impl HttpRenderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
        headers
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn open_session(&self) -> Result<Box<dyn RenderSession>, ExtractionError> {
        // A fresh client per session keeps cookies and connections isolated.
        let client = reqwest::Client::builder()
            .timeout(self.config.timeout)
            .user_agent(&self.config.user_agent)
            .default_headers(Self::default_headers())
            .redirect(reqwest::redirect::Policy::limited(self.config.max_redirects))
            .build()
            .map_err(|e| ExtractionError::Render(format!("Failed to create HTTP client: {}", e)))?;

        let id = Uuid::new_v4();
        debug!(session = %id, "Render session opened");
        Ok(Box::new(HttpSession { id, client }))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

struct HttpSession {
    id: Uuid,
    client: reqwest::Client,
}

#[async_trait]
impl RenderSession for HttpSession {
    async fn load(&mut self, url: &Url) -> Result<RenderedPage, ExtractionError> {
        debug!(session = %self.id, url = %url, "Navigating");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(map_navigation_error)?;

        let status = response.status();
        let final_url = response.url().clone();
        if !status.is_success() {
            return Err(ExtractionError::HttpStatus {
                status: status.as_u16(),
                url: final_url.to_string(),
            });
        }

        let html = response.text().await.map_err(map_navigation_error)?;
        debug!(session = %self.id, bytes = html.len(), "Page loaded");
        Ok(RenderedPage { final_url, html })
    }
}

impl Drop for HttpSession {
    fn drop(&mut self) {
        debug!(session = %self.id, "Render session released");
    }
}

fn map_navigation_error(error: reqwest::Error) -> ExtractionError {
    if error.is_timeout() {
        ExtractionError::Navigation(format!("timed out: {}", error))
    } else {
        ExtractionError::Navigation(error.to_string())
    }
}
