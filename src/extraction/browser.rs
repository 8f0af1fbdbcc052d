//! Headless Chromium renderer.
//!
//! Every session launches its own browser process, so cookies, storage and
//! cache never carry over between extractions. Page scripts run before the
//! markup is read, which [`HttpRenderer`](crate::extraction::HttpRenderer)
//! cannot offer.

use crate::extraction::renderer::{PageRenderer, RenderSession};
use crate::extraction::types::{ExtractionError, RenderedPage, RendererConfig};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

/// Renderer backed by a local Chromium or Chrome install
#[derive(Debug, Clone, Default)]
pub struct BrowserRenderer {
    config: RendererConfig,
}

impl BrowserRenderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    fn browser_config(&self) -> Result<BrowserConfig, ExtractionError> {
        BrowserConfig::builder()
            .request_timeout(self.config.timeout)
            .arg(format!("--user-agent={}", self.config.user_agent))
            .arg("--disable-extensions")
            .build()
            .map_err(|e| ExtractionError::Render(format!("Invalid browser configuration: {}", e)))
    }
}

#[async_trait]
impl PageRenderer for BrowserRenderer {
    async fn open_session(&self) -> Result<Box<dyn RenderSession>, ExtractionError> {
        let (browser, mut handler) = Browser::launch(self.browser_config()?)
            .await
            .map_err(|e| ExtractionError::Render(format!("Failed to launch browser: {}", e)))?;

        // The DevTools connection only makes progress while its handler is polled.
        let events = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let id = Uuid::new_v4();
        debug!(session = %id, "Browser session opened");
        Ok(Box::new(BrowserSession {
            id,
            browser: Some(browser),
            events: Some(events),
        }))
    }

    fn name(&self) -> &'static str {
        "browser"
    }
}

struct BrowserSession {
    id: Uuid,
    browser: Option<Browser>,
    events: Option<JoinHandle<()>>,
}

#[async_trait]
impl RenderSession for BrowserSession {
    async fn load(&mut self, url: &Url) -> Result<RenderedPage, ExtractionError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| ExtractionError::Render("browser session already closed".to_string()))?;
        debug!(session = %self.id, url = %url, "Navigating");

        let page = browser.new_page(url.as_str()).await.map_err(navigation_error)?;
        page.wait_for_navigation().await.map_err(navigation_error)?;
        let html = page.content().await.map_err(navigation_error)?;

        let final_url = page
            .url()
            .await
            .ok()
            .flatten()
            .and_then(|current| Url::parse(&current).ok())
            .unwrap_or_else(|| url.clone());
        if let Err(e) = page.close().await {
            debug!(session = %self.id, "Page close failed: {}", e);
        }

        debug!(session = %self.id, bytes = html.len(), "Page rendered");
        Ok(RenderedPage { final_url, html })
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        let browser = self.browser.take();
        let events = self.events.take();
        let id = self.id;

        match (browser, tokio::runtime::Handle::try_current()) {
            (Some(mut browser), Ok(runtime)) => {
                runtime.spawn(async move {
                    if let Err(e) = browser.close().await {
                        warn!(session = %id, "Browser did not close cleanly: {}", e);
                    }
                    let _ = browser.wait().await;
                    if let Some(events) = events {
                        events.abort();
                    }
                    debug!(session = %id, "Browser process exited");
                });
            }
            // Outside a runtime the browser's own drop kills the process.
            (browser, _) => {
                drop(browser);
                if let Some(events) = events {
                    events.abort();
                }
            }
        }
        debug!(session = %id, "Render session released");
    }
}

fn navigation_error(error: CdpError) -> ExtractionError {
    ExtractionError::Navigation(error.to_string())
}
