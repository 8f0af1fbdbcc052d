use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Clean article content taken from one web page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub title: String,
    pub text: String,
}

impl ExtractedDocument {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Raw markup returned by a render session
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Address after redirects
    pub final_url: Url,
    pub html: String,
}

/// Which [`PageRenderer`](crate::extraction::PageRenderer) loads pages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// Plain HTTP fetch; scripts are not run
    #[default]
    Http,
    /// Headless Chromium; needs the `browser` feature
    Browser,
}

/// Settings shared by the page renderers
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub user_agent: String,
    pub timeout: Duration,
    pub max_redirects: usize,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            user_agent: crate::env::extraction::DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(crate::env::extraction::DEFAULT_TIMEOUT_SECS),
            max_redirects: crate::env::extraction::MAX_REDIRECTS,
        }
    }
}

/// Extraction errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExtractionError {
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Unsupported URL scheme '{0}', expected http or https")]
    UnsupportedScheme(String),
    #[error("Navigation failed: {0}")]
    Navigation(String),
    #[error("HTTP {status} while loading {url}")]
    HttpStatus { status: u16, url: String },
    #[error("Page did not load within {0:?}")]
    Timeout(Duration),
    #[error("Could not render page: {0}")]
    Render(String),
}

impl ExtractionError {
    /// Whether repeating the same request could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ExtractionError::Navigation(_) | ExtractionError::Timeout(_) => true,
            ExtractionError::HttpStatus { status, .. } => {
                *status >= 500 || *status == 429 || *status == 408
            }
            ExtractionError::InvalidUrl { .. }
            | ExtractionError::UnsupportedScheme(_)
            | ExtractionError::Render(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(ExtractionError::Navigation("reset".into()).is_retryable());
        assert!(ExtractionError::Timeout(Duration::from_secs(30)).is_retryable());
        assert!(
            ExtractionError::HttpStatus {
                status: 503,
                url: "https://example.com".into()
            }
            .is_retryable()
        );
        assert!(
            !ExtractionError::HttpStatus {
                status: 404,
                url: "https://example.com".into()
            }
            .is_retryable()
        );
        assert!(!ExtractionError::UnsupportedScheme("ftp".into()).is_retryable());
    }

    #[test]
    fn test_document_helpers() {
        let document = ExtractedDocument {
            title: "Terms".into(),
            text: "You agree to these terms.".into(),
        };
        assert!(!document.is_empty());
        assert_eq!(document.word_count(), 5);
        assert!(ExtractedDocument::default().is_empty());
    }
}
