//! HTTP plumbing shared by the network-backed providers.

use crate::llm::types::LLMError;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

/// Maximum number of body characters quoted in error messages
const ERROR_BODY_PREVIEW: usize = 300;

/// Build the client used by a single provider instance.
pub fn build_client(timeout: Duration) -> Result<Client, LLMError> {
    Client::builder()
        .timeout(timeout)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .map_err(|e| LLMError::ProviderSpecific(format!("Failed to create HTTP client: {}", e)))
}

/// Map a transport-level failure into an [`LLMError`].
pub fn map_transport_error(error: reqwest::Error) -> LLMError {
    if error.is_timeout() {
        LLMError::Timeout(error.to_string())
    } else if error.is_decode() {
        LLMError::InvalidResponse(error.to_string())
    } else {
        LLMError::Network(error.to_string())
    }
}

/// Turn non-success statuses into typed errors, keeping a preview of the body.
pub async fn check_status(response: Response) -> Result<Response, LLMError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &body))
}

pub(crate) fn status_error(status: StatusCode, body: &str) -> LLMError {
    let preview: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
    let message = format!("HTTP {}: {}", status.as_u16(), preview.trim());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LLMError::Authentication(message),
        StatusCode::TOO_MANY_REQUESTS => LLMError::RateLimit(message),
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::PAYLOAD_TOO_LARGE => {
            LLMError::InvalidRequest(message)
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => LLMError::Timeout(message),
        s if s.is_server_error() => LLMError::ProviderUnavailable(message),
        _ => LLMError::ProviderSpecific(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, "bad token"),
            LLMError::Authentication(_)
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, ""),
            LLMError::RateLimit(_)
        ));
        assert!(matches!(
            status_error(StatusCode::SERVICE_UNAVAILABLE, "overloaded"),
            LLMError::ProviderUnavailable(_)
        ));
        assert!(matches!(
            status_error(StatusCode::IM_A_TEAPOT, ""),
            LLMError::ProviderSpecific(_)
        ));
    }

    #[test]
    fn test_error_body_is_truncated() {
        let body = "x".repeat(1000);
        let LLMError::InvalidRequest(message) = status_error(StatusCode::BAD_REQUEST, &body) else {
            panic!("expected InvalidRequest");
        };
        assert!(message.starts_with("HTTP 400: "));
        assert_eq!(message.len(), "HTTP 400: ".len() + ERROR_BODY_PREVIEW);
    }
}
