//! Shared HTTP plumbing for the adapters
//!
//! One POST per generation, no retries. Status and decode failures are mapped
//! to [`ProviderError`] with the provider name attached.

use reqwest::{header, Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ProviderSettings;
use crate::error::{ProviderError, ProviderResult};

/// Build a JSON client for one adapter
pub(crate) fn build_client(provider: &str, settings: &ProviderSettings) -> ProviderResult<Client> {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );

    Client::builder()
        .timeout(settings.timeout)
        .connect_timeout(settings.connect_timeout)
        .user_agent(&settings.user_agent)
        .default_headers(headers)
        .gzip(true)
        .brotli(true)
        .build()
        .map_err(|source| ProviderError::Http {
            provider: provider.to_string(),
            source,
        })
}

/// Reject credentials that could never authenticate
pub(crate) fn require_api_key(provider: &str, api_key: String) -> ProviderResult<String> {
    if api_key.trim().is_empty() {
        return Err(ProviderError::Configuration {
            provider: provider.to_string(),
            message: "api key is empty".to_string(),
        });
    }
    Ok(api_key)
}

/// Send a prepared request and decode a successful JSON body
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: &str,
    request: RequestBuilder,
) -> ProviderResult<T> {
    let response = request.send().await.map_err(|source| ProviderError::Http {
        provider: provider.to_string(),
        source,
    })?;

    let status = response.status();
    let text = response.text().await.map_err(|source| ProviderError::Http {
        provider: provider.to_string(),
        source,
    })?;

    if !status.is_success() {
        return Err(error_from_status(provider, status, &text));
    }

    debug!(provider, body_len = text.len(), "Received response");

    serde_json::from_str(&text).map_err(|e| ProviderError::Decode {
        provider: provider.to_string(),
        message: e.to_string(),
    })
}

fn error_from_status(provider: &str, status: StatusCode, body: &str) -> ProviderError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        warn!(provider, "Rate limited by provider");
    }

    ProviderError::Status {
        provider: provider.to_string(),
        status: status.as_u16(),
        message: extract_error_message(body),
    }
}

/// Both vendors nest the message under `error.message`; fall back to the raw body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_error_message_from_vendor_shape() {
        let body = r#"{"error": {"type": "invalid_request_error", "message": "model not found"}}"#;
        assert_eq!(extract_error_message(body), "model not found");
    }

    #[test]
    fn test_extract_error_message_falls_back_to_body() {
        assert_eq!(extract_error_message(" upstream timeout \n"), "upstream timeout");
    }
}
