//! Shared HTTP plumbing for the search sources.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use super::config::GatewayConfig;
use crate::error::SearchError;

/// Maximum response excerpt kept in an error message.
const MAX_ERROR_EXCERPT: usize = 200;

/// Builds the HTTP client shared by every source.
///
/// # Errors
///
/// Returns [`SearchError::Transport`] if the TLS backend cannot initialise.
pub fn build_client(config: &GatewayConfig) -> Result<Client, SearchError> {
    Ok(Client::builder()
        .timeout(config.timeout)
        .user_agent(&config.user_agent)
        .build()?)
}

/// Maps a non-success status to [`SearchError::Http`].
///
/// The body excerpt (or the canonical reason phrase) becomes the message.
pub async fn ensure_success(response: Response) -> Result<Response, SearchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let excerpt = excerpt(&body);
    let message = if excerpt.is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        excerpt
    };
    Err(SearchError::Http {
        status: status.as_u16(),
        message,
    })
}

/// Reads the body and decodes it as JSON.
///
/// Decode failures are permanent ([`SearchError::Malformed`]); body read
/// failures stay transient.
pub async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, SearchError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| SearchError::Malformed {
        message: format!("{e} (body: {})", excerpt(&body)),
    })
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_ERROR_EXCERPT) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
