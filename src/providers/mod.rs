//! Completion-service abstraction layer.
//!
//! Defines the [`CompletionProvider`] trait and the error type shared by
//! provider implementations. One provider is implemented:
//! [`ollama::OllamaProvider`] — Ollama `/api/generate` API.
//!
//! The consult engine holds a `dyn CompletionProvider` so turn logic can be
//! tested against stub providers without a running model server.

use async_trait::async_trait;

pub mod ollama;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by completion providers.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// HTTP transport failure.
    #[error("provider request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Response did not match expected schema.
    #[error("provider response parse error: {0}")]
    Parse(String),
    /// Upstream provider responded with an error status.
    #[error("provider returned non-success status {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },
}

impl ProviderError {
    /// Whether this error is a failure to reach the service at all.
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Request(e) if e.is_connect())
    }
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

/// Check HTTP response status and return body text or a structured error.
///
/// # Errors
///
/// Returns `ProviderError::Request` on transport failure, `ProviderError::HttpStatus` on non-2xx.
pub async fn check_http_response(response: reqwest::Response) -> Result<String, ProviderError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ProviderError::HttpStatus {
            status: status.as_u16(),
            body: condense_http_error_body(&body),
        });
    }
    Ok(body)
}

fn condense_http_error_body(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    const MAX_ERROR_BODY_CHARS: usize = 256;
    if collapsed.chars().count() > MAX_ERROR_BODY_CHARS {
        let shortened = collapsed
            .chars()
            .take(MAX_ERROR_BODY_CHARS)
            .collect::<String>();
        return format!("{shortened}...[truncated]");
    }

    collapsed
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Core completion-service interface.
///
/// Implementations must be `Send + Sync` so the engine can share them across
/// async task boundaries.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Request a raw text completion for a fully formatted prompt.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on API, network, or parse failure.
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Check whether the service is reachable.
    async fn is_available(&self) -> bool;

    /// The model identifier this provider is instantiated for.
    fn model_id(&self) -> &str;
}
