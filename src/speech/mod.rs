//! Speech-synthesis abstraction layer.
//!
//! The [`SpeechSynthesizer`] trait fronts a local speech service that accepts
//! plain text and plays it aloud. Synthesis is best-effort: playback failures
//! are logged as warnings and never fail a conversation turn. Dispatch goes
//! through [`speak_detached`], a spawned task with no join requirement, so a
//! new doctor message can be submitted while speech is still playing.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by speech synthesizers.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    /// HTTP transport failure.
    #[error("speech request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Speech service responded with an error status.
    #[error("speech service returned status {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Core speech-synthesis interface.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize and play the given text.
    ///
    /// # Errors
    ///
    /// Returns [`SpeechError`] if the service is unreachable or rejects the
    /// request. Callers treat failures as non-fatal.
    async fn speak(&self, text: &str) -> Result<(), SpeechError>;

    /// Check whether the service is reachable.
    async fn is_available(&self) -> bool;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

/// Speech synthesizer backed by a local HTTP speech service.
///
/// POSTs the plain utterance text to `<base_url>/say`; the service plays the
/// audio on the host and returns an empty 2xx on success.
#[derive(Debug, Clone)]
pub struct HttpSpeech {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSpeech {
    /// Create a speech client for the given service base URL.
    ///
    /// # Errors
    ///
    /// Returns [`SpeechError`] if the HTTP client cannot be constructed.
    pub fn new(base_url: &str, timeout: std::time::Duration) -> Result<Self, SpeechError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            client,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSpeech {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        if text.trim().is_empty() {
            return Ok(());
        }

        let url = format!("{}/say", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("content-type", "text/plain")
            .body(text.to_owned())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpeechError::HttpStatus(status.as_u16()));
        }
        Ok(())
    }

    async fn is_available(&self) -> bool {
        self.client.get(&self.base_url).send().await.is_ok()
    }
}

// ---------------------------------------------------------------------------
// Null implementation
// ---------------------------------------------------------------------------

/// No-op synthesizer used when speech is disabled in config.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSpeech;

#[async_trait]
impl SpeechSynthesizer for NullSpeech {
    async fn speak(&self, _text: &str) -> Result<(), SpeechError> {
        Ok(())
    }

    async fn is_available(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Dispatch an utterance to the synthesizer as a detached task.
///
/// The task is not joined and playback ordering relative to later turns is
/// not guaranteed. Failures are logged at `warn` and otherwise swallowed.
pub fn speak_detached(synth: Arc<dyn SpeechSynthesizer>, text: String) {
    tokio::spawn(async move {
        match synth.speak(&text).await {
            Ok(()) => debug!(chars = text.len(), "utterance dispatched to speech service"),
            Err(e) => warn!(error = %e, "speech synthesis failed (non-fatal)"),
        }
    });
}
