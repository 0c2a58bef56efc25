//! The per-turn consultation engine.
//!
//! One [`ConsultEngine::take_turn`] call is one doctor message: format the
//! prompt, ask the completion provider, clean the reply, record the exchange,
//! and dispatch speech. No retries; any failure leaves the session exactly as
//! it was — doctor and patient turns are recorded as a pair or not at all.

use std::sync::Arc;

use tracing::{debug, info};

use crate::pipeline::{clean_patient_response, format_prompt};
use crate::providers::{CompletionProvider, ProviderError};
use crate::session::ConsultSession;
use crate::speech::{speak_detached, SpeechSynthesizer};

/// Errors surfaced to the user for a failed turn.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    /// The completion service could not be reached at all.
    #[error("Error: Cannot connect to Ollama. Make sure Ollama is running.")]
    CannotConnect,
    /// The completion service answered with a non-success status.
    #[error("Error: {status} - {body}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Condensed response body.
        body: String,
    },
    /// Any other provider failure (transport, schema).
    #[error("Error querying model: {0}")]
    Provider(ProviderError),
    /// Cleaning left nothing usable to show or speak.
    #[error("Failed to generate response: {0}")]
    Unusable(String),
}

impl From<ProviderError> for TurnError {
    fn from(e: ProviderError) -> Self {
        if e.is_connect() {
            return Self::CannotConnect;
        }
        match e {
            ProviderError::HttpStatus { status, body } => Self::Upstream { status, body },
            other => Self::Provider(other),
        }
    }
}

/// Drives one consultation turn at a time.
///
/// Holds the completion provider and speech synthesizer behind trait objects;
/// the session is passed in per call and is the only state the engine
/// mutates.
pub struct ConsultEngine {
    provider: Arc<dyn CompletionProvider>,
    speech: Arc<dyn SpeechSynthesizer>,
    prompt_window: usize,
}

impl ConsultEngine {
    /// Build an engine over a provider and synthesizer.
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        speech: Arc<dyn SpeechSynthesizer>,
        prompt_window: usize,
    ) -> Self {
        Self {
            provider,
            speech,
            prompt_window,
        }
    }

    /// Run one doctor turn: produce, clean, record, and speak the patient
    /// reply. Returns the cleaned utterance.
    ///
    /// # Errors
    ///
    /// Returns [`TurnError`] on connectivity failure, upstream error status,
    /// or an unusable cleaned reply. In every error case the session history
    /// is untouched. Speech failures are not errors: the detached speech task
    /// logs a warning and the turn still counts.
    pub async fn take_turn(
        &self,
        session: &mut ConsultSession,
        doctor_input: &str,
    ) -> Result<String, TurnError> {
        let prompt = format_prompt(
            session.persona(),
            session.history(),
            doctor_input,
            self.prompt_window,
        );
        debug!(
            prompt_chars = prompt.len(),
            history_turns = session.history().len(),
            "prompt formatted"
        );

        let raw = self.provider.complete(&prompt).await?;

        let cleaned = clean_patient_response(&raw);
        if cleaned.is_empty() || cleaned.starts_with("Error") {
            return Err(TurnError::Unusable(raw));
        }

        session.record_exchange(doctor_input, &cleaned);
        info!(
            model = self.provider.model_id(),
            raw_chars = raw.len(),
            cleaned_chars = cleaned.len(),
            "turn completed"
        );

        speak_detached(Arc::clone(&self.speech), cleaned.clone());

        Ok(cleaned)
    }
}
