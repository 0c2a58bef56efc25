//! Consult engine turn-taking and error-taxonomy tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use bedside::consult::{ConsultEngine, TurnError};
use bedside::providers::{CompletionProvider, ProviderError};
use bedside::session::ConsultSession;
use bedside::speech::{NullSpeech, SpeechError, SpeechSynthesizer};

/// Provider stub returning a canned outcome for every call.
struct StubProvider {
    outcome: StubOutcome,
}

enum StubOutcome {
    Reply(&'static str),
    HttpStatus(u16, &'static str),
}

#[async_trait]
impl CompletionProvider for StubProvider {
    async fn complete(&self, _prompt: &str) -> Result<String, ProviderError> {
        match self.outcome {
            StubOutcome::Reply(text) => Ok(text.to_owned()),
            StubOutcome::HttpStatus(status, body) => Err(ProviderError::HttpStatus {
                status,
                body: body.to_owned(),
            }),
        }
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn model_id(&self) -> &str {
        "stub"
    }
}

/// Synthesizer stub recording every utterance it is asked to speak.
#[derive(Default)]
struct RecordingSpeech {
    spoken: Mutex<Vec<String>>,
}

#[async_trait]
impl SpeechSynthesizer for RecordingSpeech {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        if let Ok(mut spoken) = self.spoken.lock() {
            spoken.push(text.to_owned());
        }
        Ok(())
    }

    async fn is_available(&self) -> bool {
        true
    }
}

/// Synthesizer stub that always fails.
struct BrokenSpeech;

#[async_trait]
impl SpeechSynthesizer for BrokenSpeech {
    async fn speak(&self, _text: &str) -> Result<(), SpeechError> {
        Err(SpeechError::HttpStatus(503))
    }

    async fn is_available(&self) -> bool {
        false
    }
}

fn engine_with(outcome: StubOutcome, speech: Arc<dyn SpeechSynthesizer>) -> ConsultEngine {
    ConsultEngine::new(Arc::new(StubProvider { outcome }), speech, 3)
}

#[tokio::test]
async fn successful_turn_records_pair_and_returns_cleaned_reply() {
    let engine = engine_with(
        StubOutcome::Reply("Patient: I feel fine today.\nDoctor: good"),
        Arc::new(NullSpeech),
    );
    let mut session = ConsultSession::new("persona", 20);

    let reply = engine
        .take_turn(&mut session, "How are you?")
        .await
        .expect("turn should succeed");

    assert_eq!(reply, "I feel fine today.");
    assert_eq!(session.history().len(), 2);
    assert_eq!(session.history()[0].content, "How are you?");
    assert_eq!(session.history()[1].content, "I feel fine today.");
}

#[tokio::test]
async fn upstream_error_surfaces_status_and_leaves_session_untouched() {
    let engine = engine_with(
        StubOutcome::HttpStatus(500, "model crashed"),
        Arc::new(NullSpeech),
    );
    let mut session = ConsultSession::new("persona", 20);

    let result = engine.take_turn(&mut session, "Hello?").await;

    let err = match result {
        Err(err) => err,
        Ok(reply) => panic!("turn should fail, got reply: {reply}"),
    };
    assert!(matches!(err, TurnError::Upstream { status: 500, .. }));
    assert_eq!(err.to_string(), "Error: 500 - model crashed");
    assert!(err.to_string().contains("500"));
    assert!(session.history().is_empty());
}

#[tokio::test]
async fn unusable_reply_is_an_error_with_no_history_mutation() {
    // Everything in the raw completion is scaffold; cleaning leaves nothing.
    let engine = engine_with(
        StubOutcome::Reply("**Doctor**: noted\n---\n**"),
        Arc::new(NullSpeech),
    );
    let mut session = ConsultSession::new("persona", 20);

    let result = engine.take_turn(&mut session, "Hello?").await;

    assert!(matches!(result, Err(TurnError::Unusable(_))));
    assert!(session.history().is_empty());
}

#[tokio::test]
async fn error_prefixed_cleaned_reply_is_rejected() {
    let engine = engine_with(
        StubOutcome::Reply("Error querying model: out of memory"),
        Arc::new(NullSpeech),
    );
    let mut session = ConsultSession::new("persona", 20);

    let result = engine.take_turn(&mut session, "Hello?").await;
    assert!(matches!(result, Err(TurnError::Unusable(_))));
    assert!(session.history().is_empty());
}

#[tokio::test]
async fn connect_failure_maps_to_fixed_cannot_connect_message() {
    use bedside::config::GenerationConfig;
    use bedside::providers::ollama::OllamaProvider;

    // Nothing listens on the discard port; connection is refused.
    let provider = OllamaProvider::new(
        "http://127.0.0.1:9",
        "virtual-patient",
        GenerationConfig::default(),
        Duration::from_secs(5),
    )
    .expect("provider should build");
    let engine = ConsultEngine::new(Arc::new(provider), Arc::new(NullSpeech), 3);
    let mut session = ConsultSession::new("persona", 20);

    let result = engine.take_turn(&mut session, "Hello?").await;

    let err = match result {
        Err(err) => err,
        Ok(reply) => panic!("turn should fail, got reply: {reply}"),
    };
    assert!(matches!(err, TurnError::CannotConnect));
    assert_eq!(
        err.to_string(),
        "Error: Cannot connect to Ollama. Make sure Ollama is running."
    );
    assert!(session.history().is_empty());
}

#[tokio::test]
async fn cleaned_reply_is_dispatched_to_speech() {
    let speech = Arc::new(RecordingSpeech::default());
    let engine = engine_with(
        StubOutcome::Reply("Patient: My back hurts."),
        Arc::clone(&speech) as Arc<dyn SpeechSynthesizer>,
    );
    let mut session = ConsultSession::new("persona", 20);

    engine
        .take_turn(&mut session, "Where does it hurt?")
        .await
        .expect("turn should succeed");

    // Dispatch is fire-and-forget; give the detached task a moment.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let spoken = speech.spoken.lock().expect("lock should not be poisoned");
    assert_eq!(spoken.as_slice(), ["My back hurts."]);
}

#[tokio::test]
async fn speech_failure_does_not_fail_the_turn() {
    let engine = engine_with(
        StubOutcome::Reply("Patient: Still sore."),
        Arc::new(BrokenSpeech),
    );
    let mut session = ConsultSession::new("persona", 20);

    let reply = engine
        .take_turn(&mut session, "And today?")
        .await
        .expect("speech failure must not fail the turn");

    assert_eq!(reply, "Still sore.");
    assert_eq!(session.history().len(), 2);
}
