//! Conversation state for one consultation.
//!
//! A [`ConsultSession`] owns the active persona and the ordered turn history.
//! Turns are appended only in doctor/patient pairs and the history is capped:
//! once the cap is exceeded the oldest turns are evicted so the length
//! returns to the cap. The session is the only mutable state in the system
//! and is mutated exclusively by the consult engine.

use serde::{Deserialize, Serialize};

/// Conversation participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// The human user running the consultation.
    Doctor,
    /// The simulated patient.
    Patient,
}

impl Speaker {
    /// Display label used when rendering turns into a prompt.
    pub fn label(self) -> &'static str {
        match self {
            Self::Doctor => "Doctor",
            Self::Patient => "Patient",
        }
    }
}

/// One utterance by either participant. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Who spoke.
    pub speaker: Speaker,
    /// What was said.
    pub content: String,
}

/// In-memory state for a single consultation session.
#[derive(Debug, Clone)]
pub struct ConsultSession {
    persona: String,
    history: Vec<ConversationTurn>,
    cap: usize,
}

impl ConsultSession {
    /// Start a session for a persona with the given history cap.
    pub fn new(persona: &str, cap: usize) -> Self {
        Self {
            persona: persona.to_owned(),
            history: Vec::new(),
            cap,
        }
    }

    /// The active persona description.
    pub fn persona(&self) -> &str {
        &self.persona
    }

    /// The full retained history, oldest first.
    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    /// The most recent `n` turns, oldest of the retained window first.
    pub fn recent(&self, n: usize) -> &[ConversationTurn] {
        let start = self.history.len().saturating_sub(n);
        &self.history[start..]
    }

    /// Record one doctor/patient exchange atomically, then enforce the cap.
    ///
    /// The pair is appended together so that no partial turn is ever visible;
    /// callers must only invoke this once a usable patient reply exists.
    pub fn record_exchange(&mut self, doctor: &str, patient: &str) {
        self.history.push(ConversationTurn {
            speaker: Speaker::Doctor,
            content: doctor.to_owned(),
        });
        self.history.push(ConversationTurn {
            speaker: Speaker::Patient,
            content: patient.to_owned(),
        });

        let excess = self.history.len().saturating_sub(self.cap);
        if excess > 0 {
            self.history.drain(..excess);
        }
    }

    /// Clear the history, keeping the persona.
    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// Switch to a new persona. The history is cleared: turns belong to the
    /// persona they were spoken under.
    pub fn set_persona(&mut self, persona: &str) {
        self.persona = persona.to_owned();
        self.history.clear();
    }
}
