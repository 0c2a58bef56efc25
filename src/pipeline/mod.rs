//! The prompt/response pipeline.
//!
//! The only non-trivial logic in the system: [`prompt::format_prompt`] turns
//! persona + trimmed history + new input into a bounded model prompt, and
//! [`cleaner::clean_patient_response`] turns the raw completion back into a
//! single speaker-label-free utterance. Both stages are pure functions.

pub mod cleaner;
pub mod prompt;

pub use cleaner::clean_patient_response;
pub use prompt::format_prompt;
