//! Bedside — a terminal virtual-patient consultation simulator.
//!
//! A doctor (you) converses in text with an LLM patient persona served by a
//! local Ollama instance. Patient replies are cleaned of speaker labels and
//! optionally spoken aloud through a local speech-synthesis service.
//!
//! See `DESIGN.md` for architecture documentation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod consult;
pub mod logging;
pub mod personas;
pub mod pipeline;
pub mod providers;
pub mod session;
pub mod speech;
