//! Persona harvesting from the training corpus.
//!
//! At startup the persona list is built from the line-delimited JSON training
//! corpus: each record's `input` field is inspected and, when its first line
//! carries a `Persona:` marker, the text after the marker becomes a selectable
//! persona. A fixed fallback list covers missing or empty corpora.

use std::io::BufRead;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::config::PersonasConfig;

/// Marker prefix identifying a persona line inside a corpus record.
const PERSONA_MARKER: &str = "Persona:";

/// Built-in personas used when the corpus is absent or yields nothing.
const FALLBACK_PERSONAS: &[&str] = &[
    "65-year-old male with type 2 diabetes and hypertension, retired teacher",
    "28-year-old female nurse with anxiety and sleep issues",
    "45-year-old construction worker with lower back pain",
    "72-year-old female with mild cognitive impairment and arthritis",
    "35-year-old mother of two with postpartum depression",
    "19-year-old college student with eating disorder concerns",
    "58-year-old businessman with chest pain and high stress",
];

/// One record of the training corpus; only the `input` field matters here.
#[derive(Debug, Deserialize)]
struct CorpusRecord {
    #[serde(default)]
    input: String,
}

/// Resolve the persona list for a session: harvested from the corpus when
/// possible, the fallback list otherwise. Never empty.
pub fn load_personas(config: &PersonasConfig) -> Vec<String> {
    let harvested = harvest_personas(
        Path::new(&config.dataset),
        config.max_harvest,
        config.max_retained,
    );

    if harvested.is_empty() {
        info!("no personas harvested, using fallback list");
        return fallback_personas(config.max_retained);
    }

    info!(count = harvested.len(), path = %config.dataset, "personas harvested from corpus");
    harvested
}

/// The built-in fallback personas, truncated to `max_retained`.
pub fn fallback_personas(max_retained: usize) -> Vec<String> {
    FALLBACK_PERSONAS
        .iter()
        .take(max_retained)
        .map(|p| (*p).to_owned())
        .collect()
}

/// Harvest distinct personas from a line-delimited JSON corpus.
///
/// Reads records in order; a record contributes a persona when the first line
/// of its `input` field contains the `Persona:` marker. Harvesting stops once
/// `max_harvest` distinct personas are found; only the first `max_retained`
/// are returned. A malformed record aborts the scan with a warning, keeping
/// whatever was collected up to that point. A missing or unreadable file
/// returns an empty list.
pub fn harvest_personas(path: &Path, max_harvest: usize, max_retained: usize) -> Vec<String> {
    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) => {
            info!(path = %path.display(), error = %e, "persona corpus not readable");
            return Vec::new();
        }
    };

    let mut personas: Vec<String> = Vec::new();
    let reader = std::io::BufReader::new(file);

    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!(error = %e, "error reading persona corpus, stopping harvest");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let record: CorpusRecord = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "malformed corpus record, stopping harvest");
                break;
            }
        };

        if let Some(persona) = extract_persona(&record.input) {
            if !personas.contains(&persona) {
                personas.push(persona);
            }
        }

        if personas.len() >= max_harvest {
            break;
        }
    }

    personas.truncate(max_retained);
    personas
}

/// Pull the persona string out of a record's `input` field, if present.
///
/// Only the first line is inspected; every occurrence of the marker is
/// removed and the remainder trimmed. Returns `None` for lines without the
/// marker or with nothing left after stripping.
fn extract_persona(input: &str) -> Option<String> {
    let first_line = input.lines().next()?;
    if !first_line.contains(PERSONA_MARKER) {
        return None;
    }
    let persona = first_line.replace(PERSONA_MARKER, "").trim().to_owned();
    if persona.is_empty() {
        return None;
    }
    Some(persona)
}
