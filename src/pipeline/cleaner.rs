//! Completion cleaning: strip speaker labels and boilerplate from raw model
//! output, leaving a single patient utterance.
//!
//! Local models frequently echo the conversation scaffold back: speaker
//! labels, markdown bold markers, horizontal rules, whole doctor lines. The
//! cleaner reduces a raw completion to just the patient's words. Rules live
//! in one static table (pattern → action) so the label inventory can be
//! audited and tested in one place.

/// What to do with a line (or string) matching a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelAction {
    /// Delete the pattern wherever it occurs in the line; keep the rest.
    /// Used for patient-side labels: the text after them is the reply.
    StripInline,
    /// Drop the whole line when its lowercased form contains the pattern.
    /// Used for doctor-side labels and scaffold headings.
    DropContaining,
    /// Drop the line when it is exactly the pattern.
    DropExact,
    /// Drop the line when it starts with the pattern.
    DropPrefix,
}

/// One cleaning rule.
#[derive(Debug, Clone, Copy)]
pub struct LabelRule {
    /// Substring to match. `DropContaining` patterns are lowercase and match
    /// against the lowercased line; the rest match case-sensitively.
    pub pattern: &'static str,
    /// How a match is handled.
    pub action: LabelAction,
}

/// The full cleaning table. `StripInline` rules apply first, longest pattern
/// first, so a line like `**Patient**: ...` keeps its content rather than
/// being discarded wholesale. Stripping can in principle delete legitimate
/// patient text that happens to contain a listed label (see DESIGN.md).
pub const LABEL_RULES: &[LabelRule] = &[
    // Patient-side labels: keep what follows.
    LabelRule { pattern: "The patient says:", action: LabelAction::StripInline },
    LabelRule { pattern: "Patient responds:", action: LabelAction::StripInline },
    LabelRule { pattern: "Patient replies:", action: LabelAction::StripInline },
    LabelRule { pattern: "Patient says:", action: LabelAction::StripInline },
    LabelRule { pattern: "**Patient**:", action: LabelAction::StripInline },
    LabelRule { pattern: "Patient:", action: LabelAction::StripInline },
    LabelRule { pattern: "Response:", action: LabelAction::StripInline },
    // Doctor-side labels and scaffold headings: the line is not patient speech.
    LabelRule { pattern: "doctor:", action: LabelAction::DropContaining },
    LabelRule { pattern: "patient:", action: LabelAction::DropContaining },
    LabelRule { pattern: "dr.:", action: LabelAction::DropContaining },
    LabelRule { pattern: "dr:", action: LabelAction::DropContaining },
    LabelRule { pattern: "**doctor**:", action: LabelAction::DropContaining },
    LabelRule { pattern: "**patient**:", action: LabelAction::DropContaining },
    LabelRule { pattern: "conversation:", action: LabelAction::DropContaining },
    LabelRule { pattern: "response:", action: LabelAction::DropContaining },
    LabelRule { pattern: "doctor says:", action: LabelAction::DropContaining },
    LabelRule { pattern: "patient says:", action: LabelAction::DropContaining },
    LabelRule { pattern: "doctor replies:", action: LabelAction::DropContaining },
    LabelRule { pattern: "patient replies:", action: LabelAction::DropContaining },
    // Bare punctuation artifacts.
    LabelRule { pattern: "*", action: LabelAction::DropExact },
    LabelRule { pattern: "**", action: LabelAction::DropExact },
    LabelRule { pattern: "---", action: LabelAction::DropExact },
    // Residual markup and honorifics at line start.
    LabelRule { pattern: "Dr.", action: LabelAction::DropPrefix },
    LabelRule { pattern: "Dr:", action: LabelAction::DropPrefix },
    LabelRule { pattern: "**", action: LabelAction::DropPrefix },
];

/// Reduce a raw model completion to a single speaker-label-free utterance.
///
/// Per line: strip patient-side labels in place, then drop the line if it is
/// blank, still carries a speaker label, or is a markup artifact. Survivors
/// are joined with single spaces; whitespace runs are collapsed and the
/// result trimmed. Pure and deterministic; cleaning an already-clean string
/// is a no-op.
pub fn clean_patient_response(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let mut kept: Vec<String> = Vec::new();

    for line in raw.trim().lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let stripped = strip_inline_labels(line);
        let stripped = stripped.trim();
        if stripped.is_empty() {
            continue;
        }

        if should_drop(stripped) {
            continue;
        }

        kept.push(stripped.to_owned());
    }

    let joined = kept.join(" ");
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Delete every occurrence of each `StripInline` pattern from the line.
fn strip_inline_labels(line: &str) -> String {
    let mut out = line.to_owned();
    for rule in LABEL_RULES {
        if rule.action == LabelAction::StripInline && out.contains(rule.pattern) {
            out = out.replace(rule.pattern, "");
        }
    }
    out
}

/// Whether a label-stripped line is scaffold rather than patient speech.
fn should_drop(line: &str) -> bool {
    let lower = line.to_lowercase();
    LABEL_RULES.iter().any(|rule| match rule.action {
        LabelAction::StripInline => false,
        LabelAction::DropContaining => lower.contains(rule.pattern),
        LabelAction::DropExact => line == rule.pattern,
        LabelAction::DropPrefix => line.starts_with(rule.pattern),
    })
}
