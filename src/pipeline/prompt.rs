//! Prompt assembly for the virtual patient.

use crate::session::ConversationTurn;

/// Build the model prompt from persona, recent history, and the new doctor
/// input.
///
/// Layout: a header stating the persona and instructing the model to answer
/// only as the patient, then at most the last `window` history turns rendered
/// as `Speaker: content` lines (oldest of the retained window first), then the
/// new doctor line when non-empty, then a closing instruction requesting only
/// the patient's reply. Always returns a prompt; never fails.
pub fn format_prompt(
    persona: &str,
    history: &[ConversationTurn],
    doctor_input: &str,
    window: usize,
) -> String {
    let mut prompt = format!("You are a virtual patient with this persona: {persona}\n\n");

    prompt.push_str(
        "Respond ONLY as the patient. Do not include any conversation history \
         or speaker labels in your response.\n",
    );
    prompt.push_str("Keep your response brief, realistic, and in character.\n\n");

    let start = history.len().saturating_sub(window);
    let recent = &history[start..];
    if !recent.is_empty() {
        prompt.push_str("Recent conversation:\n");
        for turn in recent {
            prompt.push_str(&format!("{}: {}\n", turn.speaker.label(), turn.content));
        }
    }

    if !doctor_input.trim().is_empty() {
        prompt.push_str(&format!("Doctor: {doctor_input}\n"));
    }

    prompt.push_str("\nRespond as the patient (your response only, no labels):");
    prompt
}
