//! Lenient extraction of text, thoughts and images from response envelopes.
//!
//! None of these helpers fail: a missing or oddly-shaped field yields an empty
//! result instead.

use super::types::{Part, ResponseEnvelope};
use base64::Engine as _;

fn first_candidate_parts(envelope: &ResponseEnvelope) -> &[Part] {
    envelope
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|content| content.parts.as_slice())
        .unwrap_or_default()
}

/// Joins every text-bearing part of the first candidate with newlines,
/// thought parts included.
pub fn parse_text_response(envelope: &ResponseEnvelope) -> String {
    first_candidate_parts(envelope)
        .iter()
        .filter_map(|p| p.text.as_deref())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Like [`parse_text_response`] but leaves out thought summaries.
pub fn parse_answer_text(envelope: &ResponseEnvelope) -> String {
    first_candidate_parts(envelope)
        .iter()
        .filter(|p| !p.is_thought())
        .filter_map(|p| p.text.as_deref())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Decodes inline images of the first candidate, followed by Imagen
/// predictions. Entries that fail to decode are skipped.
pub fn parse_image_response(envelope: &ResponseEnvelope) -> Vec<Vec<u8>> {
    let inline = first_candidate_parts(envelope)
        .iter()
        .filter_map(|p| p.inline_data.as_ref())
        .map(|d| d.data.as_str());

    let predicted = envelope
        .predictions
        .iter()
        .filter_map(|p| p.bytes_base64_encoded.as_deref());

    inline
        .chain(predicted)
        .filter(|data| !data.is_empty())
        .filter_map(|data| {
            base64::engine::general_purpose::STANDARD
                .decode(data)
                .map_err(|e| tracing::warn!("Skipping undecodable image payload: {}", e))
                .ok()
        })
        .collect()
}

/// Answer text and thought summaries of the first candidate, kept apart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThoughtSplit {
    /// Non-thought text parts, concatenated without separators.
    pub answer: String,
    /// Thought parts in order.
    pub thoughts: Vec<String>,
}

pub fn split_thoughts(envelope: &ResponseEnvelope) -> ThoughtSplit {
    let mut split = ThoughtSplit::default();
    for part in first_candidate_parts(envelope) {
        match (part.is_thought(), part.text.as_deref()) {
            (true, text) => split.thoughts.push(text.unwrap_or_default().to_string()),
            (false, Some(text)) => split.answer.push_str(text),
            (false, None) => {}
        }
    }
    split
}

/// Extracts the outermost `{...}` span of `text` and parses it as JSON.
pub fn extract_json_object(text: &str) -> Option<serde_json::Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}
