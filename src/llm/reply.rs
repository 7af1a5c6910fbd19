//! Structured reply extraction
//!
//! Models are asked for JSON but answer with whatever they like: fenced code
//! blocks, a sentence of preamble, trailing commentary. [`parse_structured`]
//! strips the known wrappings and returns the first JSON object or array it
//! can find. It never panics; anything unusable is a [`MalformedReply`] and
//! the caller decides what to substitute.

use serde::de::DeserializeOwned;
use serde_json::Value;

const FENCE: &str = "```";

/// The reply did not contain a usable JSON structure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed reply: {reason}")]
pub struct MalformedReply {
    pub reason: String,
}

impl MalformedReply {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Extract a JSON object or array from free-form generated text.
pub fn parse_structured(text: &str) -> Result<Value, MalformedReply> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(MalformedReply::new("empty reply"));
    }

    candidates(trimmed)
        .into_iter()
        .find_map(|candidate| match serde_json::from_str::<Value>(candidate.trim()) {
            Ok(value @ (Value::Object(_) | Value::Array(_))) => Some(value),
            _ => None,
        })
        .ok_or_else(|| MalformedReply::new("no JSON object or array found"))
}

/// Extract and deserialize a reply into `T`.
pub fn parse_reply<T: DeserializeOwned>(text: &str) -> Result<T, MalformedReply> {
    let value = parse_structured(text)?;
    serde_json::from_value(value)
        .map_err(|e| MalformedReply::new(format!("unexpected shape: {}", e)))
}

/// Candidate slices in order of preference: the whole text, the body of each
/// fenced block, then the widest bracketed span.
fn candidates(text: &str) -> Vec<&str> {
    let mut out = vec![text];
    out.extend(fenced_blocks(text));
    out.extend(bracketed_span(text, '{', '}'));
    out.extend(bracketed_span(text, '[', ']'));
    out
}

fn fenced_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find(FENCE) {
        let after_open = &rest[open + FENCE.len()..];
        // Skip an info string such as `json` up to the end of the line.
        let body_start = match after_open.find('\n') {
            Some(nl) if !after_open[..nl].trim().contains(['{', '[']) => nl + 1,
            _ => 0,
        };
        let body = &after_open[body_start..];
        match body.find(FENCE) {
            Some(close) => {
                blocks.push(&body[..close]);
                rest = &body[close + FENCE.len()..];
            }
            None => {
                // Unterminated fence: take everything after it.
                blocks.push(body);
                break;
            }
        }
    }

    blocks
}

fn bracketed_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}
