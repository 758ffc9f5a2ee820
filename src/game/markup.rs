//! Markup carried directly in the payload

use super::{placeholder_document, GameDescriptor, GameKind, GameResolver};
use serde::Deserialize;

const DOCUMENT_MARKERS: &[&str] = &["<!doctype", "<html", "<body", "<canvas", "<script"];

#[derive(Deserialize)]
struct Envelope {
    payload: String,
}

/// Uses the payload as the game document when it looks like one
#[derive(Debug, Default, Clone)]
pub struct MarkupExtraction;

impl MarkupExtraction {
    pub fn new() -> Self {
        Self
    }

    fn looks_like_document(markup: &str) -> bool {
        let lower = markup.to_ascii_lowercase();
        DOCUMENT_MARKERS.iter().any(|m| lower.contains(m))
    }

    fn invalid() -> GameDescriptor {
        GameDescriptor::new(
            GameKind::Unknown,
            placeholder_document(
                "INVALID GAME",
                "This message carried a game payload that could not be displayed.",
            ),
        )
    }
}

impl GameResolver for MarkupExtraction {
    fn resolve(&self, payload: Option<&str>) -> GameDescriptor {
        let Some(raw) = payload.map(str::trim).filter(|p| !p.is_empty()) else {
            return Self::invalid();
        };

        // A `{"payload": "..."}` envelope or the raw markup
        let markup = match serde_json::from_str::<Envelope>(raw) {
            Ok(envelope) => envelope.payload,
            Err(_) => raw.to_string(),
        };

        if Self::looks_like_document(&markup) {
            GameDescriptor::new(GameKind::Embedded, markup)
        } else {
            tracing::debug!(len = raw.len(), "Game payload is not a document");
            Self::invalid()
        }
    }

    fn name(&self) -> &'static str {
        "markup"
    }
}
