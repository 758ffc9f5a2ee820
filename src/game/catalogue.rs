//! Keyword catalogue of built-in games

use super::{placeholder_document, GameDescriptor, GameKind, GameResolver};
use rust_embed::Embed;
use serde::Deserialize;

#[derive(Embed)]
#[folder = "games"]
struct GameAssets;

/// Matched in order against the lower-cased `gameType`; first hit wins
const CATALOGUE: &[(&[&str], GameKind)] = &[
    (&["snake"], GameKind::Snake),
    (&["pong"], GameKind::Pong),
    (&["memory", "card"], GameKind::Memory),
    (&["breakout", "brick"], GameKind::Breakout),
    (&["flappy", "bird"], GameKind::Flappy),
    (&["tetris"], GameKind::Tetris),
];

const COMING_SOON: &str =
    "This game type is coming soon! Try asking for Snake, Pong, Memory, Breakout, Flappy, or Tetris.";

#[derive(Deserialize)]
struct Envelope {
    #[serde(default, rename = "gameType")]
    game_type: Option<serde_json::Value>,
}

/// Resolves `{"gameType": "..."}` payloads against the built-in games
#[derive(Debug, Default, Clone)]
pub struct KeywordCatalogue;

impl KeywordCatalogue {
    pub fn new() -> Self {
        Self
    }

    /// Catalogue entry for a game type, by substring match
    pub fn match_type(game_type: &str) -> Option<GameKind> {
        let game_type = game_type.to_lowercase();
        CATALOGUE
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| game_type.contains(k)))
            .map(|(_, kind)| *kind)
    }

    /// `gameType` from a JSON payload. `None` when the payload does not parse.
    fn game_type(payload: &str) -> Option<String> {
        let envelope: Envelope = serde_json::from_str(payload).ok()?;
        let game_type = match envelope.game_type {
            Some(serde_json::Value::String(s)) => s,
            _ => String::new(),
        };
        Some(game_type)
    }

    fn document(kind: GameKind) -> Option<String> {
        let file = GameAssets::get(&format!("{}.html", kind.as_str()))?;
        String::from_utf8(file.data.into_owned()).ok()
    }

    fn placeholder(game_type: &str) -> GameDescriptor {
        let label = if game_type.trim().is_empty() {
            "GAME".to_string()
        } else {
            game_type.to_uppercase()
        };
        GameDescriptor::new(GameKind::Unknown, placeholder_document(&label, COMING_SOON))
    }
}

impl GameResolver for KeywordCatalogue {
    fn resolve(&self, payload: Option<&str>) -> GameDescriptor {
        let Some(game_type) = payload.and_then(Self::game_type) else {
            return Self::placeholder("");
        };

        match Self::match_type(&game_type) {
            Some(kind) => match Self::document(kind) {
                Some(document) => GameDescriptor::new(kind, document),
                None => {
                    tracing::error!(kind = %kind, "Built-in game asset missing");
                    Self::placeholder(&game_type)
                }
            },
            None => Self::placeholder(&game_type),
        }
    }

    fn name(&self) -> &'static str {
        "keyword"
    }
}
