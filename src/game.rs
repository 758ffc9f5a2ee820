//! Game dispatch resolver
//!
//! Turns the optional `gamePayload` carried by an assistant message into a
//! document that can be rendered inside a sandboxed frame. Two strategies
//! exist and exactly one is active at a time:
//!
//! - [`KeywordCatalogue`] matches a `gameType` field against a fixed set of
//!   hand-authored games shipped inside the binary.
//! - [`MarkupExtraction`] treats the payload itself as the document.
//!
//! Resolution never fails. Anything that cannot be played resolves to a
//! placeholder document.

mod catalogue;
mod embed;
mod markup;

pub use catalogue::KeywordCatalogue;
pub use embed::{GameEmbed, SANDBOX_CSP};
pub use markup::MarkupExtraction;

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// What a payload resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    Snake,
    Pong,
    Memory,
    Breakout,
    Flappy,
    Tetris,
    /// Markup carried directly in the payload
    Embedded,
    /// Placeholder
    Unknown,
}

impl GameKind {
    /// Header label shown above the frame
    pub fn title(self) -> &'static str {
        match self {
            GameKind::Snake => "🐍 Snake",
            GameKind::Pong => "🏓 Pong",
            GameKind::Memory => "🃏 Memory Cards",
            GameKind::Breakout => "🧱 Breakout",
            GameKind::Flappy => "🐦 Flappy Bird",
            GameKind::Tetris => "🟦 Tetris",
            GameKind::Embedded | GameKind::Unknown => "🎮 Game",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GameKind::Snake => "snake",
            GameKind::Pong => "pong",
            GameKind::Memory => "memory",
            GameKind::Breakout => "breakout",
            GameKind::Flappy => "flappy",
            GameKind::Tetris => "tetris",
            GameKind::Embedded => "embedded",
            GameKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved, renderable game. Derived on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameDescriptor {
    pub kind: GameKind,
    pub title: String,
    /// Complete standalone HTML document
    pub document: String,
}

impl GameDescriptor {
    pub fn new(kind: GameKind, document: impl Into<String>) -> Self {
        Self {
            kind,
            title: kind.title().to_string(),
            document: document.into(),
        }
    }

    pub fn is_playable(&self) -> bool {
        self.kind != GameKind::Unknown
    }
}

/// Maps a raw payload to a descriptor. Must be pure: the same input always
/// yields the same descriptor.
pub trait GameResolver: Send + Sync {
    fn resolve(&self, payload: Option<&str>) -> GameDescriptor;

    /// Identifier used in logs
    fn name(&self) -> &'static str;
}

impl<T: GameResolver + ?Sized> GameResolver for Arc<T> {
    fn resolve(&self, payload: Option<&str>) -> GameDescriptor {
        (**self).resolve(payload)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Which resolver the client runs with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResolverStrategy {
    #[default]
    Keyword,
    Markup,
}

impl ResolverStrategy {
    pub fn build(self) -> Arc<dyn GameResolver> {
        match self {
            ResolverStrategy::Keyword => Arc::new(KeywordCatalogue::new()),
            ResolverStrategy::Markup => Arc::new(MarkupExtraction::new()),
        }
    }
}

impl FromStr for ResolverStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyword" | "catalogue" | "catalog" => Ok(ResolverStrategy::Keyword),
            "markup" | "embedded" => Ok(ResolverStrategy::Markup),
            other => Err(format!("unknown game resolver: {other}")),
        }
    }
}

/// Escape text for use inside HTML content or a double-quoted attribute
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Standalone document shown in place of a game
pub(crate) fn placeholder_document(heading: &str, detail: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<style>
  * {{ margin: 0; padding: 0; box-sizing: border-box; }}
  body {{
    background: #0b0d12;
    color: #7dd3fc;
    font-family: ui-monospace, Menlo, monospace;
    display: flex;
    flex-direction: column;
    align-items: center;
    justify-content: center;
    gap: 10px;
    height: 100vh;
    text-align: center;
  }}
  h2 {{ font-size: 19px; letter-spacing: 0.08em; }}
  p {{ color: #9ca3af; font-size: 13px; max-width: 280px; line-height: 1.5; }}
</style>
</head>
<body>
  <h2>🎮 {}</h2>
  <p>{}</p>
</body>
</html>
"#,
        escape_html(heading),
        escape_html(detail)
    )
}
