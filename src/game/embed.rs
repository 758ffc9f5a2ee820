//! Sandboxed embedding of a resolved game

use super::{escape_html, GameDescriptor};

/// Header for documents served directly: scripts run, nothing else is allowed
pub const SANDBOX_CSP: &str = "sandbox allow-scripts";

const COLLAPSED_HEIGHT_PX: u32 = 360;
const EXPANDED_HEIGHT_PX: u32 = 520;

/// A game framed for inline display, with a collapse/expand toggle
#[derive(Debug, Clone)]
pub struct GameEmbed {
    game: GameDescriptor,
    expanded: bool,
}

impl GameEmbed {
    /// Starts collapsed
    pub fn new(game: GameDescriptor) -> Self {
        Self {
            game,
            expanded: false,
        }
    }

    #[must_use]
    pub fn expanded(mut self, expanded: bool) -> Self {
        self.expanded = expanded;
        self
    }

    #[allow(dead_code)] // Used by tests
    pub fn toggle(&mut self) {
        self.expanded = !self.expanded;
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn height_px(&self) -> u32 {
        if self.expanded {
            EXPANDED_HEIGHT_PX
        } else {
            COLLAPSED_HEIGHT_PX
        }
    }

    /// HTML fragment for the host page. The document only ever appears
    /// escaped inside `srcdoc`, so it cannot reach the host's DOM.
    pub fn render(&self) -> String {
        let title = escape_html(&self.game.title);
        let (toggle_label, next) = if self.is_expanded() {
            ("Collapse", false)
        } else {
            ("Expand", true)
        };

        let status = if self.game.is_playable() {
            r#"<span class="game-status">· PLAYABLE</span>"#
        } else {
            r#"<span class="game-status game-warning">⚠ Not playable</span>"#
        };

        format!(
            r#"<div class="game-embed" data-kind="{kind}" data-expanded="{expanded}">
  <div class="game-header">
    <span class="game-title">{title}</span>
    {status}
    <button class="game-toggle" type="button" data-expanded="{next}" title="{toggle_label}">{toggle_label}</button>
  </div>
  <div class="game-frame" style="height: {height}px">
    <iframe sandbox="allow-scripts" title="{title}" srcdoc="{srcdoc}"></iframe>
  </div>
  <div class="game-hint">Click inside the game to focus · Keyboard controls active</div>
</div>
"#,
            kind = self.game.kind,
            expanded = self.expanded,
            height = self.height_px(),
            srcdoc = escape_html(&self.game.document),
        )
    }
}
