//! Local HTTP surface for the browser view
//!
//! The browser renders whatever the chat runtime publishes; every state
//! change goes through the routes here.

mod assets;
mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::game::GameResolver;
use crate::runtime::ChatHandle;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub chat: ChatHandle,
    pub resolver: Arc<dyn GameResolver>,
}

impl AppState {
    pub fn new(chat: ChatHandle, resolver: Arc<dyn GameResolver>) -> Self {
        Self { chat, resolver }
    }
}
