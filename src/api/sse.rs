//! Server-Sent Events support

use super::types::ConversationResponse;
use crate::runtime::{ChatView, ViewEvent};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Current snapshot first, then every published change
pub fn sse_stream(
    init: ChatView,
    broadcast_rx: tokio::sync::broadcast::Receiver<ViewEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let init = futures::stream::once(async move {
        Ok(Event::default()
            .event("init")
            .data(view_json("init", init).to_string()))
    });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(event) => Some(Ok(view_event_to_axum(event))),
        // Lagged: the next view carries the full state anyway
        Err(_) => None,
    });

    Sse::new(init.chain(broadcasts)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn view_json(event_type: &str, view: ChatView) -> serde_json::Value {
    json!({
        "type": event_type,
        "view": ConversationResponse::from(view),
    })
}

fn view_event_to_axum(event: ViewEvent) -> Event {
    let (event_type, data) = match event {
        ViewEvent::View(view) => ("view", view_json("view", view)),
        ViewEvent::Error { message } => (
            "error",
            json!({
                "type": "error",
                "message": message
            }),
        ),
    };

    Event::default().event(event_type).data(data.to_string())
}
