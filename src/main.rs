//! GameChat - local client for a remote game-building chat service
//!
//! Holds the client-side conversation state (cached history plus one
//! optimistic pending message) and serves a small browser view that can
//! play the games the assistant returns.

mod api;
mod backend;
mod config;
mod game;
mod query;
mod runtime;
mod state_machine;

use api::{create_router, AppState};
use backend::{HttpConversationService, LoggingService};
use config::ClientConfig;
use query::QueryClient;
use runtime::ChatRuntime;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gamechat=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = ClientConfig::from_env();
    tracing::info!(
        backend = ?config.backend_url,
        send_timeout_secs = ?config.send_timeout.map(|t| t.as_secs()),
        resolver = ?config.game_resolver,
        "Configuration loaded"
    );

    // Query layer and controller
    let query = Arc::new(QueryClient::new());
    let chat = ChatRuntime::spawn(query, config.runtime());

    match &config.backend_url {
        Some(url) => {
            let http = HttpConversationService::new(url, config.http_timeout)?;
            tracing::info!(url = http.base_url(), "Connecting to conversation service");
            let service = Arc::new(LoggingService::new(Arc::new(http)));
            chat.connect(service).await?;
        }
        None => {
            tracing::warn!("GAMECHAT_BACKEND_URL not set; running disconnected");
        }
    }

    let resolver = config.game_resolver.build();
    tracing::info!(resolver = resolver.name(), "Game resolver ready");

    let state = AppState::new(chat, resolver);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    // Local view only
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    tracing::info!("GameChat listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
