//! HTTP front end.
//!
//! Serves the static pages from the web root, renders stored records at
//! `/read` and forwards every POST body to a [`PayloadSink`]. Handlers never
//! write to the record file.

mod handlers;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, get_service, post};
use axum::Router;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::Config;
use crate::relay::PayloadSink;
use crate::storage::Storage;

/// Shared state of the HTTP handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    storage: Storage,
    sink: Arc<dyn PayloadSink>,
}

impl AppState {
    /// Create handler state reading from `storage` and forwarding to `sink`.
    #[must_use]
    pub fn new(storage: Storage, sink: Arc<dyn PayloadSink>) -> Self {
        Self { storage, sink }
    }
}

/// Build the complete application:
/// - `GET /`, `GET /message`: static pages
/// - `GET /read`: stored records as HTML
/// - `GET /<path>`: files under the web root, `error.html` with 404 otherwise
/// - `POST /<any path>`: forward the body, redirect to `/message`
pub fn router(state: AppState, config: &Config) -> Router {
    let root = &config.web.root;
    let assets = ServeDir::new(root).not_found_service(ServeFile::new(root.join("error.html")));

    Router::new()
        .route(
            "/",
            get_service(ServeFile::new(root.join("index.html"))).post(handlers::submit),
        )
        .route(
            "/message",
            get_service(ServeFile::new(root.join("message.html"))).post(handlers::submit),
        )
        .route("/read", get(handlers::read_page).post(handlers::submit))
        .route("/*path", post(handlers::submit).fallback_service(assets))
        .layer(DefaultBodyLimit::max(config.http.body_limit))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
