//! Request handlers for the HTTP front end.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use tracing::{debug, error, warn};

use super::AppState;
use crate::format::render_html;

/// Where every submission is redirected.
const CONFIRMATION_PATH: &str = "/message";

/// POST /<any path>
///
/// The body is forwarded as-is. Delivery is not confirmed, so the client is
/// redirected whether or not forwarding succeeded.
pub(super) async fn submit(State(state): State<AppState>, body: Bytes) -> Response {
    match state.sink.forward(&body).await {
        Ok(()) => debug!("Forwarded {} byte submission", body.len()),
        Err(e) if e.is_payload_too_large() => warn!("Dropping submission: {}", e),
        Err(e) => error!("Failed to forward submission: {}", e),
    }

    (StatusCode::FOUND, [(header::LOCATION, CONFIRMATION_PATH)]).into_response()
}

/// GET /read
///
/// The record file is read on the blocking thread pool.
pub(super) async fn read_page(State(state): State<AppState>) -> Response {
    match state.storage.load_async().await {
        Ok(store) => Html(render_html(&store)).into_response(),
        Err(e) => {
            error!("Cannot render records: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "record file unavailable").into_response()
        }
    }
}
