//! Axum router assembly.

use axum::Router;
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::connection;
use crate::state::HubState;

/// Build the top-level axum [`Router`].
///
/// `/ws` upgrades into the client protocol; `/health` answers liveness
/// probes. A [`TraceLayer`] logs each request at `DEBUG` level.
pub fn build(state: HubState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(ws_upgrade))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn ws_upgrade(State(state): State<HubState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| connection::serve(state, socket))
}

async fn health_check() -> &'static str {
    "OK"
}
