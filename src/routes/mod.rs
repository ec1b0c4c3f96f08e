use axum::Router;

use crate::state::SharedState;

pub mod bindings;
pub mod config;
pub mod docs;
pub mod health;
pub mod scores;
pub mod session;
pub mod sse;
pub mod websocket;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(session::router())
        .merge(config::router())
        .merge(bindings::router())
        .merge(scores::router())
        .merge(sse::router())
        .merge(websocket::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
