use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router with all boothbook endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route(
            "/api/submit",
            post(handler::submit_handler).fallback(handler::method_not_allowed),
        )
        .route(
            "/api/update",
            post(handler::update_handler).fallback(handler::method_not_allowed),
        )
        .route(
            "/api/cleanup",
            post(handler::cleanup_handler).fallback(handler::method_not_allowed),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
