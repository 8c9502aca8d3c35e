pub mod api;
pub mod state;
pub mod utils;

use axum::{http::StatusCode, response::Response, routing::get, Router};
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use self::state::AppState;
use self::utils::errors::{error_response, not_found_json};

/// 路由定义
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/inspect", get(api::inspect::handler))
        .route("/api/playback", get(api::playback::handler))
        .fallback(not_found)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, not_found_json("no such route"))
}
