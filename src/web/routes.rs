use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    clear_history, delete_history, health_check, home, test_mode, track, AppState,
};
use super::static_files::serve_static;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/track", post(track))
        .route("/test", get(test_mode))
        .route("/delete-history", post(delete_history))
        .route("/clear-history", post(clear_history))
        .route("/health", get(health_check))
        .route("/static/{*path}", get(serve_static))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
