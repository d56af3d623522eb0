use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Push-to-talk gesture
        .route("/ptt/focus", post(handlers::focus))
        .route("/ptt/press", post(handlers::press))
        .route("/ptt/move", post(handlers::pointer_move))
        .route("/ptt/release", post(handlers::release))
        .route("/ptt/discard", post(handlers::discard))
        .route("/ptt/status", get(handlers::status))
        // Text chat
        .route("/chat/send", post(handlers::send_text))
        // Queries
        .route("/conversation", get(handlers::conversation))
        .route("/notices", get(handlers::notices))
        .route("/context", get(handlers::get_context).put(handlers::put_context))
        // Request logging, and CORS for browser-based clients
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
