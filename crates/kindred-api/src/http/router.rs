//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`.
//! Middleware: CORS, tracing.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Companion chat
        .route("/ai/chat", post(handlers::chat::send_message))
        .route(
            "/ai/history",
            get(handlers::chat::get_history).delete(handlers::chat::clear_history),
        )
        // Custom personas
        .route(
            "/personas",
            post(handlers::persona::create_persona).get(handlers::persona::list_personas),
        )
        .route(
            "/personas/{id}",
            get(handlers::persona::get_persona)
                .put(handlers::persona::update_persona)
                .delete(handlers::persona::delete_persona),
        )
        .route(
            "/personas/{id}/activate",
            post(handlers::persona::activate_persona),
        )
        // Users
        .route("/users/me", get(handlers::user::get_me))
        .route("/users/{id}", get(handlers::user::get_user));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint (no auth required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
