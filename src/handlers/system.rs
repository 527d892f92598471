use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

/// GET / - Service banner
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": "TuneHub API",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": format!("{:?}", state.config.environment).to_lowercase(),
        "endpoints": {
            "users": ["/api/users", "/api/users/signup", "/api/users/login", "/api/users/ban"],
            "audios": ["/api/audios", "/api/audios/search"],
            "categories": ["/api/categories"],
            "playlists": ["/api/playlists", "/api/playlists/user/:userId", "/api/playlists/liked/add/:audioId"],
            "uploads": ["/uploads/audios", "/uploads/pictures"]
        }
    }))
}

/// GET /health - Store liveness
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let backend = state.store.backend_name();
    let timestamp = chrono::Utc::now().to_rfc3339();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({"status": "ok", "store": backend, "timestamp": timestamp})),
        ),
        Err(e) => {
            tracing::error!("Health check failed for {} store: {}", backend, e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "unavailable", "store": backend, "timestamp": timestamp})),
            )
        }
    }
}

/// Fallback for unmatched routes
pub async fn not_found() -> ApiError {
    ApiError::not_found("Page not found")
}
