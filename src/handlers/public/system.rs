use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - Service information
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "KMCI API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Product catalog and account API",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "login": "/auth/login (public - token acquisition)",
                "auth": "/api/auth/whoami, /api/auth/password (signed in)",
                "products": "/api/products[/:id] (public read, editor/super_admin write)",
                "products_lookup": "/api/products/slug/:slug, /api/products/low-stock",
                "users": "/api/users[/:id/unlock] (super_admin)",
            }
        }
    }))
}

/// GET /health - Store health; 503 when the backing store is unreachable
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let backend = state.health.backend();

    match state.health.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": backend,
                }
            })),
        ),
        Err(e) => {
            tracing::error!(backend, error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database": backend,
                    }
                })),
            )
        }
    }
}
