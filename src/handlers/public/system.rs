use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::DatabaseManager;

/// GET / - service banner
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "RM Dashboard API",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "auth": "/api/auth/* (login is public, user management requires admin)",
                "permissions": "/api/permissions/* (protected, admin for changes)",
                "overview": "/api/overview/* (protected)",
                "customer_list": "/api/customer-list/* (protected)",
                "customer_details": "/api/customer-details/* (protected)",
                "task_manager": "/api/task-manager/* (protected)",
                "market_indices": "/api/market-indices/* (protected)",
                "market_news": "/api/market-news/* (protected)",
                "dashboard_targets": "/api/dashboard-targets (protected)"
            }
        }
    }))
}

/// GET /health - liveness plus a database ping
pub async fn health() -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}

/// Unknown routes
pub async fn fallback() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "error": "Resource not found"
        })),
    )
}
