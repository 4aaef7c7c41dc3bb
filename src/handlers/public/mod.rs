use axum::{http::StatusCode, Extension};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};

/// GET / - service description
pub async fn root() -> ApiResult<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Ok(ApiResponse::success(json!({
        "name": "navdesk-api",
        "version": version,
        "description": "Role page assignment, hierarchical ordering and navigation resolution",
        "endpoints": {
            "page_order": "/api/roles/:role_id/pages (GET read, PUT save)",
            "page_edit": "/api/roles/:role_id/pages/edit (POST operation batch)",
            "role_tree": "/api/roles/:role_id/tree",
            "user_navigation": "/api/users/:user_id/navigation",
            "navigation": "/api/navigation (bearer token)",
        }
    })))
}

/// GET /health - store connectivity
pub async fn health(Extension(state): Extension<AppState>) -> ApiResponse<Value> {
    let now = chrono::Utc::now();

    match state.resolution.store().health_check().await {
        Ok(()) => ApiResponse::success(json!({
            "status": "ok",
            "timestamp": now,
            "store": "ok"
        })),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            ApiResponse::with_status(
                json!({
                    "status": "degraded",
                    "timestamp": now,
                    "store_error": e.to_string()
                }),
                StatusCode::SERVICE_UNAVAILABLE,
            )
        }
    }
}
