pub mod accounts;
pub mod portal;
pub mod testimonials;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::app::AppState;
use crate::database::models::Testimonial;
use crate::error::AppError;
use crate::middleware::Principal;
use crate::policy::{self, Surface};
use crate::types::Operation;

/// `policy::authorize`, logging refusals
pub(crate) fn guard(
    surface: Surface,
    principal: &Principal,
    operation: Operation,
    target: Option<&Testimonial>,
) -> Result<(), AppError> {
    policy::authorize(surface, principal, operation, target).map_err(|denial| {
        tracing::info!(
            user = %principal.account().map(|a| a.username.as_str()).unwrap_or("anonymous"),
            ?surface,
            ?operation,
            ?denial,
            "Request denied"
        );
        AppError::from(denial)
    })
}

/// GET /health - store liveness
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.testimonials.count().await {
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
            tracing::error!("Health check failed: {}", e);
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

pub async fn not_found() -> AppError {
    AppError::not_found("Page not found")
}
