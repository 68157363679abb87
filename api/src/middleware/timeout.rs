//! Request timeout middleware

use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::AppState;

/// Answer 504 when the inner service runs past `config.timeout` seconds
pub async fn timeout(State(state): State<AppState>, request: Request<Body>, next: Next) -> Response {
    let limit = state.config.timeout;
    if limit == 0 {
        return next.run(request).await;
    }

    match tokio::time::timeout(Duration::from_secs(limit), next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(limit, "Request timed out");
            (
                StatusCode::GATEWAY_TIMEOUT,
                Json(json!({
                    "detail": format!("Request processing time exceeded limit {} seconds.", limit)
                })),
            )
                .into_response()
        }
    }
}
