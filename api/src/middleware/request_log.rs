//! Access log middleware
//!
//! Also enforces `BANNED_ROUTES` outside development.

use std::time::Instant;

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::display_client;
use crate::config::Config;
use crate::AppState;

/// Whether `url` is closed off under this config
pub fn is_banned(config: &Config, url: &str) -> bool {
    !config.development && config.banned_routes.iter().any(|route| url.contains(route.as_str()))
}

pub async fn request_log(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let started = Instant::now();
    let user = display_client(&request);
    let url = request.uri().to_string();

    if is_banned(&state.config, &url) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let response = next.run(request).await;
    let status = response.status().as_u16();
    let elapsed = format!("{:.5}s", started.elapsed().as_secs_f64());

    if !state.config.development {
        tracing::info!(%user, %url, status, %elapsed, "Request served");
        return response;
    }

    let (parts, body) = response.into_parts();
    match to_bytes(body, usize::MAX).await {
        Ok(bytes) => {
            match std::str::from_utf8(&bytes) {
                Ok(text) if !text.is_empty() => {
                    tracing::info!(%user, %url, status, %elapsed, body = text, "Request served")
                }
                _ => tracing::info!(%user, %url, status, %elapsed, "Request served"),
            }
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(e) => {
            tracing::error!(%user, %url, status, %elapsed, error = %e, "Response body could not be read");
            Response::from_parts(parts, Body::empty())
        }
    }
}
