//! Unified error types for the Vista API
//!
//! This module defines error types for each layer:
//! - `DomainError`: Core business logic and persistence errors
//! - `VistaError`: Vista3 API client errors
//! - `CacheError`: Redis cache errors
//! - `AppError`: Application layer errors (wraps the others for HTTP responses)

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Vista3 API client errors
#[derive(Debug, Error)]
pub enum VistaError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

/// Redis cache errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Application layer errors - used by HTTP handlers
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("Vista error: {0}")]
    Vista(#[from] VistaError),

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

/// Error response body for JSON responses
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Domain(DomainError::Validation(msg)) => (
                StatusCode::BAD_REQUEST,
                "Validation error",
                Some(msg.clone()),
            ),
            AppError::Domain(DomainError::Database(msg)) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error",
                    Some(msg.clone()),
                )
            }
            AppError::Vista(e) => {
                tracing::error!("Vista error: {}", e);
                match e {
                    VistaError::Timeout => {
                        (StatusCode::GATEWAY_TIMEOUT, "Vista service timeout", None)
                    }
                    VistaError::Api { status, message } => {
                        let http_status = if *status == 404 {
                            StatusCode::NOT_FOUND
                        } else {
                            StatusCode::BAD_GATEWAY
                        };
                        (http_status, "Vista service error", Some(message.clone()))
                    }
                    _ => (StatusCode::BAD_GATEWAY, "Vista service error", None),
                }
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "Bad request", Some(msg.clone()))
            }
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            details,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let response =
            AppError::Domain(DomainError::Validation("bad table".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn vista_timeout_maps_to_gateway_timeout() {
        let response = AppError::Vista(VistaError::Timeout).into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn vista_api_errors_map_to_bad_gateway() {
        let response = AppError::Vista(VistaError::Api {
            status: 500,
            message: "boom".to_string(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let response = AppError::Vista(VistaError::Api {
            status: 404,
            message: "no such mse".to_string(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn bad_request_carries_details() {
        let response = AppError::BadRequest("start after end".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
