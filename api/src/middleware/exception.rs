//! Panic catcher
//!
//! Turns a panic anywhere below this layer into a 500 plain-text report
//! and logs the same report.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures::FutureExt;

use super::display_client;

pub async fn catch_panic(request: Request<Body>, next: Next) -> Response {
    let started = Instant::now();
    let user = display_client(&request);
    let url = request.uri().to_string();

    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            let report = panic_report(
                &user,
                &url,
                started.elapsed().as_secs_f64(),
                &panic_message(panic.as_ref()),
            );
            tracing::error!("{}", report.replace("\n\n", "\n"));
            (StatusCode::INTERNAL_SERVER_ERROR, report).into_response()
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn panic_report(user: &str, url: &str, elapsed_secs: f64, message: &str) -> String {
    format!(
        "User: [{}]\n\nRequest: [{}]\n\nResponse: [500]\n\nResponse time: {:.5}s\n\nException: {}",
        user, url, elapsed_secs, message
    )
}
