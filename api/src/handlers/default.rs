//! Service root routes

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use chrono::{Local, TimeDelta};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Status page in development, otherwise a redirect to `/health`
pub async fn index(
    State(state): State<AppState>,
    client: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Response {
    if !state.config.development {
        return Redirect::temporary("/health").into_response();
    }

    let now = Local::now();
    let (days, hours, minutes, seconds) = uptime_parts(now - state.started_at);
    let server_host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(strip_port)
        .unwrap_or("unknown");
    let client_ip = client
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let db = &state.config.s11_db;

    Html(format!(
        r#"<html>
    <body>
        <h1>[{now}]</h1>
        <h2>From last reload: {days} days, {hours} hours, {minutes} minutes, {seconds} seconds.</h2>
        <h2>Server local IP address: {server_host}</h2>
        <h2>Your IP Address: {client_ip}</h2>
        <h2>Database connection:</h2>
        <details>
            <summary></summary>
            <p><h3>Host: {db_host}</h3></p>
            <p><h3>Port: {db_port}</h3></p>
            <p><h3>User: {db_user}</h3></p>
            <p><h3>Password: ***</h3></p>
        </details>
        <h2>Log level</h2>
        <details>
            <summary></summary>
            <p><h3>Global: {level}</h3></p>
        </details>
        <h2>Service data</h2>
            <h3><a href='/health'>Health</a></h3>
    </body>
</html>
"#,
        now = now.format("%Y-%m-%d %H:%M:%S%.6f"),
        db_host = db.host,
        db_port = db.port,
        db_user = db.user,
        level = state.config.logger.level_name(),
    ))
    .into_response()
}

/// Split an uptime into days, hours, minutes and seconds
pub fn uptime_parts(delta: TimeDelta) -> (i64, i64, i64, i64) {
    let total = delta.num_seconds().max(0);
    let days = total / 86_400;
    let rest = total % 86_400;
    (days, rest / 3600, (rest % 3600) / 60, rest % 60)
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        // [v6]:port
        return host.split(']').next().map_or(host, |h| &h[1..]);
    }
    host.rsplit_once(':').map_or(host, |(name, _)| name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_is_split_into_units() {
        let delta = TimeDelta::days(2)
            + TimeDelta::hours(3)
            + TimeDelta::minutes(4)
            + TimeDelta::seconds(5);
        assert_eq!(uptime_parts(delta), (2, 3, 4, 5));
    }

    #[test]
    fn negative_uptime_is_zero() {
        assert_eq!(uptime_parts(TimeDelta::seconds(-10)), (0, 0, 0, 0));
    }

    #[test]
    fn host_header_port_is_dropped() {
        assert_eq!(strip_port("10.0.0.5:5055"), "10.0.0.5");
        assert_eq!(strip_port("vista.local"), "vista.local");
        assert_eq!(strip_port("[::1]:5055"), "::1");
    }
}
