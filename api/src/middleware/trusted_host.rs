//! Client IP allow-list middleware

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use regex::RegexSet;

use super::client_addr;
use crate::AppState;

/// Compiled `TRUSTED_HOSTS` patterns
#[derive(Debug, Clone)]
pub struct TrustedHosts {
    patterns: RegexSet,
}

impl TrustedHosts {
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            patterns: RegexSet::new(patterns)?,
        })
    }

    /// Whether any pattern matches somewhere in `host`
    pub fn allows(&self, host: &str) -> bool {
        self.patterns.is_match(host)
    }
}

pub async fn trusted_host(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(addr) = client_addr(&request) else {
        return next.run(request).await;
    };

    let host = addr.ip().to_string();
    if state.trusted_hosts.allows(&host) {
        return next.run(request).await;
    }

    tracing::warn!(host, "Rejected untrusted host");
    (
        StatusCode::UNAUTHORIZED,
        format!("Unauthorized host ({})", host),
    )
        .into_response()
}
