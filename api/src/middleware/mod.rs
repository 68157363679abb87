//! HTTP middleware
//!
//! Applied by the router in this order, outermost first: timeout, trusted
//! host, request log, panic catcher.

pub mod exception;
pub mod request_log;
pub mod timeout;
pub mod trusted_host;

use std::net::SocketAddr;

use axum::{extract::ConnectInfo, http::Request};

pub use exception::catch_panic;
pub use request_log::request_log;
pub use timeout::timeout;
pub use trusted_host::{trusted_host, TrustedHosts};

/// Peer address recorded by the server, if any
pub fn client_addr<B>(request: &Request<B>) -> Option<SocketAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}

/// `ip:port`, or `unknown` when the peer address is not recorded
pub fn display_client<B>(request: &Request<B>) -> String {
    client_addr(request)
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
