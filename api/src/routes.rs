//! Router assembly

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{self, admin};
use crate::middleware as mw;
use crate::AppState;

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/get_config", get(admin::get_config))
        .route("/test_db_connection", get(admin::test_db_connection))
        .route("/test_get_table", get(admin::test_get_table))
        .route("/test_get_values", get(admin::test_get_values))
        .route("/test_get_record", get(admin::test_get_record))
        .route("/test_get_records", get(admin::test_get_records))
        .route(
            "/test_query_with_response",
            get(admin::test_query_with_response),
        )
        .route(
            "/test_query_without_response",
            get(admin::test_query_without_response),
        )
        .route("/test_logger", get(admin::test_logger))
        .route("/test_simple_request", get(admin::test_simple_request))
        .route("/test_base_exception", get(admin::test_base_exception))
        .route("/test_sleep", get(admin::test_sleep))
        .route("/test_cache_connection", get(admin::test_cache_connection))
        .route("/test_cache_keys", get(admin::test_cache_keys))
        .route("/test_cache_get", get(admin::test_cache_get))
        .route("/test_cache_set", get(admin::test_cache_set))
        .route("/test_cache_dump", get(admin::test_cache_dump))
        .route("/test_cache_flush", get(admin::test_cache_flush))
}

fn vista_routes() -> Router<AppState> {
    Router::new()
        .route("/get_mse_info", get(handlers::get_mse_info))
        .route("/semd_info_list", get(handlers::semd_info_list))
        .route("/semd_export", get(handlers::semd_export))
        .route("/semd_info_batch", post(handlers::semd_info_batch))
}

/// All routes behind the middleware stack
///
/// Outermost first: CORS, trace, timeout, trusted host, request log,
/// panic catcher.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/favicon.ico", get(handlers::favicon))
        .route("/health", get(handlers::health))
        .nest("/admin", admin_routes())
        .nest("/vista3", vista_routes())
        .layer(middleware::from_fn(mw::catch_panic))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            mw::request_log,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            mw::trusted_host,
        ))
        .layer(middleware::from_fn_with_state(state.clone(), mw::timeout))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
