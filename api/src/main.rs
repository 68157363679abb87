//! Vista API Server
//!
//! Monitors the registration of structured electronic medical documents
//! (SEMDs) through the Vista3 service and exposes admin diagnostics for the
//! medical database and cache.
//! Laid out as ports and adapters.

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{DateTime, Local};

mod adapters;
mod app;
mod config;
mod domain;
mod entity;
mod error;
mod events;
mod handlers;
mod logging;
mod middleware;
mod routes;

#[cfg(test)]
mod test_utils;


use adapters::vista::ChunkOptions;
use adapters::{MySqlDatabase, MySqlSemdRepository, RedisCache, VistaClientImpl};
use app::{spawn_monitoring_loop, DynMonitoringService, MonitoringService};
use config::Config;
use domain::ports::{CacheDriver, Database, SemdRepository, VistaClient};
use middleware::TrustedHosts;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub monitoring_service: Arc<DynMonitoringService>,
    pub database: Arc<dyn Database>,
    pub cache: Arc<dyn CacheDriver>,
    pub config: Arc<Config>,
    pub trusted_hosts: Arc<TrustedHosts>,
    pub started_at: DateTime<Local>,
}

impl AppState {
    pub fn new(
        config: Config,
        database: Arc<dyn Database>,
        semds: Arc<dyn SemdRepository>,
        vista: Arc<dyn VistaClient>,
        cache: Arc<dyn CacheDriver>,
    ) -> Result<Self, regex::Error> {
        let trusted_hosts = TrustedHosts::new(&config.trusted_hosts)?;
        let monitoring_service = MonitoringService::new(
            semds,
            vista,
            cache.clone(),
            config.semd_concurrency,
        );

        Ok(Self {
            monitoring_service: Arc::new(monitoring_service),
            database,
            cache,
            config: Arc::new(config),
            trusted_hosts: Arc::new(trusted_hosts),
            started_at: Local::now(),
        })
    }
}

fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    let _log_guard = logging::init(&config.logger)?;

    let mut runtime = tokio::runtime::Builder::new_multi_thread();
    runtime.enable_all();
    if let Some(threads) = config.worker_threads() {
        runtime.worker_threads(threads);
    }

    runtime.build()?.block_on(serve(config))
}

async fn serve(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        development = config.development,
        database = %config.s11_db.host,
        vista = %config.semd_service_url,
        "Starting Vista API..."
    );

    // The pool is lazy, so an unreachable database does not block startup
    let database = MySqlDatabase::connect(&config.s11_db, config.development).await?;
    let semds = Arc::new(MySqlSemdRepository::new(database.connection()));
    let vista = Arc::new(
        VistaClientImpl::new(&config.semd_service_url)?.with_chunk_options(ChunkOptions {
            max_concurrent: config.semd_concurrency,
            ..ChunkOptions::default()
        }),
    );
    let cache = Arc::new(RedisCache::new(&config.redis)?);

    let state = AppState::new(config, Arc::new(database), semds, vista, cache)?;

    let poller = spawn_monitoring_loop(
        state.monitoring_service.clone(),
        state.config.semd_poll_interval,
        state.config.pid_dir.clone(),
    );

    let listener =
        tokio::net::TcpListener::bind((state.config.host.as_str(), state.config.port)).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    events::on_startup();
    let serving = axum::serve(
        listener,
        routes::build_router(state.clone())
            .into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(events::shutdown_signal());
    events::serve_until_shutdown(&state, poller, serving).await?;

    Ok(())
}
