//! Server lifecycle events

use std::future::IntoFuture;

use tokio::task::JoinHandle;

use crate::AppState;

pub fn on_startup() {
    tracing::info!("Startup.");
}

/// Release shared resources, then log the shutdown
pub async fn on_shutdown(state: &AppState) {
    match state.database.close().await {
        Ok(()) => tracing::info!("Database disposed."),
        Err(e) => tracing::error!(error = %e, "Failed to dispose database"),
    }
    tracing::info!("Shutdown.");
}

/// Await the server, then stop the poller and run `on_shutdown`
///
/// The serve result is returned after cleanup, so a failed server still
/// disposes the database.
pub async fn serve_until_shutdown<E>(
    state: &AppState,
    poller: Option<JoinHandle<()>>,
    serving: impl IntoFuture<Output = Result<(), E>>,
) -> Result<(), E> {
    let served = serving.await;

    if let Some(poller) = poller {
        poller.abort();
    }
    on_shutdown(state).await;

    served
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
