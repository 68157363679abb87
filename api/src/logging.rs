//! Tracing setup
//!
//! Events go to stdout and to a daily-rotated file next to `LOG_FILE_PATH`.
//! `RUST_LOG` overrides the level chosen by `VERBOSE_LOG`.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggerConfig;

/// Rotated files kept besides the active one
const MAX_LOG_FILES: usize = 2;

/// Filter used when `RUST_LOG` is not set
pub fn default_filter(config: &LoggerConfig) -> String {
    format!("info,vista_api={}", config.level_name())
}

/// Install the global subscriber
///
/// The returned guard flushes the file writer on drop and must live until
/// shutdown.
pub fn init(config: &LoggerConfig) -> anyhow::Result<WorkerGuard> {
    let directory = config
        .file_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = config
        .file_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("log.log");

    std::fs::create_dir_all(directory)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(file_name)
        .max_log_files(MAX_LOG_FILES)
        .build(directory)?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter(config))),
        )
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .try_init()?;

    Ok(guard)
}
