use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_FILE_NAME: &str = "dbtui.log";

pub fn log_dir() -> PathBuf {
    crate::config::AppConfig::config_dir().join("logs")
}

/// Sends all tracing output to a daily rotated file, the terminal belongs to
/// the UI. Keep the returned guard alive until exit so buffered lines get
/// flushed. The filter comes from `RUST_LOG` and defaults to `info`.
pub fn init(dir: &Path) -> std::io::Result<WorkerGuard> {
    std::fs::create_dir_all(dir)?;
    let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
    let (file_nb, guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,reqwest=warn,hyper=warn".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_nb),
        )
        .try_init()
        .map_err(std::io::Error::other)?;

    Ok(guard)
}
