use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "warn,drive_sorter_lib=info,drive_sorter=info";
const LOG_FILE_PREFIX: &str = "sorter.log";

/// Log to stdout and a daily rolling file under `log_dir`.
///
/// `RUST_LOG` overrides the default filter; `RUST_LOG=debug` shows
/// per-request detail. Keep the returned guard alive until exit or buffered
/// file lines are lost.
pub fn init_logging(log_dir: &Path) -> Result<WorkerGuard, String> {
    std::fs::create_dir_all(log_dir)
        .map_err(|e| format!("Failed to create log directory {}: {}", log_dir.display(), e))?;

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(false)
                .without_time(),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(filter)
        .try_init()
        .map_err(|e| format!("Failed to install log subscriber: {}", e))?;

    Ok(guard)
}
