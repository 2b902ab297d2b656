// The TUI owns the terminal, so interactive sessions log to a rolling file
// instead of stderr. Headless commands log to stderr.

use std::path::Path;
use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "chatline.log";

/// Precedence: RUST_LOG env var > configured level
fn filter(level: &str) -> EnvFilter {
    let default_filter = format!("chatline_core={level},chatline_tui={level}");
    EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into())
}

/// Log to daily-rotated files in `dir`. Keep the guard alive until exit so logs flush.
pub fn init_file(dir: &Path, level: &str) -> Result<WorkerGuard> {
    std::fs::create_dir_all(dir)?;
    let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter(level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .try_init()?;

    Ok(guard)
}

pub fn init_stderr(level: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(filter(level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;
    Ok(())
}
