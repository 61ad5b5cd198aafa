//! Logging configuration with journald support on Linux.
//!
//! The dashboard owns the terminal, so logs never go to stdout. On Linux they
//! go to systemd's journal when it is reachable, otherwise to a daily rolling
//! file.

use anyhow::Result;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env("LSTQC_LOG").unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize logging for the interactive dashboard.
///
/// Log level is controlled by `LSTQC_LOG` (`debug`, `info`, `warn`, `error`
/// or any `EnvFilter` directive); the default is `info`.
pub fn init(log_dir: Option<PathBuf>) -> Result<()> {
    #[cfg(target_os = "linux")]
    {
        if let Ok(journald_layer) = tracing_journald::layer() {
            tracing_subscriber::registry()
                .with(env_filter())
                .with(journald_layer)
                .try_init()?;

            tracing::info!("Logging initialized with journald backend");
            return Ok(());
        }
    }

    let log_dir = log_dir.unwrap_or_else(|| {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lstqc")
            .join("logs")
    });

    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "lstqc.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The worker must outlive every log call; init() runs once at startup
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .try_init()?;

    tracing::info!("Logging initialized with file backend at {:?}", log_dir);
    Ok(())
}

/// Initialize logging for command-line tools, which may write to stderr.
pub fn init_stderr() -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()?;
    Ok(())
}
