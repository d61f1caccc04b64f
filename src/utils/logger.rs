use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Initialize logging based on MEDIASHRINK_DEBUG environment variable.
///
/// With the variable set, everything down to DEBUG goes to a daily log file;
/// otherwise INFO and up go to stderr, tunable through `RUST_LOG`.
pub fn init_logging() -> Option<WorkerGuard> {
    if std::env::var("MEDIASHRINK_DEBUG").is_ok() {
        let log_dir = dirs::data_local_dir()
            .unwrap_or_else(|| std::path::PathBuf::from("."))
            .join("mediashrink");

        let _ = std::fs::create_dir_all(&log_dir);

        let file_appender = tracing_appender::rolling::daily(&log_dir, "mediashrink.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        tracing_subscriber::fmt()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()))
            .init();

        tracing::info!("mediashrink logging initialized in {}", log_dir.display());
        Some(guard)
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
            .init();
        None
    }
}
