use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "game.log";

struct Logger {
    path: PathBuf,
    _guard: WorkerGuard,
}

static LOGGER: OnceLock<Logger> = OnceLock::new();

/// Routes tracing output to `<root>/log/game.log`. Later calls keep the
/// first subscriber.
pub fn init(root: &Path) -> Result<(), String> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let log_dir = root.join("log");
    std::fs::create_dir_all(&log_dir)
        .map_err(|err| format!("log directory create failed: {}", err))?;

    let appender = tracing_appender::rolling::never(&log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .map_err(|err| format!("log system init failed: {}", err))?;

    let _ = LOGGER.set(Logger {
        path: log_dir.join(LOG_FILE),
        _guard: guard,
    });
    Ok(())
}

/// The active log file, once `init` has run.
pub fn log_path() -> Option<&'static Path> {
    LOGGER.get().map(|logger| logger.path.as_path())
}

pub fn log_game(message: &str) {
    tracing::info!(target: "game", "{}", message);
}

pub fn log_error(message: &str) {
    tracing::error!(target: "error", "{}", message);
}
