//! Logging setup shared by both binaries

use std::io::IsTerminal;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Initialise the global subscriber
///
/// `RUST_LOG` wins over `debug`. Logs go to stderr unless `log_file` is
/// given. The returned guard must live until the process exits or buffered
/// lines are lost.
pub fn setup_logging(debug: bool, log_file: Option<&Path>) -> std::io::Result<WorkerGuard> {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (writer, guard, ansi) = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            (writer, guard, false)
        }
        None => {
            let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
            (writer, guard, std::io::stderr().is_terminal())
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(debug)
        .with_file(debug)
        .with_line_number(debug)
        .init();

    if let Some(path) = log_file {
        tracing::debug!("Log file: {:?}", path);
    }

    Ok(guard)
}
