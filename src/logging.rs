//! Tracing subscriber setup for the `lore` binary.
//!
//! Logs always go to stderr so that command output on stdout stays parseable.
//! The filter comes from `LORE_LOG` (default `info`).

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "LORE_LOG";

/// File name of the log written into a configured log directory.
pub const LOG_FILE: &str = "lore.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
///
/// With `log_dir` set, a plain-text copy of every event is also appended to
/// `<log_dir>/lore.log` through a non-blocking writer; keep the returned guard
/// alive until exit so buffered lines are flushed. Calling this twice leaves
/// the first subscriber in place.
pub fn init_logging(json: bool, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let (file_layer, guard) = match log_dir {
        Some(dir) => match std::fs::create_dir_all(dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::never(dir, LOG_FILE);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = fmt::layer().with_ansi(false).with_writer(writer);
                (Some(layer), Some(guard))
            }
            Err(e) => {
                eprintln!("Warning: cannot create log directory {}: {}", dir.display(), e);
                (None, None)
            }
        },
        None => (None, None),
    };

    let json_layer = json.then(|| fmt::layer().json().with_writer(std::io::stderr));
    let text_layer = (!json).then(|| fmt::layer().with_writer(std::io::stderr));

    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(json_layer)
        .with(text_layer)
        .with(file_layer)
        .try_init();

    guard
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_dir_gets_log_file() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("logs");

        let guard = init_logging(false, Some(&dir));
        assert!(guard.is_some());
        assert!(dir.join(LOG_FILE).is_file());
    }

    #[test]
    fn test_unusable_log_dir_is_skipped() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        assert!(init_logging(true, Some(&blocker.join("logs"))).is_none());
    }
}
