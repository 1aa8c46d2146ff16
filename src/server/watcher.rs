//! File system watcher for workspace changes

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::{Error, Result};

/// Debounce duration - wait this long after last event before sending update
const DEBOUNCE_MS: u64 = 100;

/// Reload notice sent to websocket subscribers.
pub fn reload_message() -> String {
    serde_json::json!({
        "type": "reload",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })
    .to_string()
}

/// Watch the given directories, logging each change and broadcasting a
/// debounced reload notice. Runs until the event channel closes.
pub async fn watch_dirs(dirs: Vec<PathBuf>, update_tx: broadcast::Sender<String>) -> Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::channel(100);

    let mut watcher = RecommendedWatcher::new(
        move |res: std::result::Result<Event, notify::Error>| match res {
            Ok(event) => {
                let _ = tx.blocking_send(event);
            }
            Err(e) => tracing::warn!(error = %e, "File watcher error"),
        },
        Config::default(),
    )
    .map_err(|e| Error::Other(format!("Failed to start file watcher: {}", e)))?;

    for dir in &dirs {
        watcher
            .watch(dir, RecursiveMode::Recursive)
            .map_err(|e| Error::Other(format!("Failed to watch {}: {}", dir.display(), e)))?;
        tracing::info!(path = %dir.display(), "Watching for changes");
    }

    let mut pending_update = false;
    let mut last_event_time = Instant::now();

    loop {
        let timeout = if pending_update {
            Duration::from_millis(DEBOUNCE_MS).saturating_sub(last_event_time.elapsed())
        } else {
            Duration::from_secs(3600)
        };

        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                match event.kind {
                    notify::EventKind::Create(_)
                    | notify::EventKind::Modify(_)
                    | notify::EventKind::Remove(_) => {
                        for path in &event.paths {
                            tracing::info!(path = %path.display(), kind = ?event.kind, "File changed");
                        }
                        pending_update = true;
                        last_event_time = Instant::now();
                    }
                    _ => {}
                }
            }
            _ = tokio::time::sleep(timeout), if pending_update => {
                // No subscribers is not an error
                let _ = update_tx.send(reload_message());
                pending_update = false;
            }
        }
    }

    Ok(())
}
