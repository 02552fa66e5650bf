use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

// Notifications arriving during the settle delay fold into one rerun.
const SETTLE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to watch log directory {path}: {source}")]
    Watch {
        path: String,
        #[source]
        source: notify::Error,
    },
}

pub async fn watch_log_file<F>(log_path: &Path, mut on_change: F) -> Result<(), WatchError>
where
    F: FnMut(),
{
    let (notify_sender, mut notify_receiver) =
        mpsc::unbounded_channel::<Result<Event, notify::Error>>();

    let watch_directory = log_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let watch_error = |source: notify::Error| WatchError::Watch {
        path: watch_directory.display().to_string(),
        source,
    };

    let mut watcher = notify::recommended_watcher(move |result| {
        if notify_sender.send(result).is_err() {
            tracing::debug!("Log watcher notification receiver dropped");
        }
    })
    .map_err(watch_error)?;
    watcher
        .watch(watch_directory, RecursiveMode::NonRecursive)
        .map_err(watch_error)?;

    tracing::info!(log_path = %log_path.display(), "Watching log file for changes");

    while let Some(notification_result) = notify_receiver.recv().await {
        match notification_result {
            Ok(event) => {
                if !is_relevant_notification(&event, log_path) {
                    continue;
                }

                tokio::time::sleep(SETTLE_DELAY).await;
                while notify_receiver.try_recv().is_ok() {}

                on_change();
            }
            Err(error) => {
                tracing::warn!("Log watcher error: {error}");
            }
        }
    }

    Ok(())
}

fn is_relevant_notification(event: &Event, log_path: &Path) -> bool {
    let relevant_kind = matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_));
    if !relevant_kind {
        return false;
    }

    let Some(log_file_name) = log_path.file_name() else {
        return false;
    };

    event.paths.iter().any(|path| {
        path == log_path
            || path
                .file_name()
                .map(|file_name| file_name == log_file_name)
                .unwrap_or(false)
    })
}
