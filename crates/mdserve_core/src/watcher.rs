//! Single-shot file change notification.
//!
//! Wraps the `notify` crate into a future that resolves once when the
//! filesystem reports any event for one path, and never again.

use notify::{Event as NotifyEvent, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Errors setting up a filesystem watch.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The path has no file name to filter events by.
    #[error("path has no watchable file name: {0}")]
    InvalidPath(PathBuf),

    /// The underlying watcher could not be created or registered.
    #[error(transparent)]
    Notify(#[from] notify::Error),
}

/// Wait until the filesystem reports any event for `path`.
///
/// Resolves once, without a value, on the first create, modify or remove
/// event; event types are not distinguished. If nothing changes it never
/// resolves, so callers must bound it externally (see
/// [`wait_bounded`](crate::poll::wait_bounded)).
///
/// The parent directory is watched non-recursively and events are filtered
/// by file name, so editors that write to a temporary file and rename it
/// over the target still register as a change. Dropping the returned future
/// drops the underlying watcher and releases the OS watch handle.
pub async fn await_change(path: &Path) -> Result<(), WatchError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| WatchError::InvalidPath(path.to_path_buf()))?
        .to_os_string();
    let watch_target = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<NotifyEvent, notify::Error>| match res {
            Ok(event) => {
                let is_target_file = event
                    .paths
                    .iter()
                    .any(|p| p.file_name() == Some(file_name.as_os_str()));

                if !is_target_file {
                    return;
                }

                if event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove() {
                    let _ = event_tx.send(());
                }
            }
            Err(error) => {
                tracing::error!(?error, "File watcher error");
            }
        },
        notify::Config::default(),
    )?;

    watcher.watch(&watch_target, RecursiveMode::NonRecursive)?;
    tracing::debug!(path = %path.display(), "Watching for a change");

    // The watcher stays alive exactly as long as this future; the first
    // event wins and anything after it lands in a closed channel.
    event_rx.recv().await;

    Ok(())
}
