// src/watch/watcher.rs

use std::path::{Path, PathBuf};

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::Result;
use crate::watch::path_utils::dedup_paths;

/// A raw message from the OS watcher: an event or a watch error.
pub type WatchMessage = notify::Result<Event>;

/// Handle on an open watch set.
///
/// Owns the underlying `RecommendedWatcher`: dropping the handle stops the
/// watching. The set of paths is fixed; watching another set means opening
/// a new handle.
pub struct WatchHandle {
    _watcher: Option<RecommendedWatcher>,
    paths: Vec<PathBuf>,
    rx: mpsc::UnboundedReceiver<WatchMessage>,
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("paths", &self.paths)
            .finish()
    }
}

impl WatchHandle {
    /// A handle fed by a channel instead of the OS, e.g. to replay
    /// synthetic events.
    pub fn from_channel(paths: Vec<PathBuf>, rx: mpsc::UnboundedReceiver<WatchMessage>) -> Self {
        Self {
            _watcher: None,
            paths,
            rx,
        }
    }

    /// Next event or watcher error. `None` once the source is gone.
    pub async fn next(&mut self) -> Option<WatchMessage> {
        self.rx.recv().await
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

/// Start watching every path of `paths`, non-recursively.
///
/// Duplicates are dropped first. Any path that cannot be watched (missing,
/// no permission) makes the whole call fail.
pub fn watch_paths<P: AsRef<Path>>(paths: &[P]) -> Result<WatchHandle> {
    let paths = dedup_paths(paths);

    // Channel from the blocking notify callback into the async world.
    let (tx, rx) = mpsc::unbounded_channel::<WatchMessage>();

    let mut watcher = RecommendedWatcher::new(
        move |res: WatchMessage| {
            // The receiver is gone once the handle is dropped; nothing left
            // to notify.
            let _ = tx.send(res);
        },
        Config::default(),
    )?;

    for path in &paths {
        info!("Watching file: {}", path.display());
        watcher.watch(path, RecursiveMode::NonRecursive)?;
    }
    debug!(count = paths.len(), "watch set opened");

    Ok(WatchHandle {
        _watcher: Some(watcher),
        paths,
        rx,
    })
}
