// src/watch/event_handler.rs

//! The watch loop: filter, debounce and dispatch file-change events.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use notify::event::ModifyKind;
use notify::{Event, EventKind};
use tokio::time::Instant;
use tracing::{debug, error, trace};

use crate::errors::Result;
use crate::lifecycle::Lifecycle;
use crate::watch::cache::DebounceCache;
use crate::watch::watcher::{watch_paths, WatchHandle};

/// What the watch loop should do after a handler ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reaction {
    Continue,
    /// Drop the current watch set and watch these paths instead.
    Rewatch(Vec<PathBuf>),
}

/// Reacts to one debounced change of one path.
pub trait ChangeHandler: Send {
    fn on_change<'a>(
        &'a mut self,
        path: &'a Path,
        event: &'a Event,
    ) -> Pin<Box<dyn Future<Output = Result<Reaction>> + Send + 'a>>;
}

/// Only content writes count as changes.
pub fn is_write_event(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any)
    )
}

/// Identity of an event for debouncing: `"<kind>: <path>"`.
pub fn event_key(kind: &EventKind, path: &Path) -> String {
    format!("{kind:?}: {}", path.display())
}

/// Consume events from `handle` until the lifecycle is done.
///
/// For every path of every write event, the handler runs unless the same
/// identity was handled within the debounce window. Watcher errors and
/// handler errors are fatal: the lifecycle is cancelled and the error
/// returned.
pub async fn run_watch_loop<H: ChangeHandler>(
    mut handle: WatchHandle,
    cache: &mut DebounceCache,
    handler: &mut H,
    lifecycle: &Lifecycle,
) -> Result<()> {
    loop {
        let msg = tokio::select! {
            _ = lifecycle.done() => {
                debug!("lifecycle done; leaving the watch loop");
                return Ok(());
            }
            msg = handle.next() => msg,
        };

        let event = match msg {
            Some(Ok(event)) => event,
            Some(Err(err)) => {
                error!(error = %err, "file watch error");
                lifecycle.cancel_all().await;
                return Err(err.into());
            }
            None => {
                debug!("watch source closed; leaving the watch loop");
                return Ok(());
            }
        };

        if !is_write_event(&event.kind) {
            trace!(?event, "ignoring non-write event");
            continue;
        }

        for path in &event.paths {
            let key = event_key(&event.kind, path);
            if !cache.check_and_insert(&key, Instant::now()) {
                debug!(%key, "ignoring duplicate event");
                continue;
            }

            let reaction = match handler.on_change(path, &event).await {
                Ok(reaction) => reaction,
                Err(err) => {
                    error!(error = %err, path = %path.display(), "failed to handle a file change");
                    lifecycle.cancel_all().await;
                    return Err(err);
                }
            };

            if let Reaction::Rewatch(paths) = reaction {
                handle = match watch_paths(&paths) {
                    Ok(next) => next,
                    Err(err) => {
                        lifecycle.cancel_all().await;
                        return Err(err);
                    }
                };
                // The rest of this event belongs to the old watch set.
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange};

    #[test]
    fn only_data_writes_count() {
        assert!(is_write_event(&EventKind::Modify(ModifyKind::Data(DataChange::Content))));
        assert!(is_write_event(&EventKind::Modify(ModifyKind::Any)));
        assert!(!is_write_event(&EventKind::Create(CreateKind::File)));
        assert!(!is_write_event(&EventKind::Access(AccessKind::Any)));
    }

    #[test]
    fn keys_differ_per_path_and_kind() {
        let data = EventKind::Modify(ModifyKind::Data(DataChange::Any));
        let any = EventKind::Modify(ModifyKind::Any);
        let a = event_key(&data, Path::new("/cfg/app.yaml"));
        assert_eq!(a, event_key(&data, Path::new("/cfg/app.yaml")));
        assert_ne!(a, event_key(&data, Path::new("/cfg/other.yaml")));
        assert_ne!(a, event_key(&any, Path::new("/cfg/app.yaml")));
        assert!(a.ends_with(": /cfg/app.yaml"));
    }
}
