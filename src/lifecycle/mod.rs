// src/lifecycle/mod.rs

//! Two-tier cancelable lifecycle.
//!
//! A [`Lifecycle`] owns:
//! - an outer cancellation token, covering the whole process run;
//! - the current [`LoopContext`], covering one generation of the
//!   build/deploy pipeline. It can be cancelled and replaced any number of
//!   times without touching the outer token.
//!
//! Rules:
//! - `restart_loop` cancels the current loop scope and installs a fresh one,
//!   atomically with respect to other readers.
//! - `cancel_all` always wins over `restart_loop`: once it has begun, restarts
//!   are no-ops and the (cancelled) scope stays in place.
//! - `on_stop` runs exactly once, at the start of the first `cancel_all`.
//! - The outer token is cancelled only after the grace period, giving the
//!   current generation time to observe its cancellation and tear down.

pub mod scope;
pub mod signals;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use scope::{ErrorPolicy, LoopContext, OutputTarget};

/// Callback invoked once when the lifecycle starts stopping.
pub type StopFn = Box<dyn FnOnce() + Send + 'static>;

/// Handle on the process-wide lifecycle. Cheap to clone.
#[derive(Clone)]
pub struct Lifecycle {
    inner: Arc<Inner>,
}

struct Inner {
    outer: CancellationToken,
    current: Mutex<LoopContext>,
    grace: Duration,
    on_stop: Mutex<Option<StopFn>>,
    stopping: AtomicBool,
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("grace", &self.inner.grace)
            .field("generation", &self.generation())
            .field("stopping", &self.is_stopping())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl Lifecycle {
    /// Build a lifecycle with its initial loop scope (generation 0).
    ///
    /// No signal listener is installed; see [`Lifecycle::start`].
    pub fn new(grace_ms: u64, on_stop: Option<StopFn>) -> Self {
        Self {
            inner: Arc::new(Inner {
                outer: CancellationToken::new(),
                current: Mutex::new(LoopContext::for_generation(0)),
                grace: Duration::from_millis(grace_ms),
                on_stop: Mutex::new(on_stop),
                stopping: AtomicBool::new(false),
            }),
        }
    }

    /// Build a lifecycle and bind it to the OS termination signals.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(grace_ms: u64, on_stop: Option<StopFn>) -> Self {
        let lifecycle = Self::new(grace_ms, on_stop);
        lifecycle.listen_for_signals();
        lifecycle
    }

    /// Spawn the background task that turns a termination signal into
    /// [`Lifecycle::cancel_all`].
    pub fn listen_for_signals(&self) -> JoinHandle<()> {
        let lifecycle = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                res = signals::wait_for_shutdown_signal() => match res {
                    Ok(name) => {
                        warn!("Received signal: {name}");
                        lifecycle.cancel_all().await;
                    }
                    Err(err) => {
                        warn!(error = %err, "failed to listen for termination signals");
                    }
                },
                _ = lifecycle.inner.outer.cancelled() => {
                    debug!("lifecycle done; signal listener exiting");
                }
            }
        })
    }

    /// The current loop scope.
    ///
    /// Callers must fetch it again after every restart: a stale clone reports
    /// itself cancelled.
    pub fn loop_context(&self) -> LoopContext {
        self.current().clone()
    }

    /// Generation number of the current loop scope.
    pub fn generation(&self) -> u64 {
        self.current().generation().unwrap_or_default()
    }

    /// Cancel the current loop scope and install a fresh one.
    ///
    /// Returns the new scope, or `None` if the lifecycle is already stopping.
    pub fn restart_loop(&self) -> Option<LoopContext> {
        let mut current = self.current();

        if self.is_stopping() {
            debug!("restart requested while stopping; ignoring");
            return None;
        }

        current.cancel();
        let next_generation = current.generation().map_or(1, |g| g + 1);
        let next = LoopContext::for_generation(next_generation);
        *current = next.clone();

        debug!(generation = next_generation, "loop scope restarted");
        Some(next)
    }

    /// Stop everything: run `on_stop`, cancel the loop scope, wait the grace
    /// period, then cancel the outer scope.
    ///
    /// Concurrent or repeated calls wait for the first one to finish.
    pub async fn cancel_all(&self) {
        // Flipping the flag under the scope lock orders us against any
        // in-flight `restart_loop`.
        let first = {
            let _current = self.current();
            !self.inner.stopping.swap(true, Ordering::SeqCst)
        };

        if !first {
            self.inner.outer.cancelled().await;
            return;
        }

        let on_stop = lock(&self.inner.on_stop).take();
        if let Some(on_stop) = on_stop {
            on_stop();
        }

        self.current().cancel();

        info!(
            grace = ?self.inner.grace,
            "Waiting for some cleanup..."
        );

        // The final step runs in its own task so it completes even if the
        // caller's future is dropped halfway.
        let inner = Arc::clone(&self.inner);
        let finisher = tokio::spawn(async move {
            tokio::time::sleep(inner.grace).await;
            inner.outer.cancel();
        });

        if let Err(err) = finisher.await {
            warn!(error = %err, "lifecycle finisher task failed; cancelling now");
            self.inner.outer.cancel();
        }
    }

    /// Resolves once the outer scope is cancelled.
    pub async fn done(&self) {
        self.inner.outer.cancelled().await
    }

    /// True once the outer scope is cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.inner.outer.is_cancelled()
    }

    /// True once `cancel_all` has begun.
    pub fn is_stopping(&self) -> bool {
        self.inner.stopping.load(Ordering::SeqCst)
    }

    pub fn grace(&self) -> Duration {
        self.inner.grace
    }

    fn current(&self) -> MutexGuard<'_, LoopContext> {
        lock(&self.inner.current)
    }
}

/// A poisoned lock only means another thread panicked while holding it; the
/// data (a scope handle or a callback slot) is still consistent.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn restart_replaces_and_cancels_the_scope() {
        let lifecycle = Lifecycle::new(0, None);
        let before = lifecycle.loop_context();

        let after = lifecycle.restart_loop().expect("not stopping");

        assert!(before.is_cancelled());
        assert!(!after.is_cancelled());
        assert_eq!(before.generation(), Some(0));
        assert_eq!(after.generation(), Some(1));
        assert_eq!(lifecycle.loop_context().generation(), Some(1));
        assert!(!lifecycle.is_cancelled());
    }

    #[test]
    fn cancelling_a_stale_scope_leaves_the_current_one_alone() {
        let lifecycle = Lifecycle::new(0, None);
        let stale = lifecycle.loop_context();
        lifecycle.restart_loop();

        stale.cancel();

        assert!(!lifecycle.loop_context().is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_runs_on_stop_once_and_blocks_restarts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let lifecycle = Lifecycle::new(
            50,
            Some(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })),
        );
        let scope = lifecycle.loop_context();

        tokio::join!(lifecycle.cancel_all(), lifecycle.cancel_all());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(scope.is_cancelled());
        assert!(lifecycle.is_cancelled());
        assert!(lifecycle.restart_loop().is_none());
        assert_eq!(lifecycle.generation(), 0);
    }
}
