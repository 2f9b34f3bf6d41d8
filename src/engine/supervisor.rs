// src/engine/supervisor.rs

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use notify::Event;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::deploy::Deployer;
use crate::engine::generation::spawn_generation;
use crate::errors::Result;
use crate::lifecycle::Lifecycle;
use crate::logging::step;
use crate::watch::{ChangeHandler, Reaction};

/// Upper bound on the wait for a generation to finish its teardown.
pub const DEFAULT_SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Owns the current generation and restarts it on every file change.
pub struct Supervisor {
    lifecycle: Lifecycle,
    deployer: Arc<dyn Deployer>,
    current: Option<JoinHandle<()>>,
    settle_timeout: Duration,
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("generation", &self.lifecycle.generation())
            .field("running", &self.current.is_some())
            .field("settle_timeout", &self.settle_timeout)
            .finish()
    }
}

impl Supervisor {
    pub fn new(lifecycle: Lifecycle, deployer: Arc<dyn Deployer>) -> Self {
        Self {
            lifecycle,
            deployer,
            current: None,
            settle_timeout: DEFAULT_SETTLE_TIMEOUT,
        }
    }

    pub fn with_settle_timeout(mut self, timeout: Duration) -> Self {
        self.settle_timeout = timeout;
        self
    }

    /// Launch a generation in the current loop scope.
    pub fn launch(&mut self) {
        let scope = self.lifecycle.loop_context();
        if scope.is_cancelled() || self.lifecycle.is_stopping() {
            debug!("not launching a generation: already stopping");
            return;
        }
        self.current = Some(spawn_generation(
            self.lifecycle.clone(),
            Arc::clone(&self.deployer),
            scope,
        ));
    }

    /// Cancel the current generation, wait for its teardown, then launch a
    /// new one. Returns `false` if the lifecycle is stopping.
    pub async fn restart(&mut self) -> bool {
        if self.lifecycle.restart_loop().is_none() {
            debug!("restart ignored: the lifecycle is stopping");
            return false;
        }

        self.settle_previous().await;

        step("Restarting the build & deploy");
        self.launch();
        true
    }

    /// Block until the lifecycle is done and the last generation has torn
    /// down (bounded by the settle timeout).
    pub async fn wait(mut self) {
        self.lifecycle.done().await;
        self.settle_previous().await;
    }

    async fn settle_previous(&mut self) {
        let Some(handle) = self.current.take() else {
            return;
        };

        match tokio::time::timeout(self.settle_timeout, handle).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(error = %err, "previous generation ended abnormally"),
            Err(_) => warn!(
                timeout = ?self.settle_timeout,
                "previous generation did not finish in time; moving on"
            ),
        }
    }
}

impl ChangeHandler for Supervisor {
    fn on_change<'a>(
        &'a mut self,
        path: &'a Path,
        event: &'a Event,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Reaction>> + Send + 'a>> {
        Box::pin(async move {
            step(format!(
                "/!\\ File modified: {} (event = {:?})",
                path.display(),
                event.kind
            ));
            self.restart().await;
            Ok(Reaction::Continue)
        })
    }
}
