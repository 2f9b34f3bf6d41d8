// src/engine/generation.rs

//! One build/deploy generation:
//! `Preparing -> Running -> TearingDown -> Done`.

use std::backtrace::Backtrace;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::deploy::Deployer;
use crate::errors::Result;
use crate::lifecycle::{Lifecycle, LoopContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    Preparing,
    Running,
    TearingDown,
    Done,
}

/// Run a generation in its own task. The handle resolves once the teardown
/// is over; awaiting it is the generation's completion acknowledgment.
pub fn spawn_generation(
    lifecycle: Lifecycle,
    deployer: Arc<dyn Deployer>,
    scope: LoopContext,
) -> JoinHandle<()> {
    tokio::spawn(run_generation(lifecycle, deployer, scope))
}

/// Run a generation to completion.
///
/// The teardown always runs, whether preparing or running failed or
/// panicked. A failure or panic is logged here and turned into
/// `lifecycle.cancel_all()`; nothing propagates further.
pub async fn run_generation(lifecycle: Lifecycle, deployer: Arc<dyn Deployer>, scope: LoopContext) {
    let generation = scope.generation().unwrap_or_default();

    // The work runs in its own task so a panic surfaces as a `JoinError`
    // instead of skipping the teardown.
    let work = tokio::spawn(prepare_and_run(generation, Arc::clone(&deployer), scope));
    let result = work.await;

    debug!(generation, state = ?GenerationState::TearingDown, "generation state");
    if let Err(err) = deployer.teardown().await {
        warn!(generation, error = %err, "teardown failed");
    }

    match result {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            error!("An error has occurred in generation {generation}: {err}");
            info!("Stack: {}", Backtrace::force_capture());
            lifecycle.cancel_all().await;
        }
        Err(join_err) if join_err.is_panic() => {
            error!("Generation {generation} panicked: {join_err}");
            lifecycle.cancel_all().await;
        }
        Err(join_err) => {
            warn!(generation, error = %join_err, "generation task was aborted");
        }
    }

    debug!(generation, state = ?GenerationState::Done, "generation state");
}

async fn prepare_and_run(
    generation: u64,
    deployer: Arc<dyn Deployer>,
    scope: LoopContext,
) -> Result<()> {
    debug!(generation, state = ?GenerationState::Preparing, "generation state");
    tokio::select! {
        res = deployer.prepare(&scope) => res?,
        _ = scope.cancelled() => {
            debug!(generation, "cancelled while preparing");
            return Ok(());
        }
    }

    if scope.is_cancelled() {
        return Ok(());
    }

    debug!(generation, state = ?GenerationState::Running, "generation state");
    deployer.run(&scope).await?;

    // The deployment may hand back control early; the generation still
    // lasts until its scope is cancelled.
    scope.cancelled().await;
    Ok(())
}
