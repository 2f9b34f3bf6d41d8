// src/deploy/mod.rs

//! Pluggable deployment backend.
//!
//! A generation talks to a [`Deployer`] rather than to tilt and kubectl
//! directly, so tests can swap in a recording fake.
//!
//! - [`TiltDeployer`] is the real implementation.
//! - [`configmap`] builds the configmap manifest the deployment mounts.

pub mod configmap;
pub mod tilt;

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;
use crate::lifecycle::LoopContext;

pub use tilt::{run_cleanup, TiltDeployer};

pub type DeployFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// The three phases of one build/deploy generation.
pub trait Deployer: Send + Sync {
    /// Get everything ready: config, generated files, a clean namespace.
    fn prepare<'a>(&'a self, scope: &'a LoopContext) -> DeployFuture<'a>;

    /// Start the deployment, bound to `scope`. May return before the scope
    /// is cancelled; the generation then waits for the cancellation.
    fn run<'a>(&'a self, scope: &'a LoopContext) -> DeployFuture<'a>;

    /// Tear the deployment down. Runs after every generation, whatever
    /// happened before, and must not depend on the (cancelled) loop scope.
    fn teardown(&self) -> DeployFuture<'_>;
}
