// src/engine/mod.rs

//! Build/deploy orchestration.
//!
//! - [`generation`] runs one generation of the pipeline through a
//!   [`Deployer`](crate::deploy::Deployer), and is the single place where
//!   its errors and panics are caught.
//! - [`supervisor`] restarts generations on file changes, waiting for the
//!   previous one to acknowledge its teardown before launching the next.

pub mod generation;
pub mod supervisor;

pub use generation::{run_generation, spawn_generation, GenerationState};
pub use supervisor::{Supervisor, DEFAULT_SETTLE_TIMEOUT};
