// src/exec/mod.rs

//! Process execution layer.
//!
//! Every external tool aldev drives (tilt, kubectl, git, go...) goes through
//! here, using `tokio::process::Command`.
//!
//! - [`runner`] holds the three entry points: [`run`] (optionally
//!   long-running and bound to a loop scope), [`run_and_capture`] and
//!   [`quick_run`].
//! - [`CommandOutcome`] tells an expected cancellation apart from a genuine
//!   failure.

pub mod runner;

pub use runner::{quick_run, run, run_and_capture};

/// How a command ended, once the scope's error policy has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Success,
    /// Stopped because its scope was cancelled, or killed by a signal while
    /// long-running. Not an error.
    Canceled,
    /// Non-zero exit tolerated by the error policy. `None` when the process
    /// was killed by a signal.
    Failed(Option<i32>),
}

impl CommandOutcome {
    /// Classify a terminated child.
    ///
    /// `code` is `None` when the process died from a signal.
    pub fn classify(
        success: bool,
        code: Option<i32>,
        scope_cancelled: bool,
        long_running: bool,
    ) -> Self {
        if success {
            CommandOutcome::Success
        } else if scope_cancelled || (long_running && code.is_none()) {
            CommandOutcome::Canceled
        } else {
            CommandOutcome::Failed(code)
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CommandOutcome::Success)
    }
}
