// src/lifecycle/scope.rs

//! The loop scope: a cancelable unit bound to one generation of the
//! build/deploy pipeline, plus the execution settings commands run with.

use std::path::{Path, PathBuf};

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Where a command's stdout or stderr should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputTarget {
    /// Inherit the aldev process stream.
    #[default]
    Inherit,
    /// Throw the output away.
    Discard,
    /// Send the stream to aldev's stdout (useful to merge stderr into stdout).
    Stdout,
}

/// What the shell runner does when a command exits with a failure status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Return an error; the generation boundary turns it into a full stop.
    #[default]
    Fail,
    /// Log the failure and cancel this scope only, so the generation winds
    /// down and waits for the next restart.
    CancelLoop,
    /// Log the failure and carry on.
    Ignore,
}

/// A cancelable scope plus the settings commands started inside it use.
///
/// Clones share the same cancellation token: cancelling any clone cancels
/// them all. The `with_*` builders return a new value and leave the token
/// untouched.
#[derive(Debug, Clone)]
pub struct LoopContext {
    token: CancellationToken,
    generation: Option<u64>,
    exec_dir: Option<PathBuf>,
    stdout: OutputTarget,
    stderr: OutputTarget,
    envs: Vec<(String, String)>,
    error_policy: ErrorPolicy,
}

impl LoopContext {
    /// Fresh scope for the given generation.
    pub(crate) fn for_generation(generation: u64) -> Self {
        Self::with_token(CancellationToken::new(), Some(generation))
    }

    /// A scope that belongs to no generation and is never cancelled by the
    /// lifecycle. Used for cleanup and best-effort housekeeping commands.
    pub fn detached() -> Self {
        Self::with_token(CancellationToken::new(), None)
    }

    fn with_token(token: CancellationToken, generation: Option<u64>) -> Self {
        Self {
            token,
            generation,
            exec_dir: None,
            stdout: OutputTarget::Inherit,
            stderr: OutputTarget::Inherit,
            envs: Vec::new(),
            error_policy: ErrorPolicy::Fail,
        }
    }

    pub fn with_exec_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.exec_dir = Some(dir.into());
        self
    }

    pub fn with_stdout(mut self, target: OutputTarget) -> Self {
        self.stdout = target;
        self
    }

    pub fn with_stderr(mut self, target: OutputTarget) -> Self {
        self.stderr = target;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Generation this scope was created for; `None` for detached scopes.
    pub fn generation(&self) -> Option<u64> {
        self.generation
    }

    pub fn exec_dir(&self) -> Option<&Path> {
        self.exec_dir.as_deref()
    }

    pub fn stdout(&self) -> OutputTarget {
        self.stdout
    }

    pub fn stderr(&self) -> OutputTarget {
        self.stderr
    }

    pub fn envs(&self) -> &[(String, String)] {
        &self.envs
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        self.error_policy
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once this scope is cancelled.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}
