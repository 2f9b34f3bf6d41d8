// src/exec/runner.rs

//! Individual command runner.

use std::path::Path;
use std::process::Stdio;
use std::time::Instant;

use anyhow::Context;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::errors::{AldevError, Result};
use crate::exec::CommandOutcome;
use crate::lifecycle::{ErrorPolicy, LoopContext, OutputTarget};

/// Run `cmdline` inside `scope`.
///
/// - The command line is split with shell-word rules; no shell is involved.
/// - The child is killed as soon as the scope is cancelled, and the outcome
///   is then [`CommandOutcome::Canceled`].
/// - Working directory, extra env vars and output targets come from the scope.
/// - A failed exit is handled by the scope's [`ErrorPolicy`].
///
/// `long_running` only changes logging and the classification of signal
/// deaths; it does not detach the child.
pub async fn run(
    reason: &str,
    scope: &LoopContext,
    long_running: bool,
    cmdline: &str,
) -> Result<CommandOutcome> {
    let argv = split_cmdline(cmdline)?;

    if scope.is_cancelled() {
        debug!(reason, cmd = %cmdline, "scope already cancelled; not starting command");
        return Ok(CommandOutcome::Canceled);
    }

    let mut cmd = Command::new(&argv[0]);
    cmd.args(&argv[1..])
        .stdout(stdio_for(scope.stdout()))
        .stderr(stdio_for(scope.stderr()))
        .kill_on_drop(true);
    if let Some(dir) = scope.exec_dir() {
        cmd.current_dir(dir);
    }
    cmd.envs(scope.envs().iter().map(|(k, v)| (k.as_str(), v.as_str())));

    if long_running {
        info!("Starting: {reason}");
    }
    debug!(reason, cmd = %cmdline, dir = ?scope.exec_dir(), "running command");

    let start = Instant::now();
    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning '{cmdline}' ({reason})"))?;

    let outcome = tokio::select! {
        status = child.wait() => {
            let status = status.with_context(|| format!("waiting for '{cmdline}'"))?;
            CommandOutcome::classify(
                status.success(),
                status.code(),
                scope.is_cancelled(),
                long_running,
            )
        }
        _ = scope.cancelled() => {
            debug!(reason, cmd = %cmdline, "scope cancelled; killing command");
            if let Err(err) = child.kill().await {
                warn!(reason, error = %err, "failed to kill command on cancellation");
            }
            CommandOutcome::Canceled
        }
    };

    let elapsed = start.elapsed();
    match outcome {
        CommandOutcome::Success => info!("Done: {reason} (in {elapsed:?})"),
        CommandOutcome::Canceled => info!("Canceled: {reason} (after {elapsed:?})"),
        CommandOutcome::Failed(code) => {
            return handle_failure(reason, scope, cmdline, code);
        }
    }

    Ok(outcome)
}

fn handle_failure(
    reason: &str,
    scope: &LoopContext,
    cmdline: &str,
    code: Option<i32>,
) -> Result<CommandOutcome> {
    match scope.error_policy() {
        ErrorPolicy::Fail => Err(AldevError::CommandFailed {
            reason: reason.to_string(),
            cmd: cmdline.to_string(),
            code,
        }),
        ErrorPolicy::CancelLoop => {
            error!(reason, cmd = %cmdline, ?code, "command failed; cancelling the current loop");
            scope.cancel();
            Ok(CommandOutcome::Failed(code))
        }
        ErrorPolicy::Ignore => {
            warn!(reason, cmd = %cmdline, ?code, "command failed; ignoring");
            Ok(CommandOutcome::Failed(code))
        }
    }
}

/// Run `cmdline` to completion and return its stdout. Stderr is inherited.
///
/// Not bound to any scope. A failed exit is always an error.
pub async fn run_and_capture(
    reason: &str,
    work_dir: Option<&Path>,
    long_running: bool,
    cmdline: &str,
) -> Result<Vec<u8>> {
    let argv = split_cmdline(cmdline)?;

    let mut cmd = Command::new(&argv[0]);
    cmd.args(&argv[1..])
        .stdin(Stdio::null())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);
    if let Some(dir) = work_dir {
        cmd.current_dir(dir);
    }

    if long_running {
        info!("Starting: {reason}");
    }
    debug!(reason, cmd = %cmdline, dir = ?work_dir, "running command for its output");

    let start = Instant::now();
    let output = cmd
        .output()
        .await
        .with_context(|| format!("running '{cmdline}' ({reason})"))?;

    if !output.status.success() {
        return Err(AldevError::CommandFailed {
            reason: reason.to_string(),
            cmd: cmdline.to_string(),
            code: output.status.code(),
        });
    }

    debug!(reason, elapsed = ?start.elapsed(), bytes = output.stdout.len(), "captured command output");
    Ok(output.stdout)
}

/// Best-effort housekeeping command: uncancelable, stderr discarded,
/// failures logged and ignored.
pub async fn quick_run(reason: &str, cmdline: &str) -> Result<CommandOutcome> {
    let scope = LoopContext::detached()
        .with_stderr(OutputTarget::Discard)
        .with_error_policy(ErrorPolicy::Ignore);
    run(reason, &scope, false, cmdline).await
}

fn split_cmdline(cmdline: &str) -> Result<Vec<String>> {
    match shlex::split(cmdline) {
        Some(argv) if !argv.is_empty() => Ok(argv),
        _ => Err(AldevError::InvalidCommand(cmdline.to_string())),
    }
}

fn stdio_for(target: OutputTarget) -> Stdio {
    match target {
        OutputTarget::Inherit => Stdio::inherit(),
        OutputTarget::Discard => Stdio::null(),
        OutputTarget::Stdout => Stdio::from(std::io::stdout()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_quoted_arguments() {
        let argv = split_cmdline(r#"git commit -m "dev: new aldev project""#).unwrap();
        assert_eq!(argv, vec!["git", "commit", "-m", "dev: new aldev project"]);
    }

    #[test]
    fn rejects_empty_and_unbalanced_command_lines() {
        assert!(matches!(split_cmdline("   "), Err(AldevError::InvalidCommand(_))));
        assert!(matches!(split_cmdline("echo \"oops"), Err(AldevError::InvalidCommand(_))));
    }
}
