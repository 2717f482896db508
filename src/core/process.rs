//! Running the command lines returned by `cmd` plugins.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use super::stop_signal::StopSignal;
use crate::error::StepError;

/// Split a plugin-produced command line on whitespace. No shell is involved,
/// so quoting and pipes are not interpreted.
pub fn split_command(line: &str) -> Result<(String, Vec<String>), StepError> {
    let mut parts = line.split_whitespace().map(str::to_string);
    let program = parts.next().ok_or(StepError::EmptyCommand)?;
    Ok((program, parts.collect()))
}

/// Run `line` in `cwd` with the terminal attached, bounded by `timeout` and
/// interruptible through `stop`. The child is killed on either.
pub async fn run_command(
    line: &str,
    cwd: &Path,
    timeout: Duration,
    stop: &StopSignal,
) -> Result<(), StepError> {
    let (program, args) = split_command(line)?;
    tracing::info!(command = %line.trim(), cwd = %cwd.display(), "running command");

    let mut child = Command::new(&program)
        .args(&args)
        .current_dir(cwd)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| {
            tracing::error!(command = %program, err = %source, "failed to spawn command");
            StepError::CommandSpawn {
                command: line.trim().to_string(),
                source,
            }
        })?;

    tokio::select! {
        status = child.wait() => {
            let status = status?;
            tracing::debug!(exit_code = ?status.code(), "command finished");
            if status.success() {
                Ok(())
            } else {
                Err(StepError::CommandFailed {
                    command: line.trim().to_string(),
                    status: status.to_string(),
                })
            }
        }
        _ = tokio::time::sleep(timeout) => {
            tracing::warn!(timeout_secs = timeout.as_secs(), "command timed out, killing");
            let _ = child.kill().await;
            Err(StepError::Timeout(timeout))
        }
        _ = stop.cancelled() => {
            tracing::warn!("run cancelled, killing command");
            let _ = child.kill().await;
            Err(StepError::Cancelled)
        }
    }
}
