//! Bounded child-process execution
//!
//! One function: spawn, wait under a deadline, collect output. The child
//! handle never escapes this module and `kill_on_drop` guarantees the
//! process is reaped on every exit path, including timeout and task
//! abort. No retries, no caching - callers decide policy.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use super::error::CloudError;

/// Cap on captured stderr attached to failures
pub const STDERR_CAP: usize = 8 * 1024;

/// Cap on captured stdout. Oversized output is truncated, which will
/// surface as a decode failure rather than unbounded memory use.
pub const STDOUT_CAP: usize = 512 * 1024;

/// Raw result of a successful (exit 0) invocation
#[derive(Debug)]
pub struct ProcessOutput {
    pub stdout: Vec<u8>,
    /// True when stdout exceeded [`STDOUT_CAP`] and was cut
    pub truncated: bool,
}

/// Run `program args..` to completion under `deadline`.
///
/// - deadline expiry -> `CloudError::Timeout` (child killed and reaped)
/// - spawn failure -> `CloudError::Spawn`
/// - non-zero exit -> `CloudError::Failed` with capped stderr
pub async fn run(program: &str, args: &[String], deadline: Duration) -> Result<ProcessOutput, CloudError> {
    run_in(program, args, None, deadline).await
}

/// As [`run`], with an optional working directory
pub async fn run_in(
    program: &str,
    args: &[String],
    cwd: Option<&std::path::Path>,
    deadline: Duration,
) -> Result<ProcessOutput, CloudError> {
    debug!(%program, ?args, ?cwd, ?deadline, "process::run");

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    let child = command.output();

    let output = match tokio::time::timeout(deadline, child).await {
        Ok(Ok(output)) => output,
        Ok(Err(source)) => {
            warn!(%program, %source, "process::run: spawn failed");
            return Err(CloudError::Spawn {
                program: program.to_string(),
                source,
            });
        }
        Err(_) => {
            warn!(%program, ?deadline, "process::run: deadline expired");
            return Err(CloudError::Timeout {
                program: program.to_string(),
                deadline,
            });
        }
    };

    if !output.status.success() {
        let mut stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if stderr.len() > STDERR_CAP {
            stderr.truncate(STDERR_CAP);
            stderr.push_str("\n[stderr truncated]");
        }
        debug!(%program, code = ?output.status.code(), "process::run: non-zero exit");
        return Err(CloudError::Failed {
            program: program.to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            stderr,
        });
    }

    let mut stdout = output.stdout;
    let truncated = stdout.len() > STDOUT_CAP;
    if truncated {
        warn!(%program, len = stdout.len(), "process::run: stdout truncated");
        stdout.truncate(STDOUT_CAP);
    }

    Ok(ProcessOutput { stdout, truncated })
}
