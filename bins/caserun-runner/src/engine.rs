/// Bounded Executor - run one program under a hard wall-clock limit
///
/// **Core Responsibility:**
/// Launch a RunPlan, feed it input, capture stdout/stderr, and stop it if it
/// outlives its timeout.
///
/// **Architectural Boundary:**
/// - Engine knows HOW to run a process
/// - Engine does NOT compare outputs (evaluator's job)
/// - Engine does NOT build anything (launcher's job)
///
/// **Protocol:**
/// 1. Spawn with fresh piped stdio in its own process group (unix), killed
///    if the handle is dropped
/// 2. Write the whole input on a background task, then close stdin
/// 3. Drain stdout and stderr on background tasks into shared buffers
/// 4. Race process exit against the timer; on timeout SIGKILL the group
/// 5. Kill whatever is left of the group, so descendants cannot hold the
///    pipes open, then give the I/O tasks a short grace period. Tasks that
///    are still blocked after it are aborted and keep what they read.
use caserun_common::types::{ExecutionResult, RunPlan};
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{ChildStdin, Command};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, warn};

/// How long I/O tasks may run on after the process is gone.
const IO_GRACE: Duration = Duration::from_millis(200);

type Captured = Arc<Mutex<Vec<u8>>>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("failed to wait for process: {0}")]
    Wait(std::io::Error),
    #[error("output capture task failed: {0}")]
    Join(#[from] JoinError),
}

/// Run `plan` with `input` on stdin for at most `timeout_ms`.
///
/// A timeout is not an error: the result comes back with `exit_code: None`
/// and whatever output the process produced before it was killed. A failed
/// stdin write lands in `input_error`.
#[tracing::instrument(skip(plan, input), fields(plan = %plan, input_bytes = input.len()))]
pub async fn execute(
    plan: &RunPlan,
    input: &str,
    timeout_ms: u64,
) -> Result<ExecutionResult, EngineError> {
    let mut command = Command::new(&plan.command);
    command
        .args(&plan.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    command.process_group(0);

    let mut child = command.spawn().map_err(|e| EngineError::Spawn {
        command: plan.command.clone(),
        source: e,
    })?;
    let pid = child.id();

    let start = Instant::now();

    let stdout_buf = Captured::default();
    let stderr_buf = Captured::default();
    let stdin_task = tokio::spawn(feed(child.stdin.take(), input.to_owned()));
    let stdout_task = tokio::spawn(drain(child.stdout.take(), stdout_buf.clone()));
    let stderr_task = tokio::spawn(drain(child.stderr.take(), stderr_buf.clone()));

    let timeout_duration = Duration::from_millis(timeout_ms);
    let waited = tokio::time::timeout(timeout_duration, child.wait()).await;
    let exit_code = match waited {
        Ok(status) => Some(exit_code_of(status.map_err(EngineError::Wait)?)),
        Err(_) => match child.try_wait() {
            // Exited right as the timer fired
            Ok(Some(status)) => Some(exit_code_of(status)),
            _ => {
                warn!(timeout_ms, "Execution timed out - killing process group");
                kill_group(pid);
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "Failed to kill timed out process");
                }
                None
            }
        },
    };
    let execution_time_ms = start.elapsed().as_millis() as u64;

    // Background descendants outlive the main process otherwise
    kill_group(pid);

    let input_error = match settle(stdin_task).await? {
        Some(fed) => fed.err().map(|e| e.to_string()),
        None => Some("input was still being written when the process ended".to_string()),
    };
    let stdout_done = settle(stdout_task).await?.is_some();
    let stderr_done = settle(stderr_task).await?.is_some();
    if !(stdout_done && stderr_done) {
        warn!("Output pipes still open after the process ended; keeping partial output");
    }
    let stdout = take_text(&stdout_buf);
    let stderr = take_text(&stderr_buf);

    if let Some(error) = &input_error {
        debug!(error = %error, "Process did not accept all of its input");
    }
    debug!(
        exit_code = ?exit_code,
        execution_ms = execution_time_ms,
        stdout_bytes = stdout.len(),
        stderr_bytes = stderr.len(),
        "Process finished"
    );

    Ok(ExecutionResult {
        exit_code,
        stdout,
        stderr,
        execution_time_ms,
        input_error,
    })
}

/// Wait up to [`IO_GRACE`] for an I/O task; `None` if it had to be aborted.
async fn settle<T>(mut task: JoinHandle<T>) -> Result<Option<T>, EngineError> {
    match tokio::time::timeout(IO_GRACE, &mut task).await {
        Ok(joined) => Ok(Some(joined?)),
        Err(_) => {
            task.abort();
            Ok(None)
        }
    }
}

#[cfg(unix)]
fn kill_group(pid: Option<u32>) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = pid else {
        return;
    };
    // ESRCH just means the group is already gone
    if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        if e != nix::errno::Errno::ESRCH {
            warn!(error = %e, pgid = pid, "Failed to kill process group");
        }
    }
}

#[cfg(not(unix))]
fn kill_group(_pid: Option<u32>) {}

async fn feed(stdin: Option<ChildStdin>, input: String) -> std::io::Result<()> {
    let Some(mut stdin) = stdin else {
        return Ok(());
    };
    stdin.write_all(input.as_bytes()).await?;
    stdin.shutdown().await
    // Dropping `stdin` closes the pipe
}

async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>, captured: Captured) {
    let Some(mut pipe) = pipe else {
        return;
    };
    let mut chunk = [0u8; 8192];
    loop {
        match pipe.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                let mut buf = captured.lock().unwrap_or_else(|e| e.into_inner());
                buf.extend_from_slice(&chunk[..n]);
            }
            Err(e) => {
                warn!(error = %e, "Error reading process output");
                break;
            }
        }
    }
}

fn take_text(captured: &Captured) -> String {
    let bytes = captured.lock().unwrap_or_else(|e| e.into_inner());
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Exit code, or the negated signal number for a process killed by a
/// signal on unix, so that `None` is reserved for timeouts.
fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    -1
}
