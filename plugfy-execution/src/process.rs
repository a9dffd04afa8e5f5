//! Worker process runner backed by `tokio::process`

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{ExecutionError, ExecutionResult};
use crate::executor::{OutputStream, WorkerOutcome, WorkerRunner};
use crate::invocation::WorkerInvocation;

/// Spawns the worker as a child process and relays its output to the log
#[derive(Debug, Default, Clone)]
pub struct ProcessWorkerRunner;

impl ProcessWorkerRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl WorkerRunner for ProcessWorkerRunner {
    async fn run(&self, invocation: &WorkerInvocation) -> ExecutionResult<WorkerOutcome> {
        info!(
            target: "runner",
            "Starting runner with command: {} {}",
            invocation.command().display(),
            invocation.command_line()
        );

        let mut child = Command::new(invocation.command())
            .args(invocation.args())
            .current_dir(invocation.working_dir())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecutionError::SpawnFailed {
                command: invocation.command().display().to_string(),
                source,
            })?;

        debug!(target: "runner", pid = ?child.id(), "Runner process started");

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("runner stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("runner stderr was not captured"))?;

        let stdout_task = tokio::spawn(relay_lines(stdout, OutputStream::Stdout));
        let stderr_task = tokio::spawn(relay_lines(stderr, OutputStream::Stderr));

        let status = child.wait().await?;

        let stdout = stdout_task.await.map_err(std::io::Error::other)?;
        let stderr = stderr_task.await.map_err(std::io::Error::other)?;

        info!(target: "runner", exit_code = ?status.code(), "Runner exited");

        Ok(WorkerOutcome {
            exit_code: status.code(),
            stdout,
            stderr,
        })
    }
}

/// Log each non-blank line of a worker stream as it arrives
async fn relay_lines<R>(reader: R, stream: OutputStream) -> Vec<String>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut lines = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\r', '\n']);
                if line.trim().is_empty() {
                    continue;
                }
                match stream {
                    OutputStream::Stdout => {
                        info!(target: "runner", stream = stream.as_str(), "[Runner stdout]: {}", line)
                    }
                    OutputStream::Stderr => {
                        warn!(target: "runner", stream = stream.as_str(), "[Runner stderr]: {}", line)
                    }
                }
                lines.push(line.to_string());
            }
            Err(e) => {
                warn!(target: "runner", stream = stream.as_str(), "Failed to read runner output: {}", e);
                break;
            }
        }
    }

    lines
}
