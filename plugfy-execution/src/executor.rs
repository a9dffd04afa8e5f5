//! Worker runner abstraction

use async_trait::async_trait;

use crate::error::ExecutionResult;
use crate::invocation::WorkerInvocation;

/// Output stream of a worker process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputStream::Stdout => "stdout",
            OutputStream::Stderr => "stderr",
        }
    }
}

/// What a finished worker left behind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerOutcome {
    /// Exit code, `None` when the process was ended by a signal
    pub exit_code: Option<i32>,
    /// Non-blank stdout lines in arrival order
    pub stdout: Vec<String>,
    /// Non-blank stderr lines in arrival order
    pub stderr: Vec<String>,
}

impl WorkerOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Launches a worker and waits for it to exit
#[async_trait]
pub trait WorkerRunner: Send + Sync {
    /// Run the worker to completion. There is no timeout.
    async fn run(&self, invocation: &WorkerInvocation) -> ExecutionResult<WorkerOutcome>;
}
