//! End-of-session signals for interactive executions

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

use crate::error::ExecutionResult;

/// Prompt shown when an interactive session is waiting to be ended
pub const TERMINATION_PROMPT: &str = "Interactive mode started. Press Enter to terminate...";

/// Tell the operator how to end the session
pub async fn show_prompt() -> ExecutionResult<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(TERMINATION_PROMPT.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;
    Ok(())
}

/// Blocks until the operator ends an interactive session
#[async_trait]
pub trait TerminationSignal: Send + Sync {
    async fn wait(&self) -> ExecutionResult<()>;
}

/// Prompts on stdout and waits for a line (or end of input) on stdin.
///
/// Not used for channels that read stdin themselves; those end the session
/// on a blank line.
#[derive(Debug, Default, Clone)]
pub struct StdinTermination;

#[async_trait]
impl TerminationSignal for StdinTermination {
    async fn wait(&self) -> ExecutionResult<()> {
        show_prompt().await?;

        let mut line = String::new();
        let read = BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
        debug!(target: "execution", eof = read == 0, "Interactive session terminated by operator");
        Ok(())
    }
}

/// Ends the session as soon as it is asked; for unattended runs
#[derive(Debug, Default, Clone)]
pub struct ImmediateTermination;

#[async_trait]
impl TerminationSignal for ImmediateTermination {
    async fn wait(&self) -> ExecutionResult<()> {
        Ok(())
    }
}
