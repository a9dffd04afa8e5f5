//! Execution coordinator for the library extension
//!
//! One `execute` call walks through
//! `resolve channel -> initialize -> start listening -> run worker ->
//! [wait for operator] -> close`. The channel is closed on every path once it
//! has been resolved, and inbound payloads are drained by a dispatch task that
//! logs each one and, in interactive mode, forwards it to the caller's sink.
//!
//! A channel that reads the operator's terminal ends the interactive session
//! itself with an end-of-session payload; otherwise the termination signal
//! decides when the session is over.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use plugfy_channel::{inbound_queue, ChannelState, CommunicationChannel, InboundReceiver, InboundSender};
use plugfy_config::{ConfigSource, LibraryConfig};
use plugfy_plugin::TransportRegistry;
use serde_json::Value as JsonValue;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::catalog::{OperationCatalog, OperationDescriptor};
use crate::error::{ExecutionError, ExecutionResult};
use crate::events::{EventSink, RuntimeEvent};
use crate::executor::{WorkerOutcome, WorkerRunner};
use crate::invocation::WorkerInvocation;
use crate::process::ProcessWorkerRunner;
use crate::terminal::{show_prompt, StdinTermination, TerminationSignal};

/// Summary of a completed execution
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    pub execution_id: Uuid,
    pub operation: String,
    /// Name reported by the selected channel
    pub channel: String,
    pub interactive: bool,
    pub outcome: WorkerOutcome,
    /// Inbound payloads received from the channel
    pub inbound_events: usize,
}

/// The library extension: advertises its operations and runs them through a
/// worker process connected by a pluggable transport.
pub struct LibraryExtension {
    catalog: OperationCatalog,
    settings: Arc<dyn ConfigSource>,
    registry: TransportRegistry,
    runner: Box<dyn WorkerRunner>,
    termination: Box<dyn TerminationSignal>,
}

impl LibraryExtension {
    /// Extension loading transports from shared libraries, running the worker
    /// as a child process and ending interactive sessions from stdin
    pub fn new(settings: Arc<dyn ConfigSource>) -> Self {
        Self {
            catalog: OperationCatalog::library(),
            settings,
            registry: TransportRegistry::dynamic(),
            runner: Box::new(ProcessWorkerRunner::new()),
            termination: Box::new(StdinTermination),
        }
    }

    pub fn with_registry(mut self, registry: TransportRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_runner(mut self, runner: Box<dyn WorkerRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_termination(mut self, termination: Box<dyn TerminationSignal>) -> Self {
        self.termination = termination;
        self
    }

    /// Operations this extension offers
    pub fn execution_options(&self) -> &[OperationDescriptor] {
        self.catalog.operations()
    }

    pub fn catalog(&self) -> &OperationCatalog {
        &self.catalog
    }

    /// Look up `operation` in the catalog and execute it
    pub async fn execute_by_name(
        &self,
        operation: &str,
        parameters: &JsonValue,
        events: Option<Arc<dyn EventSink>>,
    ) -> ExecutionResult<ExecutionReport> {
        let descriptor = self
            .catalog
            .get(operation)
            .ok_or_else(|| ExecutionError::UnknownOperation(operation.to_string()))?;
        self.execute(descriptor, parameters, events).await
    }

    /// Execute one operation.
    ///
    /// `events` only receives data in interactive mode. Configuration is read
    /// on every call.
    pub async fn execute(
        &self,
        operation: &OperationDescriptor,
        parameters: &JsonValue,
        events: Option<Arc<dyn EventSink>>,
    ) -> ExecutionResult<ExecutionReport> {
        let execution_id = Uuid::new_v4();
        let span = info_span!(
            "execution",
            execution_id = %execution_id,
            operation = %operation.name
        );

        self.execute_inner(execution_id, operation, parameters, events)
            .instrument(span)
            .await
    }

    async fn execute_inner(
        &self,
        execution_id: Uuid,
        operation: &OperationDescriptor,
        parameters: &JsonValue,
        events: Option<Arc<dyn EventSink>>,
    ) -> ExecutionResult<ExecutionReport> {
        let config = LibraryConfig::from_source(self.settings.as_ref())?;
        let search_dir = std::path::absolute(&config.libraries_path)?;

        info!(
            target: "execution",
            communication_type = %config.communication_type,
            interactive = config.interactive,
            "Starting execution"
        );

        let mut channel = self
            .registry
            .resolve(&config.communication_type, &search_dir)
            .await?;
        let channel_name = channel.name().to_string();

        let (inbound_tx, inbound_rx) = inbound_queue();
        let sink = if config.interactive { events } else { None };
        let session_end = Arc::new(Notify::new());
        let dispatcher = spawn_dispatch(inbound_rx, sink, Arc::clone(&session_end));

        let result = self
            .drive(&config, operation, parameters, channel.as_mut(), inbound_tx, &session_end)
            .await;

        let closed = channel.close().await;
        debug!(target: "execution", channel = %channel_name, "Channel closed");
        // Dropping the channel releases any sender it failed to drop in close
        drop(channel);

        let inbound_events = match dispatcher.await {
            Ok(count) => count,
            Err(e) => {
                warn!(target: "execution", "Inbound dispatch task failed: {}", e);
                0
            }
        };

        let outcome = match (result, closed) {
            (Ok(outcome), Ok(())) => outcome,
            (Ok(_), Err(e)) => return Err(e.into()),
            (Err(e), close_result) => {
                if let Err(close_error) = close_result {
                    error!(
                        target: "execution",
                        channel = %channel_name,
                        "Failed to close channel after error: {}",
                        close_error
                    );
                }
                return Err(e);
            }
        };

        info!(
            target: "execution",
            exit_code = ?outcome.exit_code,
            inbound_events,
            "Execution completed"
        );

        Ok(ExecutionReport {
            execution_id,
            operation: operation.name.clone(),
            channel: channel_name,
            interactive: config.interactive,
            outcome,
            inbound_events,
        })
    }

    /// Steps between channel resolution and close
    async fn drive(
        &self,
        config: &LibraryConfig,
        operation: &OperationDescriptor,
        parameters: &JsonValue,
        channel: &mut dyn CommunicationChannel,
        inbound: InboundSender,
        session_end: &Notify,
    ) -> ExecutionResult<WorkerOutcome> {
        channel.initialize(parameters).await?;
        channel.start_listening(inbound).await?;

        let state = channel.state();
        if state != ChannelState::Listening {
            return Err(ExecutionError::ChannelNotReady {
                channel: channel.name().to_string(),
                state,
            });
        }

        let command = runner_command(config)?;
        let invocation = WorkerInvocation::new(&command, channel.name(), &operation.name, parameters)?;
        let outcome = self.runner.run(&invocation).await?;

        if !outcome.success() {
            warn!(
                target: "execution",
                exit_code = ?outcome.exit_code,
                stderr_lines = outcome.stderr.len(),
                "Runner exited unsuccessfully"
            );
            if config.fail_on_worker_error {
                return Err(ExecutionError::WorkerFailed {
                    exit_code: outcome.exit_code,
                });
            }
        }

        if config.interactive {
            if channel.owns_terminal() {
                show_prompt().await?;
                session_end.notified().await;
                debug!(
                    target: "execution",
                    channel = channel.name(),
                    "Interactive session ended by channel"
                );
            } else {
                self.termination.wait().await?;
            }
        }

        Ok(outcome)
    }
}

/// Absolute path of the configured worker executable, which must be a file
fn runner_command(config: &LibraryConfig) -> ExecutionResult<PathBuf> {
    let configured = config.runner_command.as_deref().unwrap_or(Path::new(""));
    if configured.as_os_str().is_empty() {
        return Err(ExecutionError::RunnerNotFound(String::new()));
    }

    let command = std::path::absolute(configured)?;
    if !command.is_file() {
        return Err(ExecutionError::RunnerNotFound(command.display().to_string()));
    }

    Ok(command)
}

/// Drain inbound payloads in arrival order until every sender is gone.
///
/// End-of-session payloads are not data: they wake `session_end` and are
/// neither counted nor forwarded. The session also ends once the queue does.
fn spawn_dispatch(
    mut inbound: InboundReceiver,
    sink: Option<Arc<dyn EventSink>>,
    session_end: Arc<Notify>,
) -> JoinHandle<usize> {
    tokio::spawn(
        async move {
            let mut received = 0;
            while let Some(payload) = inbound.recv().await {
                if payload.is_end_of_session() {
                    session_end.notify_one();
                    continue;
                }
                info!(target: "execution", "[Runner -> Library] Received: {}", payload.data);
                if let Some(sink) = &sink {
                    sink.on_event(RuntimeEvent::interactive(payload.data));
                }
                received += 1;
            }
            session_end.notify_one();
            received
        }
        .in_current_span(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runner_command_missing() {
        let config = LibraryConfig::default();
        assert!(matches!(
            runner_command(&config),
            Err(ExecutionError::RunnerNotFound(path)) if path.is_empty()
        ));
    }

    #[test]
    fn test_runner_command_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = LibraryConfig {
            runner_command: Some(dir.path().to_path_buf()),
            ..LibraryConfig::default()
        };
        assert!(matches!(
            runner_command(&config),
            Err(ExecutionError::RunnerNotFound(_))
        ));
    }

    #[test]
    fn test_runner_command_resolves_file() {
        let dir = tempfile::tempdir().unwrap();
        let runner = dir.path().join("Plugfy.Runner");
        std::fs::write(&runner, b"").unwrap();

        let config = LibraryConfig {
            runner_command: Some(runner.clone()),
            ..LibraryConfig::default()
        };
        assert_eq!(runner_command(&config).unwrap(), runner);
    }

    #[tokio::test]
    async fn test_dispatch_counts_without_sink() {
        let (tx, rx) = inbound_queue();
        let handle = spawn_dispatch(rx, None, Arc::new(Notify::new()));
        tx.send(plugfy_channel::InboundData::new(serde_json::json!(1))).unwrap();
        tx.send(plugfy_channel::InboundData::new(serde_json::json!(2))).unwrap();
        drop(tx);
        assert_eq!(handle.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_dispatch_consumes_end_of_session() {
        let (tx, rx) = inbound_queue();
        let session_end = Arc::new(Notify::new());
        let handle = spawn_dispatch(rx, None, Arc::clone(&session_end));

        tx.send(plugfy_channel::InboundData::new(serde_json::json!("data"))).unwrap();
        tx.send(plugfy_channel::InboundData::end_of_session()).unwrap();
        session_end.notified().await;

        drop(tx);
        assert_eq!(handle.await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_ends_session_when_queue_closes() {
        let (tx, rx) = inbound_queue();
        let session_end = Arc::new(Notify::new());
        let handle = spawn_dispatch(rx, None, Arc::clone(&session_end));

        drop(tx);
        session_end.notified().await;
        assert_eq!(handle.await.unwrap(), 0);
    }
}
