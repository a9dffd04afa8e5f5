//! Worker command line construction
//!
//! Workers are invoked as
//! `<command> -t <channel> -c <command json> -p '<parameters json>'` where the
//! command json is `{"Type": <operation>, "Parameters": <parameters>}`. The
//! parameters appear twice, once nested and once standalone, and existing
//! workers read both positions.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::{ExecutionError, ExecutionResult};

#[derive(Serialize)]
struct WorkerCommand<'a> {
    #[serde(rename = "Type")]
    kind: &'a str,
    #[serde(rename = "Parameters")]
    parameters: &'a JsonValue,
}

/// Everything needed to launch one worker process
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerInvocation {
    command: PathBuf,
    working_dir: PathBuf,
    channel_name: String,
    operation: String,
    command_json: String,
    parameters_json: String,
}

impl WorkerInvocation {
    /// Build the invocation; a null parameter payload is sent as `{}`
    pub fn new(
        command: &Path,
        channel_name: &str,
        operation: &str,
        parameters: &JsonValue,
    ) -> ExecutionResult<Self> {
        let working_dir = command
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .ok_or_else(|| ExecutionError::InvalidRunnerPath(command.display().to_string()))?
            .to_path_buf();

        let empty = JsonValue::Object(Default::default());
        let parameters = if parameters.is_null() {
            &empty
        } else {
            parameters
        };

        let parameters_json = serde_json::to_string(parameters)?;
        let command_json = serde_json::to_string(&WorkerCommand {
            kind: operation,
            parameters,
        })?;

        Ok(Self {
            command: command.to_path_buf(),
            working_dir,
            channel_name: channel_name.to_string(),
            operation: operation.to_string(),
            command_json,
            parameters_json,
        })
    }

    pub fn command(&self) -> &Path {
        &self.command
    }

    /// Directory containing the worker executable
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn channel_name(&self) -> &str {
        &self.channel_name
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn command_json(&self) -> &str {
        &self.command_json
    }

    pub fn parameters_json(&self) -> &str {
        &self.parameters_json
    }

    /// Argument vector handed to the worker process
    pub fn args(&self) -> Vec<String> {
        vec![
            "-t".to_string(),
            self.channel_name.clone(),
            "-c".to_string(),
            self.command_json.clone(),
            "-p".to_string(),
            format!("'{}'", self.parameters_json),
        ]
    }

    /// Arguments rendered as a single string, as they appear in logs
    pub fn command_line(&self) -> String {
        format!(
            "-t {} -c {} -p '{}'",
            self.channel_name, self.command_json, self.parameters_json
        )
    }
}
