//! Library extension configuration: transport selection and runner location

use serde::Serialize;
use std::path::PathBuf;

use crate::error::ConfigResult;
use crate::source::ConfigSource;
use crate::validation::{parse_bool, Validatable};

/// Setting keys read by the library extension
pub mod keys {
    /// Logical name of the transport to select
    pub const COMMUNICATION_TYPE: &str = "Extensions:Library:Communications:Type";
    /// Whether executions run in interactive mode
    pub const INTERACTIVE: &str = "Extensions:Library:Communications:Interactive";
    /// Path to the worker executable
    pub const RUNNER_COMMAND: &str = "Extensions:Library:Runners:DotNet8:Command";
    /// Whether a non-zero worker exit fails the execution
    pub const RUNNER_FAIL_ON_ERROR: &str = "Extensions:Library:Runners:DotNet8:FailOnError";

    /// Plugin directory key for a given transport type
    pub fn libraries_path(communication_type: &str) -> String {
        format!(
            "Extensions:Library:Communications:{}:LibrariesPath",
            communication_type
        )
    }
}

/// Transport used when none is configured
pub const DEFAULT_COMMUNICATION_TYPE: &str = "STDInOut";

/// Plugin directory used when none is configured for the selected transport
pub const DEFAULT_LIBRARIES_PATH: &str = "./Extensions/Library/Extensions/Communications/";

/// Resolved library extension settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LibraryConfig {
    /// Requested transport name, matched case-insensitively against plugins
    pub communication_type: String,

    /// Keep the channel open after the worker exits until the operator ends the session
    pub interactive: bool,

    /// Directory scanned for transport plugins
    pub libraries_path: PathBuf,

    /// Worker executable; absence is reported when an execution needs it
    pub runner_command: Option<PathBuf>,

    /// Treat a non-zero worker exit code as an execution failure
    pub fail_on_worker_error: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            communication_type: DEFAULT_COMMUNICATION_TYPE.to_string(),
            interactive: false,
            libraries_path: PathBuf::from(DEFAULT_LIBRARIES_PATH),
            runner_command: None,
            fail_on_worker_error: false,
        }
    }
}

impl LibraryConfig {
    /// Resolve the library settings from a source, applying defaults.
    ///
    /// The plugin directory key depends on the transport type, so the type
    /// is resolved first.
    pub fn from_source(source: &dyn ConfigSource) -> ConfigResult<Self> {
        let communication_type = source.get_or(keys::COMMUNICATION_TYPE, DEFAULT_COMMUNICATION_TYPE);

        let interactive = match source.get(keys::INTERACTIVE) {
            Some(value) => parse_bool(keys::INTERACTIVE, &value)?,
            None => false,
        };

        let libraries_path = PathBuf::from(source.get_or(
            &keys::libraries_path(&communication_type),
            DEFAULT_LIBRARIES_PATH,
        ));

        let runner_command = source
            .get(keys::RUNNER_COMMAND)
            .filter(|command| !command.trim().is_empty())
            .map(PathBuf::from);

        let fail_on_worker_error = match source.get(keys::RUNNER_FAIL_ON_ERROR) {
            Some(value) => parse_bool(keys::RUNNER_FAIL_ON_ERROR, &value)?,
            None => false,
        };

        let config = Self {
            communication_type,
            interactive,
            libraries_path,
            runner_command,
            fail_on_worker_error,
        };
        config.validate()?;
        Ok(config)
    }
}

impl Validatable for LibraryConfig {
    fn validate(&self) -> ConfigResult<()> {
        // An empty transport type is left to the registry, which reports it
        // as unsupported
        if self.libraries_path.as_os_str().is_empty() {
            return Err(self.validation_error("libraries_path cannot be empty"));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "library"
    }
}
