//! CLI argument parsing definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "plugfy", author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML or JSON)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the operations offered by the library extension
    Operations {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// List the transports found in a communications directory
    Transports {
        /// Directory to scan (defaults to the configured libraries path)
        #[arg(long, value_name = "PATH")]
        dir: Option<PathBuf>,
    },

    /// Execute an operation through the configured transport and runner
    Execute {
        /// Operation name: list, info or run
        operation: String,

        /// JSON parameters (example: --params='{"assemblyName":"Demo.dll"}')
        #[arg(long, value_name = "JSON")]
        params: Option<String>,

        /// Keep the channel open after the runner exits and print its events
        #[arg(long)]
        interactive: bool,
    },

    /// Print the resolved configuration
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}
