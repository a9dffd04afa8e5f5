use anyhow::{anyhow, Context, Result};
use clap::Parser;
use plugfy_config::{keys, ConfigLoader, LogFormat, LoggingConfig, PlugfyConfig, Settings};
use plugfy_execution::{EventSink, LibraryExtension, OperationCatalog, RuntimeEvent};
use plugfy_plugin::TransportRegistry;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod cli;
use cli::{Cli, Commands, OutputFormat};

/// Load settings from file or fall back to the environment
fn load_settings(config_path: Option<&PathBuf>) -> Result<Settings> {
    let loader = ConfigLoader::new();

    match config_path {
        Some(path) => {
            if path.exists() {
                info!("Loading configuration from: {:?}", path);
                loader
                    .from_file(path)
                    .context(format!("Failed to load configuration from {:?}", path))
            } else {
                warn!("Configuration file not found: {:?}. Using defaults.", path);
                loader
                    .from_env()
                    .context("Failed to load configuration from environment")
            }
        }
        None => {
            debug!("No configuration file specified. Loading from environment or defaults.");
            loader
                .from_env()
                .context("Failed to load configuration from environment")
        }
    }
}

/// Initialize tracing; `--log-level` wins over `RUST_LOG`, which wins over
/// the configured level. Output goes to stderr so stdout stays free for the
/// transport and command output.
fn init_logging(logging: &LoggingConfig, log_level: Option<&str>) {
    let env_filter = match log_level {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|_| {
            eprintln!("Invalid log level '{}', falling back to 'info'", level);
            EnvFilter::new("info")
        }),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(logging.level.as_filter())),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Text => builder.init(),
    }
}

fn print_operations(format: OutputFormat) -> Result<()> {
    let catalog = OperationCatalog::library();
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(catalog.operations())?,
        OutputFormat::Yaml => serde_yaml::to_string(catalog.operations())?,
    };
    println!("{}", rendered);
    Ok(())
}

async fn list_transports(dir: &Path) -> Result<()> {
    let dir = std::path::absolute(dir)?;
    let transports = TransportRegistry::dynamic()
        .available(&dir)
        .await
        .context(format!("Failed to scan {:?}", dir))?;

    if transports.is_empty() {
        println!("No transports found in {}", dir.display());
    }
    for transport in transports {
        println!("{}\t{}", transport.name, transport.module.display());
    }
    Ok(())
}

async fn execute(settings: Settings, operation: &str, params: Option<&str>) -> Result<()> {
    let parameters: JsonValue = match params {
        Some(raw) => serde_json::from_str(raw).context("Invalid JSON in --params")?,
        None => JsonValue::Null,
    };

    let extension = LibraryExtension::new(Arc::new(settings));
    let descriptor = extension
        .catalog()
        .get(operation)
        .ok_or_else(|| anyhow!("Unknown operation '{}'", operation))?;
    descriptor.validate(&parameters)?;

    // Interactive events are printed as JSON lines
    let (tx, mut rx) = mpsc::unbounded_channel::<RuntimeEvent>();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => warn!("Failed to render runtime event: {}", e),
            }
        }
    });
    let sink: Arc<dyn EventSink> = Arc::new(tx);

    let report = extension
        .execute(descriptor, &parameters, Some(sink))
        .await
        .context(format!("Execution of '{}' failed", operation))?;
    printer.await?;

    info!(
        execution_id = %report.execution_id,
        channel = %report.channel,
        exit_code = ?report.outcome.exit_code,
        inbound_events = report.inbound_events,
        "Execution finished"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first
    let mut settings = load_settings(cli.config.as_ref())?;
    if let Commands::Execute {
        interactive: true, ..
    } = &cli.command
    {
        settings.set(keys::INTERACTIVE, "true");
    }
    let config = PlugfyConfig::from_source(&settings).context("Invalid configuration")?;

    init_logging(&config.logging, cli.log_level.as_deref());
    debug!("Plugfy CLI starting");

    match cli.command {
        Commands::Operations { format } => print_operations(format),
        Commands::Transports { dir } => {
            let dir = dir.unwrap_or_else(|| config.library.libraries_path.clone());
            list_transports(&dir).await
        }
        Commands::Execute {
            operation, params, ..
        } => execute(settings, &operation, params.as_deref()).await,
        Commands::Config => {
            print!("{}", serde_yaml::to_string(&config)?);
            Ok(())
        }
    }
}
