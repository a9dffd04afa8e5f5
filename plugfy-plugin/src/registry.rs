//! Transport registry: resolves a logical transport name to a channel instance

use plugfy_channel::CommunicationChannel;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::discovery::ModuleDiscovery;
use crate::error::{PluginError, PluginResult};
use crate::loader::{ChannelLoader, DynamicChannelLoader, LoadedModule};

/// A channel type found while listing a plugin directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailableTransport {
    /// Logical transport name reported by the channel
    pub name: String,
    /// Module that exposes it
    pub module: PathBuf,
}

/// Resolves transport names against a directory of plugin modules.
///
/// Every lookup scans the directory again and returns a freshly constructed
/// channel; instances are never cached. Modules that fail to load or
/// instantiate are logged and skipped.
pub struct TransportRegistry {
    discovery: ModuleDiscovery,
    loader: Box<dyn ChannelLoader>,
}

impl TransportRegistry {
    /// Create a registry backed by the given loader
    pub fn new(loader: Box<dyn ChannelLoader>) -> Self {
        Self {
            discovery: ModuleDiscovery::new(),
            loader,
        }
    }

    /// Registry loading shared libraries with the platform extension
    pub fn dynamic() -> Self {
        Self::new(Box::new(DynamicChannelLoader::new()))
    }

    /// Replace the candidate discovery settings
    pub fn with_discovery(mut self, discovery: ModuleDiscovery) -> Self {
        self.discovery = discovery;
        self
    }

    /// Find the first channel whose name equals `communication_type`
    /// (case-insensitive), scanning modules in file-name order and channel
    /// types in module declaration order.
    pub async fn resolve(
        &self,
        communication_type: &str,
        search_dir: &Path,
    ) -> PluginResult<Box<dyn CommunicationChannel>> {
        let candidates = self.discovery.discover(search_dir)?;

        tracing::debug!(
            target: "transport_registry",
            communication_type = communication_type,
            path = ?search_dir,
            candidates = candidates.len(),
            loader = self.loader.loader_type(),
            "Resolving communication extension"
        );

        if !communication_type.trim().is_empty() {
            for path in &candidates {
                let Some(module) = self.load(path).await else {
                    continue;
                };

                for index in 0..module.len() {
                    let channel = match module.instantiate(index) {
                        Ok(channel) => channel,
                        Err(e) => {
                            // One bad type takes the rest of its module with it
                            log_skipped(path, &e);
                            break;
                        }
                    };

                    if channel.name().eq_ignore_ascii_case(communication_type) {
                        tracing::info!(
                            target: "transport_registry",
                            communication_type = communication_type,
                            channel = channel.name(),
                            module = ?path,
                            "Communication extension selected"
                        );
                        return Ok(channel);
                    }
                }
            }
        }

        Err(PluginError::UnsupportedCommunicationType {
            name: communication_type.to_string(),
        })
    }

    /// List every channel type exposed by the modules in `search_dir`
    pub async fn available(&self, search_dir: &Path) -> PluginResult<Vec<AvailableTransport>> {
        let mut transports = Vec::new();

        for path in self.discovery.discover(search_dir)? {
            let Some(module) = self.load(&path).await else {
                continue;
            };

            for index in 0..module.len() {
                match module.instantiate(index) {
                    Ok(channel) => transports.push(AvailableTransport {
                        name: channel.name().to_string(),
                        module: path.clone(),
                    }),
                    Err(e) => {
                        log_skipped(&path, &e);
                        break;
                    }
                }
            }
        }

        Ok(transports)
    }

    async fn load(&self, path: &Path) -> Option<LoadedModule> {
        match self.loader.load_module(path).await {
            Ok(module) => Some(module),
            Err(e) => {
                log_skipped(path, &e);
                None
            }
        }
    }
}

fn log_skipped(path: &Path, error: &PluginError) {
    tracing::warn!(
        target: "transport_registry",
        module = ?path,
        error = %error,
        "Failed to load communication extension from '{}'",
        path.display()
    );
}
