//! Plugin module loading for statically linked and dynamic transports

use async_trait::async_trait;
use plugfy_channel::guard::panic_message;
use plugfy_channel::{
    ChannelError, ChannelFactory, ChannelModuleEntry, CommunicationChannel, CHANNEL_MODULE_SYMBOL,
};
use std::collections::HashMap;
use std::panic;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use crate::error::{PluginError, PluginResult};

/// Opens plugin modules and returns the channel factories they expose
#[async_trait]
pub trait ChannelLoader: Send + Sync {
    /// Load the module at `path`
    async fn load_module(&self, path: &Path) -> PluginResult<LoadedModule>;

    /// Get loader name/type
    fn loader_type(&self) -> &'static str;
}

/// A module that loaded successfully, ready to instantiate its channel types
pub struct LoadedModule {
    path: PathBuf,
    factories: Vec<ChannelFactory>,
    dynamic: bool,
}

impl LoadedModule {
    /// A module whose factories are linked into the host
    pub fn linked(path: impl Into<PathBuf>, factories: Vec<ChannelFactory>) -> Self {
        Self {
            path: path.into(),
            factories,
            dynamic: false,
        }
    }

    /// Module file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of channel types exposed, in declaration order
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether the module exposes no channel types
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Construct a fresh instance of the channel type at `index`.
    ///
    /// A failing factory is reported as [`PluginError::InstantiationFailed`].
    /// Factories from shared libraries report their own panics; a panic is
    /// only caught here for factories linked into the host.
    pub fn instantiate(&self, index: usize) -> PluginResult<Box<dyn CommunicationChannel>> {
        let factory = self.factories.get(index).copied().ok_or_else(|| {
            PluginError::InstantiationFailed {
                path: self.path.display().to_string(),
                reason: format!("no channel type at index {}", index),
            }
        })?;

        let created = panic::catch_unwind(factory)
            .unwrap_or_else(|payload| Err(ChannelError::Panicked(panic_message(payload.as_ref()))));
        let channel = created.map_err(|e| PluginError::InstantiationFailed {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(channel)
    }
}

impl std::fmt::Debug for LoadedModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModule")
            .field("path", &self.path)
            .field("channel_types", &self.factories.len())
            .field("dynamic", &self.dynamic)
            .finish()
    }
}

/// Loader for channel modules compiled into the host binary.
///
/// Modules are registered under a file name; a file with that name must
/// still be present in the plugin directory for the module to be considered.
pub struct StaticChannelLoader {
    modules: HashMap<String, Vec<ChannelFactory>>,
}

impl StaticChannelLoader {
    /// Create an empty static loader
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
        }
    }

    /// Register the channel types of a module under its file name
    pub fn add_module(&mut self, file_name: impl Into<String>, factories: Vec<ChannelFactory>) {
        self.modules.insert(file_name.into(), factories);
    }

    /// Builder-style variant of [`StaticChannelLoader::add_module`]
    pub fn with_module(mut self, file_name: impl Into<String>, factories: Vec<ChannelFactory>) -> Self {
        self.add_module(file_name, factories);
        self
    }
}

impl Default for StaticChannelLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChannelLoader for StaticChannelLoader {
    async fn load_module(&self, path: &Path) -> PluginResult<LoadedModule> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();

        match self.modules.get(file_name) {
            Some(factories) => Ok(LoadedModule::linked(path, factories.clone())),
            None => Err(PluginError::module_load_failed(
                path.display().to_string(),
                "no linked module registered under this file name",
            )),
        }
    }

    fn loader_type(&self) -> &'static str {
        "static"
    }
}

/// Loader for channel modules in shared libraries.
///
/// Libraries are never unloaded: a plugin may leave threads running after its
/// channel is closed. The same path is only opened once per loader; channel
/// instances are always fresh.
pub struct DynamicChannelLoader {
    /// Loaded libraries by path
    libraries: RwLock<HashMap<PathBuf, &'static libloading::Library>>,
}

impl DynamicChannelLoader {
    /// Create a new dynamic loader
    pub fn new() -> Self {
        Self {
            libraries: RwLock::new(HashMap::new()),
        }
    }

    async fn library(&self, path: &Path) -> PluginResult<&'static libloading::Library> {
        if let Some(library) = self.libraries.read().await.get(path) {
            return Ok(*library);
        }

        let mut libraries = self.libraries.write().await;
        if let Some(library) = libraries.get(path) {
            return Ok(*library);
        }

        // Loading runs the library's initializers; plugins are trusted code.
        let library: &'static libloading::Library =
            Box::leak(Box::new(unsafe { libloading::Library::new(path)? }));
        tracing::debug!(target: "plugin_loader", path = ?path, "Loaded shared library");
        libraries.insert(path.to_path_buf(), library);
        Ok(library)
    }
}

impl Default for DynamicChannelLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChannelLoader for DynamicChannelLoader {
    async fn load_module(&self, path: &Path) -> PluginResult<LoadedModule> {
        if !path.exists() {
            return Err(PluginError::module_load_failed(
                path.display().to_string(),
                "file not found",
            ));
        }

        let library = self.library(path).await?;

        // The symbol type must match the one `export_channels!` generates.
        let entry: ChannelModuleEntry = unsafe {
            *library
                .get::<ChannelModuleEntry>(CHANNEL_MODULE_SYMBOL)
                .map_err(PluginError::DynamicLoadingError)?
        };

        // Generated entry points contain their own panics
        let factories = entry();

        tracing::debug!(
            target: "plugin_loader",
            path = ?path,
            channel_types = factories.len(),
            "Loaded communication module"
        );

        Ok(LoadedModule {
            path: path.to_path_buf(),
            factories,
            dynamic: true,
        })
    }

    fn loader_type(&self) -> &'static str {
        "dynamic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plugfy_channel::{ChannelResult, ChannelState, InboundSender};
    use serde_json::Value as JsonValue;
    use std::fs;
    use tempfile::TempDir;

    struct NullChannel;

    #[async_trait]
    impl CommunicationChannel for NullChannel {
        fn name(&self) -> &str {
            "Null"
        }

        fn state(&self) -> ChannelState {
            ChannelState::Created
        }

        async fn initialize(&mut self, _parameters: &JsonValue) -> ChannelResult<()> {
            Ok(())
        }

        async fn start_listening(&mut self, _inbound: InboundSender) -> ChannelResult<()> {
            Ok(())
        }

        async fn send(&mut self, _data: &JsonValue) -> ChannelResult<()> {
            Ok(())
        }

        async fn close(&mut self) -> ChannelResult<()> {
            Ok(())
        }
    }

    fn null_channel() -> ChannelResult<Box<dyn CommunicationChannel>> {
        Ok(Box::new(NullChannel))
    }

    fn exploding_channel() -> ChannelResult<Box<dyn CommunicationChannel>> {
        panic!("constructor failed")
    }

    fn refusing_channel() -> ChannelResult<Box<dyn CommunicationChannel>> {
        Err(ChannelError::Panicked("no transport here".to_string()))
    }

    #[tokio::test]
    async fn test_static_loader_by_file_name() {
        let loader = StaticChannelLoader::new().with_module("null.so", vec![null_channel]);

        let module = loader.load_module(Path::new("/plugins/null.so")).await.unwrap();
        assert_eq!(module.len(), 1);
        assert_eq!(module.path(), Path::new("/plugins/null.so"));
        assert_eq!(module.instantiate(0).unwrap().name(), "Null");
        assert!(module.instantiate(1).is_err());

        let missing = loader.load_module(Path::new("/plugins/other.so")).await;
        assert!(matches!(missing, Err(PluginError::ModuleLoadFailed { .. })));
    }

    #[tokio::test]
    async fn test_panicking_factory_is_reported() {
        let module = LoadedModule::linked("boom.so", vec![exploding_channel]);
        let err = module.instantiate(0).err().unwrap();

        match err {
            PluginError::InstantiationFailed { path, reason } => {
                assert_eq!(path, "boom.so");
                assert_eq!(reason, "Channel panicked: constructor failed");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_failing_factory_is_reported() {
        let module = LoadedModule::linked("refused.so", vec![refusing_channel, null_channel]);

        assert!(matches!(
            module.instantiate(0),
            Err(PluginError::InstantiationFailed { reason, .. }) if reason.contains("no transport here")
        ));
        assert_eq!(module.instantiate(1).unwrap().name(), "Null");
    }

    #[tokio::test]
    async fn test_dynamic_loader_rejects_non_library() {
        let tmp = TempDir::new().unwrap();
        let bogus = tmp.path().join("bogus.so");
        fs::write(&bogus, b"definitely not a shared object").unwrap();

        let loader = DynamicChannelLoader::new();
        let result = loader.load_module(&bogus).await;
        assert!(matches!(result, Err(PluginError::DynamicLoadingError(_))));

        let missing = loader.load_module(&tmp.path().join("missing.so")).await;
        assert!(matches!(missing, Err(PluginError::ModuleLoadFailed { .. })));
    }

    #[test]
    fn test_loader_types() {
        assert_eq!(StaticChannelLoader::new().loader_type(), "static");
        assert_eq!(DynamicChannelLoader::new().loader_type(), "dynamic");
    }
}
