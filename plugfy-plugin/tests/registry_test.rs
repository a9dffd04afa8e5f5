//! Transport resolution against a plugin directory

use async_trait::async_trait;
use plugfy_channel::{
    ChannelLifecycle, ChannelResult, ChannelState, CommunicationChannel, InboundSender,
};
use plugfy_plugin::{ModuleDiscovery, PluginError, StaticChannelLoader, TransportRegistry};
use serde_json::Value as JsonValue;
use std::fs::File;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

struct TestChannel {
    name: &'static str,
    lifecycle: ChannelLifecycle,
}

impl TestChannel {
    fn boxed(name: &'static str) -> ChannelResult<Box<dyn CommunicationChannel>> {
        Ok(Box::new(Self {
            name,
            lifecycle: ChannelLifecycle::new(),
        }))
    }
}

#[async_trait]
impl CommunicationChannel for TestChannel {
    fn name(&self) -> &str {
        self.name
    }

    fn state(&self) -> ChannelState {
        self.lifecycle.state()
    }

    async fn initialize(&mut self, _parameters: &JsonValue) -> ChannelResult<()> {
        self.lifecycle.transition(self.name, ChannelState::Initialized)
    }

    async fn start_listening(&mut self, _inbound: InboundSender) -> ChannelResult<()> {
        self.lifecycle.transition(self.name, ChannelState::Listening)
    }

    async fn send(&mut self, _data: &JsonValue) -> ChannelResult<()> {
        Ok(())
    }

    async fn close(&mut self) -> ChannelResult<()> {
        self.lifecycle.transition(self.name, ChannelState::Closed)
    }
}

fn stdio() -> ChannelResult<Box<dyn CommunicationChannel>> {
    TestChannel::boxed("STDInOut")
}

fn stdio_duplicate() -> ChannelResult<Box<dyn CommunicationChannel>> {
    TestChannel::boxed("stdinout")
}

fn named_pipe() -> ChannelResult<Box<dyn CommunicationChannel>> {
    TestChannel::boxed("NamedPipe")
}

fn exploding() -> ChannelResult<Box<dyn CommunicationChannel>> {
    panic!("factory exploded")
}

static COUNTED: AtomicUsize = AtomicUsize::new(0);

fn counted() -> ChannelResult<Box<dyn CommunicationChannel>> {
    COUNTED.fetch_add(1, Ordering::SeqCst);
    TestChannel::boxed("Counted")
}

fn module_file(dir: &Path, name: &str) -> String {
    let file_name = format!("{}.{}", name, std::env::consts::DLL_EXTENSION);
    File::create(dir.join(&file_name)).unwrap();
    file_name
}

#[tokio::test]
async fn test_scenario_a_stdinout_plugin_selected() {
    let tmp = TempDir::new().unwrap();
    let file = module_file(tmp.path(), "stdio");
    let registry =
        TransportRegistry::new(Box::new(StaticChannelLoader::new().with_module(file, vec![stdio])));

    let channel = registry.resolve("STDInOut", tmp.path()).await.unwrap();
    assert_eq!(channel.name(), "STDInOut");
    assert_eq!(channel.state(), ChannelState::Created);
}

#[tokio::test]
async fn test_scenario_b_unsupported_type() {
    let tmp = TempDir::new().unwrap();
    let file = module_file(tmp.path(), "stdio");
    let registry =
        TransportRegistry::new(Box::new(StaticChannelLoader::new().with_module(file, vec![stdio])));

    let err = registry.resolve("Grpc", tmp.path()).await.err().unwrap();
    assert!(matches!(err, PluginError::UnsupportedCommunicationType { ref name } if name == "Grpc"));
    assert_eq!(err.to_string(), "Unsupported communication type: Grpc");
}

#[tokio::test]
async fn test_empty_type_is_unsupported() {
    let tmp = TempDir::new().unwrap();
    let file = module_file(tmp.path(), "stdio");
    let registry =
        TransportRegistry::new(Box::new(StaticChannelLoader::new().with_module(file, vec![stdio])));

    let err = registry.resolve("", tmp.path()).await.err().unwrap();
    assert!(matches!(err, PluginError::UnsupportedCommunicationType { ref name } if name.is_empty()));
    assert_eq!(err.to_string(), "Unsupported communication type: ");
}

#[tokio::test]
async fn test_name_match_is_case_insensitive() {
    let tmp = TempDir::new().unwrap();
    let file = module_file(tmp.path(), "stdio");
    let registry =
        TransportRegistry::new(Box::new(StaticChannelLoader::new().with_module(file, vec![stdio])));

    let channel = registry.resolve("stdinout", tmp.path()).await.unwrap();
    assert_eq!(channel.name(), "STDInOut");
}

#[tokio::test]
async fn test_missing_directory_fails_before_scanning() {
    let registry = TransportRegistry::new(Box::new(StaticChannelLoader::new()));
    let err = registry
        .resolve("STDInOut", Path::new("/nonexistent/plugfy/communications"))
        .await
        .err()
        .unwrap();

    assert!(matches!(err, PluginError::DirectoryNotFound { .. }));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_bad_module_does_not_block_later_module() {
    let tmp = TempDir::new().unwrap();
    // "a_broken" sorts first and has no linked module behind it
    module_file(tmp.path(), "a_broken");
    let good = module_file(tmp.path(), "b_stdio");
    let registry =
        TransportRegistry::new(Box::new(StaticChannelLoader::new().with_module(good, vec![stdio])));

    let channel = registry.resolve("STDInOut", tmp.path()).await.unwrap();
    assert_eq!(channel.name(), "STDInOut");
}

#[tokio::test]
async fn test_panicking_factory_skips_its_module_only() {
    let tmp = TempDir::new().unwrap();
    let first = module_file(tmp.path(), "a_exploding");
    let second = module_file(tmp.path(), "b_pipe");
    let loader = StaticChannelLoader::new()
        .with_module(first, vec![exploding, stdio])
        .with_module(second, vec![named_pipe]);
    let registry = TransportRegistry::new(Box::new(loader));

    // The stdio type sits behind the exploding factory in the same module
    assert!(registry.resolve("STDInOut", tmp.path()).await.is_err());
    let channel = registry.resolve("namedpipe", tmp.path()).await.unwrap();
    assert_eq!(channel.name(), "NamedPipe");
}

#[tokio::test]
async fn test_first_match_wins_in_listing_then_declaration_order() {
    let tmp = TempDir::new().unwrap();
    let first = module_file(tmp.path(), "a_transports");
    let second = module_file(tmp.path(), "b_transports");
    let loader = StaticChannelLoader::new()
        .with_module(first, vec![named_pipe, stdio_duplicate, stdio])
        .with_module(second, vec![stdio]);
    let registry = TransportRegistry::new(Box::new(loader));

    // stdio_duplicate is declared before stdio in the first module
    let channel = registry.resolve("STDINOUT", tmp.path()).await.unwrap();
    assert_eq!(channel.name(), "stdinout");
}

#[tokio::test]
async fn test_each_resolution_constructs_fresh_instances() {
    let tmp = TempDir::new().unwrap();
    let file = module_file(tmp.path(), "counted");
    let registry = TransportRegistry::new(Box::new(
        StaticChannelLoader::new().with_module(file, vec![counted]),
    ));

    let before = COUNTED.load(Ordering::SeqCst);
    let mut first = registry.resolve("Counted", tmp.path()).await.unwrap();
    let second = registry.resolve("Counted", tmp.path()).await.unwrap();
    assert_eq!(COUNTED.load(Ordering::SeqCst), before + 2);

    first.close().await.unwrap();
    assert_eq!(first.state(), ChannelState::Closed);
    assert_eq!(second.state(), ChannelState::Created);
}

#[tokio::test]
async fn test_non_module_files_are_ignored() {
    let tmp = TempDir::new().unwrap();
    File::create(tmp.path().join("stdio.txt")).unwrap();
    let loader = StaticChannelLoader::new().with_module("stdio.txt", vec![stdio]);
    let registry = TransportRegistry::new(Box::new(loader));

    let err = registry.resolve("STDInOut", tmp.path()).await.err().unwrap();
    assert!(matches!(err, PluginError::UnsupportedCommunicationType { .. }));

    // ...unless discovery is told to use that extension
    let loader = StaticChannelLoader::new().with_module("stdio.txt", vec![stdio]);
    let registry =
        TransportRegistry::new(Box::new(loader)).with_discovery(ModuleDiscovery::with_extension("txt"));
    assert!(registry.resolve("STDInOut", tmp.path()).await.is_ok());
}

#[tokio::test]
async fn test_available_lists_every_channel_type() {
    let tmp = TempDir::new().unwrap();
    module_file(tmp.path(), "a_broken");
    let pipes = module_file(tmp.path(), "b_pipes");
    let stdio_file = module_file(tmp.path(), "c_stdio");
    let loader = StaticChannelLoader::new()
        .with_module(pipes.clone(), vec![named_pipe, stdio_duplicate])
        .with_module(stdio_file.clone(), vec![stdio]);
    let registry = TransportRegistry::new(Box::new(loader));

    let available = registry.available(tmp.path()).await.unwrap();
    let names: Vec<_> = available.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["NamedPipe", "stdinout", "STDInOut"]);
    assert_eq!(available[2].module, tmp.path().join(stdio_file));
}
