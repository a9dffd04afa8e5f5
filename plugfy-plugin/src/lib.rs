//! Transport plugin system for the plugfy library host
//!
//! Resolves a logical transport name to a fresh
//! [`CommunicationChannel`](plugfy_channel::CommunicationChannel) by scanning
//! a directory of plugin modules. Modules are enumerated by
//! [`ModuleDiscovery`], opened by a [`ChannelLoader`] and searched by the
//! [`TransportRegistry`], first match wins.

pub mod discovery;
pub mod error;
pub mod loader;
pub mod registry;

// Re-export main types
pub use discovery::ModuleDiscovery;
pub use error::{PluginError, PluginResult};
pub use loader::{ChannelLoader, DynamicChannelLoader, LoadedModule, StaticChannelLoader};
pub use registry::{AvailableTransport, TransportRegistry};
