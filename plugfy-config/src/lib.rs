//! Configuration management for the plugfy library host
//!
//! Settings are addressed with `:`-separated keys
//! (`Extensions:Library:Communications:Type`) over a nested YAML or JSON
//! document, with environment variable overrides. Typed domains resolve
//! those keys, apply defaults and validate the result.

pub mod error;
pub mod loader;
pub mod source;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use source::{ConfigSource, Settings};

// Re-export domain configurations
pub use domains::{
    PlugfyConfig,
    library::{keys, LibraryConfig},
    logging::{LogFormat, LogLevel, LoggingConfig},
};
