//! Domain-specific configuration modules

pub mod library;
pub mod logging;

use serde::Serialize;

use crate::error::ConfigResult;
use crate::source::ConfigSource;
use crate::validation::Validatable;

/// Host configuration combining all domains
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlugfyConfig {
    /// Transport and runner settings for the library extension
    pub library: library::LibraryConfig,

    /// Logging configuration
    pub logging: logging::LoggingConfig,
}

impl PlugfyConfig {
    /// Resolve every domain from a settings source
    pub fn from_source(source: &dyn ConfigSource) -> ConfigResult<Self> {
        let config = Self {
            library: library::LibraryConfig::from_source(source)?,
            logging: logging::LoggingConfig::from_source(source)?,
        };
        config.validate_all()?;
        Ok(config)
    }

    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.library.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
