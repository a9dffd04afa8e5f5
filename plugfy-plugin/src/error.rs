//! Plugin system error types

use thiserror::Error;

/// Plugin system result type
pub type PluginResult<T> = Result<T, PluginError>;

/// Plugin system errors
#[derive(Error, Debug)]
pub enum PluginError {
    /// The configured plugin directory does not exist
    #[error("Communication extensions directory '{path}' not found")]
    DirectoryNotFound { path: String },

    /// No loaded plugin exposes a channel with the requested name
    #[error("Unsupported communication type: {name}")]
    UnsupportedCommunicationType { name: String },

    /// A module could not be opened or does not export the entry point
    #[error("Failed to load communication extension from '{path}': {reason}")]
    ModuleLoadFailed { path: String, reason: String },

    /// A channel factory failed or panicked while constructing its instance
    #[error("Failed to instantiate channel from '{path}': {reason}")]
    InstantiationFailed { path: String, reason: String },

    /// Dynamic loading error
    #[error("Dynamic loading error: {0}")]
    DynamicLoadingError(#[from] libloading::Error),
}

impl PluginError {
    /// Create a module load failure
    pub fn module_load_failed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ModuleLoadFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error aborts resolution, as opposed to skipping one module
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PluginError::DirectoryNotFound { .. } | PluginError::UnsupportedCommunicationType { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = PluginError::UnsupportedCommunicationType {
            name: "Grpc".to_string(),
        };
        assert_eq!(err.to_string(), "Unsupported communication type: Grpc");
        assert!(err.is_fatal());

        let err = PluginError::module_load_failed("/plugins/a.so", "bad header");
        assert_eq!(
            err.to_string(),
            "Failed to load communication extension from '/plugins/a.so': bad header"
        );
        assert!(!err.is_fatal());
    }
}
