//! Enumeration of candidate plugin modules in a directory

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{PluginError, PluginResult};

/// Finds candidate modules: regular files directly inside the plugin
/// directory whose extension is the platform's dynamic-library extension.
///
/// Candidates are returned sorted by file name so resolution order does not
/// depend on the filesystem.
#[derive(Debug, Clone)]
pub struct ModuleDiscovery {
    extension: String,
}

impl ModuleDiscovery {
    /// Discover modules with the platform extension (`so`, `dylib` or `dll`)
    pub fn new() -> Self {
        Self::with_extension(std::env::consts::DLL_EXTENSION)
    }

    /// Discover modules with a custom extension
    pub fn with_extension(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into().trim_start_matches('.').to_string(),
        }
    }

    /// Extension being matched, without the leading dot
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Whether `path` has the module extension
    pub fn is_candidate(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
    }

    /// List candidate modules in `dir`.
    ///
    /// Fails with [`PluginError::DirectoryNotFound`] if `dir` is not an
    /// existing directory. Unreadable entries are logged and skipped.
    pub fn discover(&self, dir: &Path) -> PluginResult<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(PluginError::DirectoryNotFound {
                path: dir.display().to_string(),
            });
        }

        tracing::debug!(
            target: "plugin_discovery",
            path = ?dir,
            extension = %self.extension,
            "Scanning for communication extensions"
        );

        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        let mut candidates = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(
                        target: "plugin_discovery",
                        error = %e,
                        "Failed to read plugin directory entry"
                    );
                    continue;
                }
            };

            if entry.file_type().is_file() && self.is_candidate(entry.path()) {
                candidates.push(entry.into_path());
            }
        }

        tracing::debug!(
            target: "plugin_discovery",
            path = ?dir,
            count = candidates.len(),
            "Plugin discovery completed"
        );

        Ok(candidates)
    }
}

impl Default for ModuleDiscovery {
    fn default() -> Self {
        Self::new()
    }
}
