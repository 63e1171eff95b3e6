//! Error types for manifest operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or resolving a chain manifest.
///
/// All of these are fatal for the render: a chain with a broken manifest is
/// never partially instantiated.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Failed to read the manifest file.
    #[error("failed to read manifest '{path}': {source}")]
    ReadFile {
        /// Path of the manifest that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not valid JSON.
    #[error("manifest is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The manifest has no "plugins" array.
    #[error("manifest is missing the 'plugins' array")]
    MissingPluginsArray,

    /// The "plugins" array is present but empty.
    #[error("manifest declares no plugins")]
    EmptyPluginList,

    /// Every entry was dropped (no entry kept a non-empty plugin path).
    #[error("manifest has no valid plugin paths")]
    NoValidPlugins,
}

impl ManifestError {
    /// Create a read error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::ReadFile {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn mock_io_err() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::NotFound, "mock")
    }

    #[test]
    fn read_file_display_includes_path() {
        let err = ManifestError::read_file("/a/chain.json", mock_io_err());
        let msg = err.to_string();
        assert!(msg.contains("failed to read manifest"), "got: {msg}");
        assert!(msg.contains("/a/chain.json"), "got: {msg}");
    }

    #[test]
    fn read_file_exposes_io_source() {
        let err = ManifestError::read_file("/x", mock_io_err());
        assert!(err.source().is_some());
    }

    #[test]
    fn shape_errors_have_no_source() {
        assert!(ManifestError::MissingPluginsArray.source().is_none());
        assert!(ManifestError::EmptyPluginList.source().is_none());
        assert!(ManifestError::NoValidPlugins.source().is_none());
    }
}
