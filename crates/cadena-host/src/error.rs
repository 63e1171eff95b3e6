//! Error types for chain materialization and rendering.

use std::path::PathBuf;

use thiserror::Error;

use cadena_core::StreamError;

/// Errors that can occur while building or rendering a chain.
#[derive(Debug, Error)]
pub enum HostError {
    /// No registered backend produced a plugin type for the file.
    #[error("no plugin types found for '{path}'")]
    NoTypesFound {
        /// The plugin file that yielded nothing.
        path: PathBuf,
    },

    /// A backend failed to create a live instance.
    #[error("failed to instantiate '{path}': {reason}")]
    Instantiation {
        /// The plugin file the instance would have come from.
        path: PathBuf,
        /// Backend diagnostic.
        reason: String,
    },

    /// The input or output stream failed mid-render.
    #[error("audio stream error: {0}")]
    Stream(#[from] StreamError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn no_types_display_includes_path() {
        let err = HostError::NoTypesFound {
            path: PathBuf::from("/fx/gain.so"),
        };
        let msg = err.to_string();
        assert!(msg.contains("no plugin types found"), "got: {msg}");
        assert!(msg.contains("/fx/gain.so"), "got: {msg}");
    }

    #[test]
    fn stream_error_exposes_source() {
        let err = HostError::from(StreamError("short read".into()));
        assert!(err.source().is_some());
    }
}
