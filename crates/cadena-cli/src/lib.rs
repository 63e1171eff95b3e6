//! Shared plumbing for the `cadena-render` and `cadena-live` binaries:
//! tracing setup, the default format registry, and the error-to-exit-code
//! mapping both binaries share.

use std::path::PathBuf;

use thiserror::Error;

use cadena_host::{FormatRegistry, HostError};
use cadena_manifest::ManifestError;

/// Smallest accepted processing block, in frames.
pub const MIN_BLOCK_SIZE: usize = 64;

/// Clamp a requested block size to the supported minimum.
pub fn effective_block_size(requested: usize) -> usize {
    requested.max(MIN_BLOCK_SIZE)
}

/// Install the tracing subscriber.
///
/// Diagnostics go to stderr so rendered output and prompts own stdout.
/// `RUST_LOG` overrides the default `warn` filter.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();
}

/// Registry with every compiled-in format backend.
pub fn default_formats() -> FormatRegistry {
    #[allow(unused_mut)]
    let mut registry = FormatRegistry::new();
    #[cfg(feature = "vst2")]
    registry.register(Box::new(cadena_vst2::Vst2Format::new()));
    registry
}

/// Errors either binary can exit with, each mapped to a stable exit code.
#[derive(Debug, Error)]
pub enum CliError {
    /// The input audio file does not exist.
    #[error("input file not found: {0}")]
    InputNotFound(PathBuf),

    /// The chain manifest file does not exist.
    #[error("chain manifest not found: {0}")]
    ManifestNotFound(PathBuf),

    /// The input audio file exists but could not be opened as audio.
    #[error("cannot read '{path}' as audio: {reason}")]
    InputUnreadable {
        /// The offending input file.
        path: PathBuf,
        /// Decoder diagnostic.
        reason: String,
    },

    /// The manifest could not be loaded or resolved.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// The interactive shell's plugin file does not exist.
    #[error("plugin file not found: {0}")]
    PluginNotFound(PathBuf),

    /// The interactive shell's plugin failed to load.
    #[error("failed to load '{path}': {reason}")]
    PluginLoad {
        /// The plugin file.
        path: PathBuf,
        /// Loader diagnostic.
        reason: String,
    },

    /// Chain build or render failure.
    #[error(transparent)]
    Chain(#[from] HostError),

    /// The output stream could not be created.
    #[error("cannot create output '{path}': {reason}")]
    Output {
        /// The output file.
        path: PathBuf,
        /// Writer diagnostic.
        reason: String,
    },
}

impl CliError {
    /// Process exit code for this failure.
    ///
    /// 2 missing inputs, 3 unreadable input, 4 bad manifest or plugin load,
    /// 5 chain build failure, 6 stream failure. Code 1 is reserved for
    /// argument parsing, which never reaches this type.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InputNotFound(_) | CliError::ManifestNotFound(_) => 2,
            CliError::InputUnreadable { .. } | CliError::PluginNotFound(_) => 3,
            CliError::Manifest(_) | CliError::PluginLoad { .. } => 4,
            CliError::Chain(HostError::Stream(_)) | CliError::Output { .. } => 6,
            CliError::Chain(_) => 5,
        }
    }
}
