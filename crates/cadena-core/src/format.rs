//! The plugin-format backend seam.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::instance::PluginInstance;

/// Opaque descriptor for one loadable processing unit inside a plugin file.
///
/// A file may contain more than one type; descriptors are recomputed on every
/// load and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginType {
    /// Id of the format backend that produced this descriptor.
    pub format: &'static str,
    /// The plugin file the type lives in.
    pub path: PathBuf,
    /// Index of the type within the file, in enumeration order.
    pub index: usize,
    /// Display name reported by the backend.
    pub name: String,
}

/// Instantiation failure, carrying the backend's diagnostic string.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct FormatError(pub String);

/// One supported binary plugin format.
///
/// The host may register several mutually exclusive backends; the type
/// resolver iterates all of them rather than branching on file extension
/// itself. `matches` is the cheap gate in front of the potentially expensive
/// `enumerate_types`.
pub trait PluginFormat {
    /// Stable identifier, e.g. `"vst2"`.
    fn id(&self) -> &'static str;

    /// Cheap check whether `path` could plausibly contain this format.
    fn matches(&self, path: &Path) -> bool;

    /// Enumerate every plugin type contained in `path`. Files that cannot be
    /// opened or contain nothing yield an empty list, not an error.
    fn enumerate_types(&self, path: &Path) -> Vec<PluginType>;

    /// Create a live instance of `ty`, ready for lifecycle configuration.
    fn create(
        &self,
        ty: &PluginType,
        sample_rate: f64,
        block_size: usize,
    ) -> Result<Box<dyn PluginInstance>, FormatError>;
}
