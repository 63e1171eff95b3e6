//! Manifest tree to chain-slot resolution.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::ManifestError;

/// One declared position in the chain.
///
/// Identity is positional: slots keep the order the manifest declared them
/// in, minus entries whose plugin path came out empty. Immutable once
/// resolved; discarded after the chain is materialized into instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSlot {
    /// Resolved path of the plugin file.
    pub plugin_path: PathBuf,
    /// Resolved path of the preset to restore, if any.
    pub preset_path: Option<PathBuf>,
    /// Whether the slot is excluded from instantiation and rendering.
    pub bypass: bool,
}

/// Strip one layer of fully-wrapping quotes, trimming around each step.
///
/// Double quotes are handled before single quotes, so `'"x"'` unquotes in
/// two layers but `"a'b"` keeps its inner apostrophe.
fn clean_path(raw: &str) -> String {
    let mut cleaned = raw.trim();
    if cleaned.len() >= 2 && cleaned.starts_with('"') && cleaned.ends_with('"') {
        cleaned = cleaned[1..cleaned.len() - 1].trim();
    }
    if cleaned.len() >= 2 && cleaned.starts_with('\'') && cleaned.ends_with('\'') {
        cleaned = cleaned[1..cleaned.len() - 1].trim();
    }
    cleaned.to_string()
}

/// Clean a raw path value and resolve it against the manifest's directory.
/// Returns `None` when the path is empty after cleaning.
fn resolve_path(base_dir: &Path, raw: &str) -> Option<PathBuf> {
    let cleaned = clean_path(raw);
    if cleaned.is_empty() {
        return None;
    }
    let path = Path::new(&cleaned);
    if path.is_absolute() {
        Some(path.to_path_buf())
    } else {
        Some(base_dir.join(path))
    }
}

/// Resolve a parsed manifest tree into an ordered slot list.
///
/// The tree must be an object with a `"plugins"` array. Array elements that
/// are not objects are skipped; object entries contribute a slot when their
/// `path` value is non-empty after quote stripping. Relative plugin and
/// preset paths resolve against `base_dir` (the manifest's own directory,
/// not the process working directory).
///
/// # Errors
///
/// [`ManifestError::MissingPluginsArray`] when `"plugins"` is absent or not
/// an array, [`ManifestError::EmptyPluginList`] when it is empty, and
/// [`ManifestError::NoValidPlugins`] when no entry survives resolution.
pub fn resolve_manifest(tree: &Value, base_dir: &Path) -> Result<Vec<ChainSlot>, ManifestError> {
    let plugins = tree
        .get("plugins")
        .and_then(Value::as_array)
        .ok_or(ManifestError::MissingPluginsArray)?;

    if plugins.is_empty() {
        return Err(ManifestError::EmptyPluginList);
    }

    let mut slots = Vec::new();
    for entry in plugins {
        let Some(obj) = entry.as_object() else {
            debug!("skipping non-object manifest entry");
            continue;
        };

        let raw_plugin = obj.get("path").and_then(Value::as_str).unwrap_or("");
        let Some(plugin_path) = resolve_path(base_dir, raw_plugin) else {
            continue;
        };

        let preset_path = obj
            .get("preset")
            .and_then(Value::as_str)
            .and_then(|raw| resolve_path(base_dir, raw));
        let bypass = obj.get("bypass").and_then(Value::as_bool).unwrap_or(false);

        slots.push(ChainSlot {
            plugin_path,
            preset_path,
            bypass,
        });
    }

    if slots.is_empty() {
        return Err(ManifestError::NoValidPlugins);
    }

    debug!(slots = slots.len(), "resolved chain manifest");
    Ok(slots)
}

/// Read and resolve a manifest file.
///
/// Relative paths inside the manifest resolve against the file's parent
/// directory.
pub fn load_manifest(path: &Path) -> Result<Vec<ChainSlot>, ManifestError> {
    let text =
        std::fs::read_to_string(path).map_err(|e| ManifestError::read_file(path, e))?;
    let tree: Value = serde_json::from_str(&text)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    resolve_manifest(&tree, base_dir)
}
