//! Preset blob application and capture.

use std::path::Path;

use tracing::{debug, warn};

use cadena_core::PluginInstance;

/// Restore a preset file into an instance, if one was declared.
///
/// Preset failures are soft: a missing or rejected preset leaves the
/// instance at its defaults and the chain renders anyway. Returns whether
/// the instance actually received the blob. `None` counts as success since
/// there was nothing to apply.
pub fn apply_state(instance: &mut dyn PluginInstance, preset: Option<&Path>) -> bool {
    let Some(path) = preset else {
        return true;
    };

    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            warn!(
                plugin = instance.name(),
                preset = %path.display(),
                "could not read preset, using defaults: {e}"
            );
            return false;
        }
    };

    match instance.restore_state(&data) {
        Ok(()) => {
            debug!(
                plugin = instance.name(),
                preset = %path.display(),
                bytes = data.len(),
                "preset restored"
            );
            true
        }
        Err(e) => {
            warn!(
                plugin = instance.name(),
                preset = %path.display(),
                "plugin rejected preset, using defaults: {e}"
            );
            false
        }
    }
}

/// Capture an instance's current state to a file, creating parent
/// directories as needed.
pub fn save_state(instance: &mut dyn PluginInstance, path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let blob = instance.state();
    std::fs::write(path, &blob)?;
    debug!(plugin = instance.name(), path = %path.display(), bytes = blob.len(), "state saved");
    Ok(())
}
