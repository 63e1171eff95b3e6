//! VST2 format backend.
//!
//! Loads VST 2.x plugin binaries through `dlopen` (via the `vst` crate) and
//! adapts them to the host's [`PluginFormat`] / `PluginInstance` seams.
//! Enumeration actually loads the binary: a file with a plugin extension
//! that fails to load simply yields no types.

mod instance;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, trace};
use vst::host::{Host, PluginLoader};
use vst::plugin::Plugin;

use cadena_core::{FormatError, PluginFormat, PluginInstance, PluginType};

pub use instance::Vst2Instance;

/// Minimal host callback for offline rendering.
///
/// Parameter automation from the plugin is traced and dropped; there is no
/// transport, so time info queries return nothing.
pub(crate) struct SilentHost;

impl Host for SilentHost {
    fn automate(&self, index: i32, value: f32) {
        trace!(index, value, "plugin automated a parameter");
    }

    fn get_plugin_id(&self) -> i32 {
        // "cdna"
        0x6364_6e61
    }

    fn idle(&self) {}
}

/// Extensions that can hold a VST2 binary, per platform convention.
const PLUGIN_EXTENSIONS: &[&str] = &["so", "dll", "dylib", "vst"];

/// Resolve a macOS `.vst` bundle path to the inner mach-o binary.
///
/// Bundles are directories with the dylib at `Contents/MacOS/<stem>`; the
/// loader dlopens paths directly and does not resolve bundles itself.
pub(crate) fn resolve_bundle_path(path: &Path) -> PathBuf {
    if path.is_dir() && path.extension().and_then(|e| e.to_str()) == Some("vst") {
        let stem = path.file_stem().unwrap_or_default();
        let inner = path.join("Contents").join("MacOS").join(stem);
        if inner.exists() {
            return inner;
        }
    }
    path.to_path_buf()
}

fn file_stem_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("plugin")
        .to_string()
}

/// The VST2 backend.
#[derive(Default)]
pub struct Vst2Format;

impl Vst2Format {
    /// Create the backend.
    pub fn new() -> Self {
        Self
    }
}

impl PluginFormat for Vst2Format {
    fn id(&self) -> &'static str {
        "vst2"
    }

    fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                PLUGIN_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
    }

    fn enumerate_types(&self, path: &Path) -> Vec<PluginType> {
        let resolved = resolve_bundle_path(path);
        let host = Arc::new(Mutex::new(SilentHost));

        let mut loader = match PluginLoader::load(&resolved, Arc::clone(&host)) {
            Ok(loader) => loader,
            Err(e) => {
                debug!(path = %path.display(), "not a loadable VST2 binary: {e:?}");
                return Vec::new();
            }
        };
        let mut plugin = match loader.instance() {
            Ok(plugin) => plugin,
            Err(e) => {
                debug!(path = %path.display(), "VST2 entry point failed: {e:?}");
                return Vec::new();
            }
        };

        plugin.init();
        let info = plugin.get_info();
        let name = if info.name.is_empty() {
            file_stem_name(path)
        } else {
            info.name
        };

        // The 2.x ABI exposes one effect per binary (shell plugins excepted,
        // which this host does not unwrap).
        vec![PluginType {
            format: "vst2",
            path: path.to_path_buf(),
            index: 0,
            name,
        }]
    }

    fn create(
        &self,
        ty: &PluginType,
        sample_rate: f64,
        block_size: usize,
    ) -> Result<Box<dyn PluginInstance>, FormatError> {
        let instance = Vst2Instance::load(&ty.path, sample_rate, block_size)?;
        Ok(Box::new(instance))
    }
}
