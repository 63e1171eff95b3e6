//! Format backend registration.

use cadena_core::PluginFormat;

/// The set of plugin-format backends the host knows about.
///
/// Backends are consulted in registration order; every backend whose
/// `matches` accepts a file gets to enumerate it, and the types accumulate.
#[derive(Default)]
pub struct FormatRegistry {
    formats: Vec<Box<dyn PluginFormat>>,
}

impl FormatRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend. Later registrations are consulted after earlier
    /// ones.
    pub fn register(&mut self, format: Box<dyn PluginFormat>) {
        self.formats.push(format);
    }

    /// Registered backends in registration order.
    pub fn formats(&self) -> &[Box<dyn PluginFormat>] {
        &self.formats
    }

    /// Look up a backend by its id.
    pub fn format(&self, id: &str) -> Option<&dyn PluginFormat> {
        self.formats
            .iter()
            .find(|f| f.id() == id)
            .map(|f| f.as_ref())
    }

    /// True when no backend is registered.
    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    /// Number of registered backends.
    pub fn len(&self) -> usize {
        self.formats.len()
    }
}
