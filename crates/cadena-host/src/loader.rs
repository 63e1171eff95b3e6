//! Type resolution and instance bring-up.

use std::path::Path;

use tracing::debug;

use cadena_core::{PluginInstance, PluginType, ProcessMode, StreamContext};

use crate::error::HostError;
use crate::registry::FormatRegistry;

/// Enumerate every plugin type the registered backends find in `path`.
///
/// Only backends whose `matches` accepts the file are asked to enumerate.
/// Types accumulate across backends in registration order.
///
/// # Errors
///
/// [`HostError::NoTypesFound`] when no backend yields a type, whether because
/// none matched the file or because every match enumerated nothing.
pub fn resolve_types(registry: &FormatRegistry, path: &Path) -> Result<Vec<PluginType>, HostError> {
    let mut types = Vec::new();
    for format in registry.formats() {
        if !format.matches(path) {
            continue;
        }
        let found = format.enumerate_types(path);
        debug!(format = format.id(), path = %path.display(), types = found.len(), "enumerated plugin file");
        types.extend(found);
    }
    if types.is_empty() {
        return Err(HostError::NoTypesFound {
            path: path.to_path_buf(),
        });
    }
    Ok(types)
}

/// Create a live instance of `ty` and walk it through lifecycle bring-up:
/// mode selection, bus layout request, prepare, reset.
///
/// A refused layout request is logged and otherwise ignored; fixed-layout
/// plugins still render, they just keep their own channel configuration.
pub fn instantiate(
    registry: &FormatRegistry,
    ty: &PluginType,
    ctx: &StreamContext,
    mode: ProcessMode,
) -> Result<Box<dyn PluginInstance>, HostError> {
    let format = registry
        .format(ty.format)
        .ok_or_else(|| HostError::Instantiation {
            path: ty.path.clone(),
            reason: format!("no registered backend with id '{}'", ty.format),
        })?;

    let mut instance =
        format
            .create(ty, ctx.sample_rate, ctx.block_size)
            .map_err(|e| HostError::Instantiation {
                path: ty.path.clone(),
                reason: e.to_string(),
            })?;

    instance.set_mode(mode);
    if !instance.request_layout(ctx.channels, ctx.channels) {
        debug!(
            plugin = instance.name(),
            channels = ctx.channels,
            "plugin kept its own bus layout"
        );
    }
    instance.prepare(ctx.sample_rate, ctx.block_size);
    instance.reset();
    Ok(instance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockFormat, new_log};
    use std::path::PathBuf;
    use std::rc::Rc;

    fn ctx() -> StreamContext {
        StreamContext::new(48000.0, 2, 512, 48000)
    }

    fn registry_with(format: MockFormat) -> FormatRegistry {
        let mut registry = FormatRegistry::new();
        registry.register(Box::new(format));
        registry
    }

    #[test]
    fn resolve_yields_types_for_matching_files() {
        let registry = registry_with(MockFormat::new());
        let types = resolve_types(&registry, Path::new("/fx/gain.mock")).unwrap();
        assert_eq!(types.len(), 1);
        assert_eq!(types[0].name, "gain");
        assert_eq!(types[0].format, "mock");
    }

    #[test]
    fn resolve_unmatched_extension_is_no_types() {
        let registry = registry_with(MockFormat::new());
        let err = resolve_types(&registry, Path::new("/fx/gain.so")).unwrap_err();
        assert!(matches!(err, HostError::NoTypesFound { .. }));
    }

    #[test]
    fn resolve_matched_but_empty_is_no_types() {
        let registry = registry_with(MockFormat::new());
        let err = resolve_types(&registry, Path::new("/fx/empty.mock")).unwrap_err();
        assert!(matches!(err, HostError::NoTypesFound { path } if path == PathBuf::from("/fx/empty.mock")));
    }

    #[test]
    fn instantiate_runs_lifecycle_in_order() {
        let log = new_log();
        let registry = registry_with(MockFormat::new().with_log(Rc::clone(&log)));
        let types = resolve_types(&registry, Path::new("/fx/gain.mock")).unwrap();
        let instance = instantiate(&registry, &types[0], &ctx(), ProcessMode::Offline).unwrap();
        assert_eq!(instance.name(), "gain");
        assert_eq!(
            *log.borrow(),
            vec![
                "gain:set_mode(offline)",
                "gain:request_layout(2,2)",
                "gain:prepare",
                "gain:reset",
            ]
        );
    }

    #[test]
    fn refused_layout_still_instantiates() {
        let registry = registry_with(MockFormat::new().refusing_layout());
        let types = resolve_types(&registry, Path::new("/fx/stubborn.mock")).unwrap();
        assert!(instantiate(&registry, &types[0], &ctx(), ProcessMode::Offline).is_ok());
    }

    #[test]
    fn create_failure_is_instantiation_error() {
        let registry = registry_with(MockFormat::new());
        let types = resolve_types(&registry, Path::new("/fx/broken.mock")).unwrap();
        let err = instantiate(&registry, &types[0], &ctx(), ProcessMode::Offline).unwrap_err();
        assert!(matches!(err, HostError::Instantiation { .. }));
        assert!(err.to_string().contains("create refused"));
    }

    #[test]
    fn unknown_backend_id_is_instantiation_error() {
        let registry = registry_with(MockFormat::new());
        let ty = PluginType {
            format: "vst9",
            path: PathBuf::from("/fx/x.mock"),
            index: 0,
            name: "x".into(),
        };
        let err = instantiate(&registry, &ty, &ctx(), ProcessMode::Offline).unwrap_err();
        assert!(err.to_string().contains("vst9"));
    }
}
