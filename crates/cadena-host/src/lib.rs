//! Chain materialization and offline rendering engine.
//!
//! This crate turns a resolved slot list into live plugin instances and
//! streams audio through them:
//!
//! - [`FormatRegistry`]: the set of plugin-format backends in use
//! - [`resolve_types`] / [`instantiate`]: per-file type discovery and
//!   lifecycle bring-up (mode, bus layout, prepare, reset)
//! - [`apply_state`] / [`save_state`]: preset restore and capture, with
//!   soft failure semantics on restore
//! - [`build_chain`]: slot list to prepared instance list, releasing a
//!   partial chain on failure
//! - [`ChainRenderer`]: the sequential block render loop
//!
//! The engine is single threaded by design; instances are owned by one
//! renderer and never shared.

mod chain;
mod error;
mod loader;
#[cfg(test)]
pub(crate) mod mock;
mod registry;
mod state;

pub use chain::{ChainRenderer, build_chain};
pub use error::HostError;
pub use loader::{instantiate, resolve_types};
pub use registry::FormatRegistry;
pub use state::{apply_state, save_state};
