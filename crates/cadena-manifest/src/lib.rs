//! Chain manifest resolution.
//!
//! A chain manifest declares which plugins to load, in what order, with what
//! presets:
//!
//! ```json
//! { "plugins": [ { "path": "gain.vst2.so", "preset": "warm.fxp", "bypass": false } ] }
//! ```
//!
//! [`resolve_manifest`] is a pure transformation from an already-parsed JSON
//! tree to an ordered [`ChainSlot`] list — no file reads, no existence
//! checks. Relative paths resolve against the manifest's own directory so
//! manifests stay portable; [`load_manifest`] is the file-reading
//! convenience wrapper the CLI uses.

mod error;
mod resolve;

pub use error::ManifestError;
pub use resolve::{ChainSlot, load_manifest, resolve_manifest};
