//! Core types and capability traits for the cadena plugin-chain host.
//!
//! This crate defines the vocabulary the rest of the workspace is written
//! against:
//!
//! - [`StreamContext`]: the shared, read-only audio format every plugin
//!   instance in a chain is configured from
//! - [`BlockBuffer`] and [`EventBuffer`]: the reusable per-segment working
//!   buffers a chain mutates in place
//! - [`PluginInstance`] and [`PluginFormat`]: the seams behind which the
//!   concrete plugin ABIs live
//! - [`AudioReader`] and [`AudioWriter`]: the seams behind which the audio
//!   file codecs live
//!
//! Nothing here touches the filesystem or loads a plugin binary; concrete
//! implementations live in `cadena-io` and the format backend crates.

mod buffer;
mod context;
mod format;
mod instance;
mod io;

pub use buffer::{BlockBuffer, EventBuffer, MidiEvent};
pub use context::StreamContext;
pub use format::{FormatError, PluginFormat, PluginType};
pub use instance::{EditorSurface, PluginInstance, ProcessMode, StateError};
pub use io::{AudioReader, AudioWriter, StreamError, StreamInfo};
