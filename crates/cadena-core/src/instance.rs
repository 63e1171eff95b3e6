//! The live plugin instance seam.

use thiserror::Error;

use crate::buffer::{BlockBuffer, EventBuffer};

/// How an instance should schedule its internal processing.
///
/// Offline rendering lets plugins trade latency behavior and threading for
/// determinism; the interactive host runs them as if live. This affects a
/// plugin's internals, not the correctness of its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessMode {
    /// Non-realtime file rendering.
    Offline,
    /// Interactive / live operation.
    Realtime,
}

/// Failure restoring a state blob into an instance.
///
/// Carries the backend's diagnostic; the host treats restore failures as
/// warnings, never as chain-fatal errors.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StateError(pub String);

/// Opaque native editor surface, owned by the interactive shell.
///
/// The chain engine never touches this; it exists so a format backend can
/// hand its editor to whatever windowing the shell provides without the
/// engine knowing about either.
pub trait EditorSurface {
    /// Try to open the editor as a floating (parentless) window.
    /// Returns false when the plugin refuses.
    fn open(&mut self) -> bool;
    /// Give the editor idle time. Call from the shell's loop.
    fn idle(&mut self);
    /// Close the editor if open.
    fn close(&mut self);
    /// Current editor size in pixels, if known.
    fn size(&self) -> Option<(u32, u32)>;
}

/// A live, stateful processing unit created by a [`crate::PluginFormat`].
///
/// Owned exclusively by the chain processor for its lifetime. The expected
/// lifecycle is: `set_mode` → `request_layout` → `prepare` → `reset` →
/// `process` per segment → `release`.
pub trait PluginInstance {
    /// Display name reported by the plugin.
    fn name(&self) -> &str;

    /// Select offline or realtime scheduling. Must be called before
    /// [`PluginInstance::prepare`].
    fn set_mode(&mut self, mode: ProcessMode);

    /// Channel count the plugin's input side currently exposes.
    fn input_channels(&self) -> usize;

    /// Channel count the plugin's output side currently exposes.
    fn output_channels(&self) -> usize;

    /// Ask the plugin to adopt the given channel counts on its main input
    /// and output buses. Returns whether the plugin honored the request.
    ///
    /// Fixed-layout plugins may refuse; the engine logs and proceeds
    /// regardless, so the return value is advisory.
    fn request_layout(&mut self, inputs: usize, outputs: usize) -> bool;

    /// Prepare for processing at the given sample rate and maximum segment
    /// length. Called once before the first segment.
    fn prepare(&mut self, sample_rate: f64, block_size: usize);

    /// Clear internal processing state (delay lines, envelopes) without
    /// touching parameters.
    fn reset(&mut self);

    /// Process one segment in place. The first `frames` samples of each
    /// channel hold the segment's audio on entry and must hold the processed
    /// audio on return; `frames` is at most the prepared block size and is
    /// only smaller for the final segment of a stream. `events` carries the
    /// segment's event stream.
    fn process(&mut self, buffer: &mut BlockBuffer, frames: usize, events: &mut EventBuffer);

    /// Export the plugin's state as an opaque blob.
    fn state(&mut self) -> Vec<u8>;

    /// Restore a previously exported blob. The host hands bytes through
    /// verbatim; interpreting them is entirely the plugin's responsibility.
    fn restore_state(&mut self, data: &[u8]) -> Result<(), StateError>;

    /// Release the instance's resources. Called exactly once, when the chain
    /// finishes or aborts; backends should also guard in `Drop`.
    fn release(&mut self);

    /// The plugin's editor surface, if it has one.
    fn editor(&mut self) -> Option<&mut dyn EditorSurface> {
        None
    }
}

impl core::fmt::Debug for dyn PluginInstance {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PluginInstance")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}
