//! Chain materialization and the block render loop.

use tracing::{debug, info};

use cadena_core::{
    AudioReader, AudioWriter, BlockBuffer, EventBuffer, PluginInstance, ProcessMode, StreamContext,
};
use cadena_manifest::ChainSlot;

use crate::error::HostError;
use crate::loader::{instantiate, resolve_types};
use crate::registry::FormatRegistry;
use crate::state::apply_state;

/// Materialize an ordered slot list into live, prepared instances.
///
/// Slots are visited in declared order; bypassed slots are skipped entirely
/// and never instantiated. When a file exposes more than one plugin type the
/// first is taken. Presets are applied after bring-up; preset failures are
/// soft and leave the instance at its defaults.
///
/// # Errors
///
/// Any slot that fails type resolution or instantiation aborts the build;
/// instances already brought up are released before the error is returned.
pub fn build_chain(
    registry: &FormatRegistry,
    slots: &[ChainSlot],
    ctx: &StreamContext,
    mode: ProcessMode,
) -> Result<Vec<Box<dyn PluginInstance>>, HostError> {
    let mut instances: Vec<Box<dyn PluginInstance>> = Vec::new();

    for slot in slots {
        if slot.bypass {
            debug!(plugin = %slot.plugin_path.display(), "slot bypassed");
            continue;
        }

        let result = resolve_types(registry, &slot.plugin_path).and_then(|types| {
            if types.len() > 1 {
                debug!(
                    path = %slot.plugin_path.display(),
                    types = types.len(),
                    "file exposes multiple plugin types, taking the first"
                );
            }
            instantiate(registry, &types[0], ctx, mode)
        });

        let mut instance = match result {
            Ok(instance) => instance,
            Err(e) => {
                for built in &mut instances {
                    built.release();
                }
                return Err(e);
            }
        };

        apply_state(instance.as_mut(), slot.preset_path.as_deref());
        info!(plugin = instance.name(), position = instances.len(), "chain slot ready");
        instances.push(instance);
    }

    Ok(instances)
}

/// Sequential block renderer over a materialized chain.
///
/// Owns the chain's instances and the shared working buffers. One buffer
/// allocation serves the whole render; each segment flows reader, every
/// instance in chain order, writer.
pub struct ChainRenderer {
    instances: Vec<Box<dyn PluginInstance>>,
    buffer: BlockBuffer,
    events: EventBuffer,
}

impl ChainRenderer {
    /// Take ownership of a materialized chain and allocate working buffers
    /// sized for `ctx`.
    pub fn new(instances: Vec<Box<dyn PluginInstance>>, ctx: &StreamContext) -> Self {
        Self {
            instances,
            buffer: BlockBuffer::new(ctx.channels, ctx.block_size),
            events: EventBuffer::new(),
        }
    }

    /// Number of instances in the chain.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// True when the chain holds no instances. An empty chain still renders,
    /// copying input to output unchanged.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Render the whole stream, one segment at a time.
    ///
    /// Every segment is `ctx.block_size` frames except the final one, which
    /// is clipped to the remaining frame count; plugins see the clipped
    /// length, never padding. `progress` is called after each segment with
    /// (segments done, segments total). The writer is finalized on success.
    ///
    /// # Errors
    ///
    /// [`HostError::Stream`] when the reader or writer fails; the stream is
    /// left partially written in that case.
    pub fn render(
        &mut self,
        reader: &mut dyn AudioReader,
        writer: &mut dyn AudioWriter,
        ctx: &StreamContext,
        mut progress: impl FnMut(u64, u64),
    ) -> Result<(), HostError> {
        let total_segments = ctx.segment_count();
        let mut position = 0u64;
        let mut done = 0u64;

        loop {
            let frames = ctx.segment_frames(position);
            if frames == 0 {
                break;
            }

            self.buffer.clear();
            reader.read_block(position, frames, &mut self.buffer)?;

            self.events.clear();
            for instance in &mut self.instances {
                instance.process(&mut self.buffer, frames, &mut self.events);
            }

            writer.write_block(&self.buffer, frames)?;
            position += frames as u64;
            done += 1;
            progress(done, total_segments);
        }

        writer.finalize()?;
        info!(frames = position, segments = done, "render complete");
        Ok(())
    }

    /// Release every instance and consume the renderer.
    pub fn finish(mut self) {
        for instance in &mut self.instances {
            instance.release();
        }
    }

    /// The chain's instances, for shells that inspect them between renders.
    pub fn instances_mut(&mut self) -> &mut [Box<dyn PluginInstance>] {
        &mut self.instances
    }
}
