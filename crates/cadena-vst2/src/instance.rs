//! Live VST2 instance and its editor surface.

use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::{debug, trace};
use vst::api;
use vst::host::PluginLoader;
use vst::plugin::{Plugin, PluginParameters};

use cadena_core::{
    BlockBuffer, EditorSurface, EventBuffer, FormatError, PluginInstance, ProcessMode, StateError,
};

use crate::{SilentHost, resolve_bundle_path};

/// State blob header bytes.
///
/// `CHK\0` wraps the plugin's own chunk format, `PRM\0` a host-serialized
/// parameter dump for plugins without chunk support.
const HEADER_CHUNK: [u8; 4] = *b"CHK\0";
const HEADER_PARAMS: [u8; 4] = *b"PRM\0";

/// A loaded VST2 effect.
///
/// Holds the dlopened binary alive for its own lifetime. `prepare` resumes
/// the plugin; `release` (and `Drop`, as a guard) suspends it again before
/// the library unloads.
pub struct Vst2Instance {
    plugin: vst::host::PluginInstance,
    params: Arc<dyn PluginParameters>,
    editor: Option<Vst2Editor>,
    name: String,
    inputs: usize,
    outputs: usize,
    preset_chunks: bool,
    parameter_count: i32,
    resumed: bool,
    released: bool,
    // Keeps the host callback alive as long as the plugin may call back.
    #[allow(dead_code)]
    host: Arc<Mutex<SilentHost>>,
}

impl std::fmt::Debug for Vst2Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vst2Instance")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("preset_chunks", &self.preset_chunks)
            .field("parameter_count", &self.parameter_count)
            .field("resumed", &self.resumed)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

impl Vst2Instance {
    /// Load a plugin binary and bring it to the initialized (not yet
    /// resumed) state.
    pub fn load(path: &Path, sample_rate: f64, block_size: usize) -> Result<Self, FormatError> {
        let resolved = resolve_bundle_path(path);
        let host = Arc::new(Mutex::new(SilentHost));

        let mut loader = PluginLoader::load(&resolved, Arc::clone(&host))
            .map_err(|e| FormatError(format!("failed to load '{}': {e:?}", path.display())))?;
        let mut plugin = loader
            .instance()
            .map_err(|e| FormatError(format!("VST2 entry point failed: {e:?}")))?;

        plugin.init();
        plugin.set_sample_rate(sample_rate as f32);
        plugin.set_block_size(block_size as i64);

        let info = plugin.get_info();
        // get_editor is one-shot in the vst crate; take it now and keep it.
        let editor = plugin.get_editor().map(|editor| Vst2Editor {
            editor,
            open: false,
        });
        let params = plugin.get_parameter_object();

        debug!(
            name = %info.name,
            inputs = info.inputs,
            outputs = info.outputs,
            parameters = info.parameters,
            "VST2 plugin loaded"
        );

        Ok(Self {
            plugin,
            params,
            editor,
            name: info.name,
            inputs: info.inputs.max(0) as usize,
            outputs: info.outputs.max(0) as usize,
            preset_chunks: info.preset_chunks,
            parameter_count: info.parameters,
            resumed: false,
            released: false,
            host,
        })
    }

    fn dispatch_events(&mut self, events: &EventBuffer) {
        if events.is_empty() {
            return;
        }

        let mut api_events: Vec<api::MidiEvent> = events
            .iter()
            .map(|event| api::MidiEvent {
                event_type: api::EventType::Midi,
                byte_size: std::mem::size_of::<api::MidiEvent>() as i32,
                delta_frames: event.frame_offset as i32,
                flags: api::MidiEventFlags::REALTIME_EVENT.bits(),
                note_length: 0,
                note_offset: 0,
                midi_data: event.data,
                _midi_reserved: 0,
                detune: 0,
                note_off_velocity: 0,
                _reserved1: 0,
                _reserved2: 0,
            })
            .collect();

        let event_ptrs: Vec<*mut api::Event> = api_events
            .iter_mut()
            .map(|e| std::ptr::from_mut(e).cast::<api::Event>())
            .collect();

        // api::Events ends in a [*mut Event; 2] flexible array member, so a
        // list longer than two needs a manually sized allocation laid out the
        // same way. Vec<u64> gives the required 8-byte alignment.
        let events_offset = std::mem::offset_of!(api::Events, events);
        let needed = events_offset + event_ptrs.len() * std::mem::size_of::<*mut api::Event>();
        let alloc = needed.max(std::mem::size_of::<api::Events>());
        let mut raw = vec![0u64; alloc.div_ceil(8)];

        // Safety: `raw` is large and aligned enough for the header plus every
        // pointer slot, and neither `raw` nor `api_events` moves before
        // process_events returns. The ABI requires plugins to copy event data
        // they keep.
        unsafe {
            let base = raw.as_mut_ptr().cast::<u8>();
            let header = &mut *base.cast::<api::Events>();
            header.num_events = event_ptrs.len() as i32;
            header._reserved = 0;
            let slots = base.add(events_offset).cast::<*mut api::Event>();
            for (i, ptr) in event_ptrs.iter().enumerate() {
                *slots.add(i) = *ptr;
            }
            self.plugin.process_events(header);
        }
    }
}

impl PluginInstance for Vst2Instance {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_mode(&mut self, mode: ProcessMode) {
        // The 2.x ABI has no portable non-realtime switch exposed through
        // this binding; plugins behave identically either way here.
        trace!(plugin = %self.name, ?mode, "process mode noted");
    }

    fn input_channels(&self) -> usize {
        self.inputs
    }

    fn output_channels(&self) -> usize {
        self.outputs
    }

    fn request_layout(&mut self, inputs: usize, outputs: usize) -> bool {
        // VST2 layouts are fixed at load time; the request succeeds exactly
        // when the plugin already has the asked-for shape.
        self.inputs == inputs && self.outputs == outputs
    }

    fn prepare(&mut self, sample_rate: f64, block_size: usize) {
        self.plugin.set_sample_rate(sample_rate as f32);
        self.plugin.set_block_size(block_size as i64);
        if !self.resumed {
            self.plugin.resume();
            self.resumed = true;
        }
    }

    fn reset(&mut self) {
        // A suspend/resume cycle is the ABI's way of flushing tails.
        if self.resumed {
            self.plugin.suspend();
            self.plugin.resume();
        }
    }

    fn process(&mut self, buffer: &mut BlockBuffer, frames: usize, events: &mut EventBuffer) {
        if frames == 0 {
            return;
        }

        self.dispatch_events(events);

        let channels = buffer.num_channels();
        let mut input_vecs: Vec<Vec<f32>> = (0..channels)
            .map(|ch| buffer.channel(ch)[..frames].to_vec())
            .collect();
        while input_vecs.len() < self.inputs {
            input_vecs.push(vec![0.0; frames]);
        }
        let out_count = self.outputs.max(channels);
        let mut output_vecs: Vec<Vec<f32>> = vec![vec![0.0; frames]; out_count];

        let input_ptrs: Vec<*const f32> = input_vecs.iter().map(|v| v.as_ptr()).collect();
        let mut output_ptrs: Vec<*mut f32> =
            output_vecs.iter_mut().map(|v| v.as_mut_ptr()).collect();

        // Safety: every pointer addresses a Vec of exactly `frames` samples,
        // and the Vecs outlive the process call. Inputs and outputs never
        // alias, since the outputs were allocated fresh above.
        let mut vst_buffer = unsafe {
            vst::buffer::AudioBuffer::from_raw(
                input_ptrs.len(),
                output_ptrs.len(),
                input_ptrs.as_ptr(),
                output_ptrs.as_mut_ptr(),
                frames,
            )
        };
        self.plugin.process(&mut vst_buffer);

        for ch in 0..channels.min(output_vecs.len()) {
            buffer.channel_mut(ch)[..frames].copy_from_slice(&output_vecs[ch]);
        }
    }

    fn state(&mut self) -> Vec<u8> {
        if self.preset_chunks {
            let chunk = self.params.get_preset_data();
            if !chunk.is_empty() {
                let mut blob = Vec::with_capacity(4 + chunk.len());
                blob.extend_from_slice(&HEADER_CHUNK);
                blob.extend_from_slice(&chunk);
                return blob;
            }
        }

        let count = self.parameter_count.max(0);
        let mut blob = Vec::with_capacity(8 + count as usize * 4);
        blob.extend_from_slice(&HEADER_PARAMS);
        blob.extend_from_slice(&count.to_le_bytes());
        for i in 0..count {
            blob.extend_from_slice(&self.params.get_parameter(i).to_le_bytes());
        }
        blob
    }

    fn restore_state(&mut self, data: &[u8]) -> Result<(), StateError> {
        if data.len() < 4 {
            return Err(StateError("state blob too short".into()));
        }

        let header: [u8; 4] = [data[0], data[1], data[2], data[3]];
        let payload = &data[4..];

        if header == HEADER_CHUNK {
            if payload.is_empty() {
                return Err(StateError("empty chunk payload".into()));
            }
            self.params.load_preset_data(payload);
            return Ok(());
        }

        if header == HEADER_PARAMS {
            if payload.len() < 4 {
                return Err(StateError("parameter state missing its count".into()));
            }
            let count = i32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
            if count < 0 || payload.len() != 4 + count as usize * 4 {
                return Err(StateError(format!(
                    "parameter state size mismatch for {count} parameters"
                )));
            }
            if count > self.parameter_count {
                return Err(StateError(format!(
                    "state has {count} parameters, plugin has {}",
                    self.parameter_count
                )));
            }
            for i in 0..count {
                let offset = 4 + i as usize * 4;
                let value = f32::from_le_bytes([
                    payload[offset],
                    payload[offset + 1],
                    payload[offset + 2],
                    payload[offset + 3],
                ]);
                self.params.set_parameter(i, value.clamp(0.0, 1.0));
            }
            return Ok(());
        }

        // Unrecognized header: presets written by other hosts carry the
        // plugin's raw chunk with no wrapper, so try it as one.
        if self.preset_chunks {
            debug!(plugin = %self.name, bytes = data.len(), "restoring headerless blob as raw chunk");
            self.params.load_preset_data(data);
            return Ok(());
        }
        Err(StateError("unrecognized state blob".into()))
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Some(editor) = self.editor.as_mut() {
            editor.close();
        }
        if self.resumed {
            self.plugin.suspend();
            self.resumed = false;
        }
    }

    fn editor(&mut self) -> Option<&mut dyn EditorSurface> {
        self.editor
            .as_mut()
            .map(|editor| editor as &mut dyn EditorSurface)
    }
}

impl Drop for Vst2Instance {
    fn drop(&mut self) {
        // Guard for abort paths that never called release.
        self.release();
    }
}

/// The plugin's native editor window.
struct Vst2Editor {
    editor: Box<dyn vst::editor::Editor>,
    open: bool,
}

impl EditorSurface for Vst2Editor {
    fn open(&mut self) -> bool {
        if self.open {
            return true;
        }
        // Floating attempt; editors that insist on a parent window refuse a
        // null handle and that refusal is surfaced to the caller.
        self.open = self.editor.open(std::ptr::null_mut());
        self.open
    }

    fn idle(&mut self) {
        if self.open {
            self.editor.idle();
        }
    }

    fn close(&mut self) {
        if self.open {
            self.editor.close();
            self.open = false;
        }
    }

    fn size(&self) -> Option<(u32, u32)> {
        let (width, height) = self.editor.size();
        if width <= 0 || height <= 0 {
            None
        } else {
            Some((width as u32, height as u32))
        }
    }
}
