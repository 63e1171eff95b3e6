//! Reusable working buffers shared by every instance in a chain.

/// Planar multi-channel f32 audio buffer.
///
/// One allocation per render: the chain processor clears and refills the
/// same buffer for every segment, and each plugin instance mutates it in
/// place before the next one sees it. Channel data is planar (one slice per
/// channel) because that is what plugin ABIs consume.
#[derive(Debug, Clone)]
pub struct BlockBuffer {
    channels: Vec<Vec<f32>>,
    frames: usize,
}

impl BlockBuffer {
    /// Allocate a buffer of `channels x frames` samples, zeroed.
    pub fn new(channels: usize, frames: usize) -> Self {
        Self {
            channels: vec![vec![0.0; frames]; channels],
            frames,
        }
    }

    /// Number of channels.
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Frames per channel (the buffer capacity, not the current segment length).
    pub fn num_frames(&self) -> usize {
        self.frames
    }

    /// Zero every sample.
    pub fn clear(&mut self) {
        for channel in &mut self.channels {
            channel.fill(0.0);
        }
    }

    /// Immutable view of one channel.
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    /// Mutable view of one channel.
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.channels[index]
    }

    /// Mutable access to all channels at once, for backends that need
    /// simultaneous per-channel pointers.
    pub fn channels_mut(&mut self) -> &mut [Vec<f32>] {
        &mut self.channels
    }

    /// Iterate immutable channel slices.
    pub fn iter_channels(&self) -> impl Iterator<Item = &[f32]> {
        self.channels.iter().map(|c| c.as_slice())
    }
}

/// A single MIDI-style event with a frame offset into the current segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiEvent {
    /// Offset into the current segment, in frames.
    pub frame_offset: u32,
    /// Raw status + data bytes.
    pub data: [u8; 3],
}

/// Ordered event list carried through the chain alongside the audio.
///
/// The offline render path never populates it, but the channel is part of the
/// processing contract so event-driven plugins slot in without an interface
/// change. Cleared once per segment, like the audio buffer.
#[derive(Debug, Clone, Default)]
pub struct EventBuffer {
    events: Vec<MidiEvent>,
}

impl EventBuffer {
    /// Create an empty event buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove all events.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Append an event.
    pub fn push(&mut self, event: MidiEvent) {
        self.events.push(event);
    }

    /// True when no events are queued.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Iterate events in order.
    pub fn iter(&self) -> impl Iterator<Item = &MidiEvent> {
        self.events.iter()
    }
}
