//! Shared stream configuration for a render.

/// Audio format shared by every instance in a chain.
///
/// Built once from the input stream and the command line, then read-only:
/// every plugin instance is prepared with the same sample rate, channel
/// count, and block size so bus layouts match across the chain. The engine
/// enforces this at instantiation time rather than relying on plugins to
/// agree among themselves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamContext {
    /// Sample rate in Hz.
    pub sample_rate: f64,
    /// Channel count shared by the input, every instance, and the output.
    pub channels: usize,
    /// Frames per processing segment (all segments except possibly the last).
    pub block_size: usize,
    /// Total number of frames in the input stream.
    pub total_frames: u64,
}

impl StreamContext {
    /// Create a new stream context.
    pub fn new(sample_rate: f64, channels: usize, block_size: usize, total_frames: u64) -> Self {
        Self {
            sample_rate,
            channels,
            block_size,
            total_frames,
        }
    }

    /// Length of the segment starting at `position`.
    ///
    /// Every segment is exactly `block_size` frames except the final one,
    /// which is clipped to the remaining frame count. Returns 0 at or past
    /// the end of the stream.
    pub fn segment_frames(&self, position: u64) -> usize {
        if position >= self.total_frames {
            return 0;
        }
        (self.total_frames - position).min(self.block_size as u64) as usize
    }

    /// Number of segments a full render visits: `ceil(total_frames / block_size)`.
    pub fn segment_count(&self) -> u64 {
        if self.block_size == 0 {
            return 0;
        }
        self.total_frames.div_ceil(self.block_size as u64)
    }
}
