//! Audio stream reader/writer seams.
//!
//! Codec implementations live behind these traits (`cadena-io` provides the
//! hound-backed WAV ones); the chain processor only ever sees block reads
//! and block writes against the shared [`BlockBuffer`].

use thiserror::Error;

use crate::buffer::BlockBuffer;

/// Header-level description of an audio stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of channels.
    pub channels: usize,
    /// Total frames in the stream.
    pub total_frames: u64,
}

/// Failure reading from or writing to an audio stream.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StreamError(pub String);

/// Block-oriented audio source.
pub trait AudioReader {
    /// The stream's format and length.
    fn info(&self) -> StreamInfo;

    /// Read `frames` frames starting at absolute frame `offset` into the
    /// leading samples of `buffer` (planar). Frames past the end of the
    /// stream are left as-is; callers clear the buffer beforehand.
    fn read_block(
        &mut self,
        offset: u64,
        frames: usize,
        buffer: &mut BlockBuffer,
    ) -> Result<(), StreamError>;
}

/// Block-oriented audio sink.
pub trait AudioWriter {
    /// Append the leading `frames` frames of `buffer` to the stream.
    fn write_block(&mut self, buffer: &BlockBuffer, frames: usize) -> Result<(), StreamError>;

    /// Flush and close the stream. Must be called exactly once.
    fn finalize(&mut self) -> Result<(), StreamError>;
}
