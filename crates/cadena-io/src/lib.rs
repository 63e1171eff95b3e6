//! Audio file I/O for the cadena plugin-chain host.
//!
//! Hound-backed implementations of the [`cadena_core::AudioReader`] and
//! [`cadena_core::AudioWriter`] capabilities:
//!
//! - [`WavBlockReader`]: seekable block reads from a WAV file, int formats
//!   normalized to f32
//! - [`WavBlockWriter`]: block writes at a chosen bit depth
//! - [`probe`]: header-only stream info without loading sample data
//! - [`create_writer_for_path`]: writer selection by output extension, with
//!   fallback to the default WAV writer for unknown extensions

mod wav;

pub use wav::{WavBlockReader, WavBlockWriter, create_writer_for_path, probe};

/// Error types for audio file operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio file operations.
pub type Result<T> = std::result::Result<T, Error>;
