//! WAV block reading and writing.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use hound::{SampleFormat, WavReader, WavWriter};
use tracing::debug;

use cadena_core::{AudioReader, AudioWriter, BlockBuffer, StreamError, StreamInfo};

use crate::Result;

/// Read WAV stream info without loading sample data.
pub fn probe<P: AsRef<Path>>(path: P) -> Result<StreamInfo> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    Ok(StreamInfo {
        sample_rate: spec.sample_rate,
        channels: spec.channels as usize,
        total_frames: u64::from(reader.duration()),
    })
}

/// Seekable block reader over a WAV file.
///
/// Integer sample formats are normalized to f32 in `[-1.0, 1.0)` on read.
pub struct WavBlockReader {
    reader: WavReader<BufReader<File>>,
    info: StreamInfo,
    format: SampleFormat,
    norm: f32,
    position: u64,
}

impl WavBlockReader {
    /// Open a WAV file for block reading.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = WavReader::open(path)?;
        let spec = reader.spec();
        let info = StreamInfo {
            sample_rate: spec.sample_rate,
            channels: spec.channels as usize,
            total_frames: u64::from(reader.duration()),
        };
        let norm = (1i64 << (spec.bits_per_sample - 1)) as f32;
        Ok(Self {
            reader,
            info,
            format: spec.sample_format,
            norm,
            position: 0,
        })
    }
}

impl AudioReader for WavBlockReader {
    fn info(&self) -> StreamInfo {
        self.info
    }

    fn read_block(
        &mut self,
        offset: u64,
        frames: usize,
        buffer: &mut BlockBuffer,
    ) -> std::result::Result<(), StreamError> {
        if offset != self.position {
            self.reader
                .seek(offset as u32)
                .map_err(|e| StreamError(format!("seek failed: {e}")))?;
            self.position = offset;
        }

        let channels = self.info.channels.min(buffer.num_channels());
        let frames = frames.min(buffer.num_frames());

        // Interleaved on disk, planar in the buffer. Short reads at the end
        // of the stream leave the remaining samples untouched; the renderer
        // clears the buffer before each fill.
        match self.format {
            SampleFormat::Float => {
                let mut samples = self.reader.samples::<f32>();
                'frames: for frame in 0..frames {
                    for ch in 0..self.info.channels {
                        let Some(sample) = samples.next() else {
                            break 'frames;
                        };
                        let value = sample.map_err(|e| StreamError(e.to_string()))?;
                        if ch < channels {
                            buffer.channel_mut(ch)[frame] = value;
                        }
                    }
                }
            }
            SampleFormat::Int => {
                let norm = self.norm;
                let mut samples = self.reader.samples::<i32>();
                'frames: for frame in 0..frames {
                    for ch in 0..self.info.channels {
                        let Some(sample) = samples.next() else {
                            break 'frames;
                        };
                        let value = sample.map_err(|e| StreamError(e.to_string()))?;
                        if ch < channels {
                            buffer.channel_mut(ch)[frame] = value as f32 / norm;
                        }
                    }
                }
            }
        }

        self.position = offset + frames as u64;
        Ok(())
    }
}

/// Block writer appending to a WAV file.
pub struct WavBlockWriter {
    writer: Option<WavWriter<BufWriter<File>>>,
    bits: u16,
}

impl WavBlockWriter {
    /// Create a WAV file for block writing.
    ///
    /// Bit depth 32 writes IEEE float samples; 16 and 24 write clamped PCM.
    pub fn create<P: AsRef<Path>>(
        path: P,
        sample_rate: u32,
        channels: usize,
        bits: u16,
    ) -> Result<Self> {
        let spec = hound::WavSpec {
            channels: channels as u16,
            sample_rate,
            bits_per_sample: bits,
            sample_format: if bits == 32 {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        };
        let writer = WavWriter::create(path, spec)?;
        Ok(Self {
            writer: Some(writer),
            bits,
        })
    }
}

impl AudioWriter for WavBlockWriter {
    fn write_block(
        &mut self,
        buffer: &BlockBuffer,
        frames: usize,
    ) -> std::result::Result<(), StreamError> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| StreamError("writer already finalized".into()))?;

        let frames = frames.min(buffer.num_frames());
        if self.bits == 32 {
            for frame in 0..frames {
                for ch in 0..buffer.num_channels() {
                    writer
                        .write_sample(buffer.channel(ch)[frame])
                        .map_err(|e| StreamError(e.to_string()))?;
                }
            }
        } else {
            let max_val = (1i64 << (self.bits - 1)) as f32;
            for frame in 0..frames {
                for ch in 0..buffer.num_channels() {
                    let sample = buffer.channel(ch)[frame];
                    let int_sample = (sample * max_val).clamp(-max_val, max_val - 1.0) as i32;
                    writer
                        .write_sample(int_sample)
                        .map_err(|e| StreamError(e.to_string()))?;
                }
            }
        }
        Ok(())
    }

    fn finalize(&mut self) -> std::result::Result<(), StreamError> {
        if let Some(writer) = self.writer.take() {
            writer.finalize().map_err(|e| StreamError(e.to_string()))?;
        }
        Ok(())
    }
}

/// Create the writer matching an output path's extension.
///
/// Unknown or missing extensions fall back to the default WAV writer rather
/// than failing. Parent directories are created as needed.
pub fn create_writer_for_path<P: AsRef<Path>>(
    path: P,
    sample_rate: u32,
    channels: usize,
    bits: u16,
) -> Result<WavBlockWriter> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("wav" | "wave") => {}
        other => {
            debug!(?other, "no writer for extension, falling back to wav");
        }
    }
    WavBlockWriter::create(path, sample_rate, channels, bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(frames: usize) -> Vec<f32> {
        (0..frames).map(|i| (i as f32 / 100.0).sin() * 0.8).collect()
    }

    fn write_mono(path: &Path, samples: &[f32], bits: u16) {
        let mut writer = WavBlockWriter::create(path, 44100, 1, bits).unwrap();
        let mut buffer = BlockBuffer::new(1, samples.len());
        buffer.channel_mut(0).copy_from_slice(samples);
        writer.write_block(&buffer, samples.len()).unwrap();
        writer.finalize().unwrap();
    }

    #[test]
    fn roundtrip_f32() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f32.wav");
        let samples = sine(1000);
        write_mono(&path, &samples, 32);

        let mut reader = WavBlockReader::open(&path).unwrap();
        assert_eq!(reader.info().total_frames, 1000);
        assert_eq!(reader.info().channels, 1);

        let mut buffer = BlockBuffer::new(1, 1000);
        reader.read_block(0, 1000, &mut buffer).unwrap();
        for (a, b) in samples.iter().zip(buffer.channel(0)) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn roundtrip_i16_loses_little() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("i16.wav");
        let samples = sine(500);
        write_mono(&path, &samples, 16);

        let mut reader = WavBlockReader::open(&path).unwrap();
        let mut buffer = BlockBuffer::new(1, 500);
        reader.read_block(0, 500, &mut buffer).unwrap();
        for (a, b) in samples.iter().zip(buffer.channel(0)) {
            assert!((a - b).abs() < 0.001);
        }
    }

    #[test]
    fn block_reads_advance_and_seek() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blocks.wav");
        let samples: Vec<f32> = (0..300).map(|i| i as f32 / 1000.0).collect();
        write_mono(&path, &samples, 32);

        let mut reader = WavBlockReader::open(&path).unwrap();
        let mut buffer = BlockBuffer::new(1, 128);

        // Sequential reads.
        reader.read_block(0, 128, &mut buffer).unwrap();
        assert!((buffer.channel(0)[0] - 0.0).abs() < 1e-6);
        reader.read_block(128, 128, &mut buffer).unwrap();
        assert!((buffer.channel(0)[0] - 0.128).abs() < 1e-6);

        // Backwards seek.
        reader.read_block(0, 128, &mut buffer).unwrap();
        assert!((buffer.channel(0)[5] - 0.005).abs() < 1e-6);
    }

    #[test]
    fn short_final_block_leaves_tail_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.wav");
        let samples = vec![0.5f32; 100];
        write_mono(&path, &samples, 32);

        let mut reader = WavBlockReader::open(&path).unwrap();
        let mut buffer = BlockBuffer::new(1, 128);
        buffer.clear();
        reader.read_block(64, 128, &mut buffer).unwrap();
        // 36 frames remain in the stream; the rest stays cleared.
        assert!(buffer.channel(0)[..36].iter().all(|&s| s == 0.5));
        assert!(buffer.channel(0)[36..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn stereo_roundtrip_keeps_channels_separate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");

        let mut writer = WavBlockWriter::create(&path, 48000, 2, 32).unwrap();
        let mut buffer = BlockBuffer::new(2, 64);
        buffer.channel_mut(0).fill(0.25);
        buffer.channel_mut(1).fill(-0.25);
        writer.write_block(&buffer, 64).unwrap();
        writer.finalize().unwrap();

        let mut reader = WavBlockReader::open(&path).unwrap();
        assert_eq!(reader.info().channels, 2);
        let mut out = BlockBuffer::new(2, 64);
        reader.read_block(0, 64, &mut out).unwrap();
        assert!(out.channel(0).iter().all(|&s| (s - 0.25).abs() < 1e-6));
        assert!(out.channel(1).iter().all(|&s| (s + 0.25).abs() < 1e-6));
    }

    #[test]
    fn probe_reads_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.wav");
        write_mono(&path, &sine(44100), 16);

        let info = probe(&path).unwrap();
        assert_eq!(info.sample_rate, 44100);
        assert_eq!(info.channels, 1);
        assert_eq!(info.total_frames, 44100);
    }

    #[test]
    fn unknown_extension_falls_back_to_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.raw");
        let mut writer = create_writer_for_path(&path, 44100, 1, 16).unwrap();
        let buffer = BlockBuffer::new(1, 8);
        writer.write_block(&buffer, 8).unwrap();
        writer.finalize().unwrap();

        // The file is a valid WAV regardless of its extension.
        let info = probe(&path).unwrap();
        assert_eq!(info.total_frames, 8);
    }

    #[test]
    fn writer_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deep/out.wav");
        let mut writer = create_writer_for_path(&path, 44100, 1, 16).unwrap();
        writer.finalize().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn write_after_finalize_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("done.wav");
        let mut writer = WavBlockWriter::create(&path, 44100, 1, 16).unwrap();
        writer.finalize().unwrap();
        let buffer = BlockBuffer::new(1, 8);
        assert!(writer.write_block(&buffer, 8).is_err());
    }
}
