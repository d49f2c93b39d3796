//! Boundary to the MP3 encoding engine.
//!
//! The pipeline never talks to an encoder library directly. It asks an
//! [`EncoderFactory`] for a fresh [`FrameEncoder`] per chunk, feeds it a
//! [`PcmBuffer`] already normalized to 16-bit or 32-bit signed samples, and
//! flushes it. [`lame`] provides the production implementation.

pub mod bitrate;
pub mod lame;
pub mod normalize;

use crate::container::ChunkDescriptor;
use crate::utils::errors::CodecError;

pub use bitrate::{bitrate_for_byte_rate, standard_bitrate};
pub use normalize::normalize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    Mono,
    Stereo,
}

/// Stream parameters handed to [`EncoderFactory::configure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderSettings {
    pub channels: u16,
    pub sample_rate: u32,
    pub bitrate_kbps: u32,
    pub mode: ChannelMode,
}

impl EncoderSettings {
    pub fn for_chunk(chunk: &ChunkDescriptor) -> Self {
        Self {
            channels: chunk.channels,
            sample_rate: chunk.sample_rate,
            bitrate_kbps: bitrate_for_byte_rate(chunk.byte_rate),
            mode: if chunk.channels == 1 {
                ChannelMode::Mono
            } else {
                ChannelMode::Stereo
            },
        }
    }
}

/// Sample storage in one of the widths the encoder accepts natively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Samples {
    I16(Vec<i16>),
    I32(Vec<i32>),
}

/// Interleaved PCM ready for encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmBuffer {
    channels: u16,
    samples: Samples,
}

impl PcmBuffer {
    pub fn new(channels: u16, samples: Samples) -> Self {
        Self { channels, samples }
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    /// Number of multi-channel frames.
    pub fn frames(&self) -> usize {
        let len = match &self.samples {
            Samples::I16(s) => s.len(),
            Samples::I32(s) => s.len(),
        };
        len / usize::from(self.channels.max(1))
    }

    /// Splits interleaved stereo into discrete left and right buffers.
    pub fn split_stereo_i32(samples: &[i32]) -> (Vec<i32>, Vec<i32>) {
        samples
            .chunks_exact(2)
            .map(|frame| (frame[0], frame[1]))
            .unzip()
    }
}

/// One encoder stream. Dropping it releases the engine state.
pub trait FrameEncoder {
    /// Encodes a whole buffer and returns the bitstream produced so far.
    fn encode(&mut self, pcm: &PcmBuffer) -> Result<Vec<u8>, CodecError>;

    /// Drains buffered frames at end of stream.
    fn flush(&mut self) -> Result<Vec<u8>, CodecError>;
}

/// Creates encoder streams. Shared by every worker; each stream is used by
/// exactly one thread.
pub trait EncoderFactory: Send + Sync {
    fn configure(&self, settings: &EncoderSettings) -> Result<Box<dyn FrameEncoder>, CodecError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_follow_chunk_format() {
        let chunk = ChunkDescriptor {
            channels: 1,
            sample_rate: 44_100,
            byte_rate: 88_200,
            block_align: 2,
            bits_per_sample: 16,
            payload: 44..100,
        };
        let settings = EncoderSettings::for_chunk(&chunk);
        assert_eq!(settings.mode, ChannelMode::Mono);
        assert_eq!(settings.bitrate_kbps, 96);
        assert_eq!(settings.sample_rate, 44_100);
    }

    #[test]
    fn stereo_split() {
        let (left, right) = PcmBuffer::split_stereo_i32(&[1, -1, 2, -2, 3]);
        assert_eq!(left, [1, 2]);
        assert_eq!(right, [-1, -2]);

        let pcm = PcmBuffer::new(2, Samples::I16(vec![0; 10]));
        assert_eq!(pcm.frames(), 5);
    }
}
