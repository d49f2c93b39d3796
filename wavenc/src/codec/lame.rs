//! LAME-backed encoder via the `mp3lame-encoder` bindings.

use mp3lame_encoder::{
    Bitrate, Builder, DualPcm, Encoder, FlushGap, InterleavedPcm, Mode, MonoPcm, Quality,
};

use super::{ChannelMode, EncoderFactory, EncoderSettings, FrameEncoder, PcmBuffer, Samples};
use crate::utils::errors::CodecError;

/// Upper bound LAME documents for the bytes produced by a flush.
const FLUSH_BUFFER_LEN: usize = 7200;

/// Algorithm quality used when none is given ("good quality, fast").
pub const DEFAULT_QUALITY: u8 = 5;

/// Configures a new LAME stream for every chunk.
#[derive(Debug, Clone, Copy)]
pub struct LameEncoderFactory {
    quality: u8,
}

impl Default for LameEncoderFactory {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
        }
    }
}

impl LameEncoderFactory {
    /// `quality` follows LAME: 0 is best and slowest, 9 worst and fastest.
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.min(9),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl EncoderFactory for LameEncoderFactory {
    fn configure(&self, settings: &EncoderSettings) -> Result<Box<dyn FrameEncoder>, CodecError> {
        let configure_err = |e| CodecError::Configure(format!("{e:?}"));

        let channels = u8::try_from(settings.channels)
            .map_err(|_| CodecError::Configure(format!("{} channels", settings.channels)))?;

        let mut builder =
            Builder::new().ok_or_else(|| CodecError::Configure("lame_init failed".into()))?;
        builder.set_num_channels(channels).map_err(configure_err)?;
        builder
            .set_sample_rate(settings.sample_rate)
            .map_err(configure_err)?;
        builder
            .set_brate(lame_bitrate(settings.bitrate_kbps))
            .map_err(configure_err)?;
        builder
            .set_quality(lame_quality(self.quality))
            .map_err(configure_err)?;
        builder
            .set_mode(match settings.mode {
                ChannelMode::Mono => Mode::Mono,
                ChannelMode::Stereo => Mode::Stereo,
            })
            .map_err(configure_err)?;
        builder.set_to_write_vbr_tag(false).map_err(configure_err)?;

        let encoder = builder.build().map_err(configure_err)?;
        Ok(Box::new(LameEncoder { encoder }))
    }
}

pub struct LameEncoder {
    encoder: Encoder,
}

impl FrameEncoder for LameEncoder {
    fn encode(&mut self, pcm: &PcmBuffer) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(pcm.frames()));

        let written = match (pcm.channels(), pcm.samples()) {
            (1, Samples::I16(samples)) => self.encoder.encode_to_vec(MonoPcm(samples.as_slice()), &mut out),
            (1, Samples::I32(samples)) => self.encoder.encode_to_vec(MonoPcm(samples.as_slice()), &mut out),
            (2, Samples::I16(samples)) => self
                .encoder
                .encode_to_vec(InterleavedPcm(samples.as_slice()), &mut out),
            (2, Samples::I32(samples)) => {
                let (left, right) = PcmBuffer::split_stereo_i32(samples);
                self.encoder.encode_to_vec(
                    DualPcm {
                        left: left.as_slice(),
                        right: right.as_slice(),
                    },
                    &mut out,
                )
            }
            (channels, samples) => {
                return Err(CodecError::UnsupportedLayout {
                    channels,
                    bits_per_sample: match samples {
                        Samples::I16(_) => 16,
                        Samples::I32(_) => 32,
                    },
                });
            }
        }
        .map_err(|e| CodecError::Encode(format!("{e:?}")))?;

        log::trace!("LAME produced {written} bytes for {} frames", pcm.frames());
        Ok(out)
    }

    fn flush(&mut self) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::with_capacity(FLUSH_BUFFER_LEN);
        self.encoder
            .flush_to_vec::<FlushGap>(&mut out)
            .map_err(|e| CodecError::Flush(format!("{e:?}")))?;
        Ok(out)
    }
}

/// Maps a standard bitrate onto the closest preset LAME exposes, rounding up.
fn lame_bitrate(kbps: u32) -> Bitrate {
    match kbps {
        0..=8 => Bitrate::Kbps8,
        9..=16 => Bitrate::Kbps16,
        17..=24 => Bitrate::Kbps24,
        25..=32 => Bitrate::Kbps32,
        33..=40 => Bitrate::Kbps40,
        41..=48 => Bitrate::Kbps48,
        49..=64 => Bitrate::Kbps64,
        65..=80 => Bitrate::Kbps80,
        81..=96 => Bitrate::Kbps96,
        97..=112 => Bitrate::Kbps112,
        113..=128 => Bitrate::Kbps128,
        129..=160 => Bitrate::Kbps160,
        161..=192 => Bitrate::Kbps192,
        193..=224 => Bitrate::Kbps224,
        225..=256 => Bitrate::Kbps256,
        _ => Bitrate::Kbps320,
    }
}

fn lame_quality(quality: u8) -> Quality {
    match quality {
        0 => Quality::Best,
        1 => Quality::SecondBest,
        2 => Quality::NearBest,
        3 => Quality::VeryNice,
        4 => Quality::Nice,
        5 => Quality::Good,
        6 => Quality::Decent,
        7 => Quality::Ok,
        8 => Quality::SecondWorst,
        _ => Quality::Worst,
    }
}
