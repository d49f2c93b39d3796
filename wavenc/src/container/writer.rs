use std::io::{self, Write};

use super::scan::{
    DATA_HEADER_LEN, DATA_TAG, FMT_HEADER_LEN, FMT_TAG, PCM_FMT_BODY_LEN, PCM_FORMAT_TAG,
    RIFF_TAG, WAVE_TAG,
};
use crate::join_bytes_le;

/// Parameters of one `fmt ` subsection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    /// Storage bytes per sample of one channel.
    pub slot_width: u16,
}

impl PcmFormat {
    /// Linear PCM with derived byte rate and block alignment.
    pub fn new(channels: u16, sample_rate: u32, bits_per_sample: u16) -> Self {
        Self::padded(channels, sample_rate, bits_per_sample, bits_per_sample / 8)
    }

    /// Linear PCM whose samples are stored in `slot_width` bytes, e.g. 24-bit
    /// samples in 4-byte slots.
    pub fn padded(
        channels: u16,
        sample_rate: u32,
        bits_per_sample: u16,
        slot_width: u16,
    ) -> Self {
        Self {
            format_tag: PCM_FORMAT_TAG,
            channels,
            sample_rate,
            bits_per_sample,
            slot_width,
        }
    }

    pub fn block_align(&self) -> u16 {
        self.channels * self.slot_width
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * u32::from(self.block_align())
    }

    fn write_header(&self, dst: &mut Vec<u8>) {
        dst.extend(join_bytes_le!(
            *FMT_TAG,
            PCM_FMT_BODY_LEN,
            self.format_tag,
            self.channels,
            self.sample_rate,
            self.byte_rate(),
            self.block_align(),
            self.bits_per_sample,
        ));
    }
}

enum Section {
    Format(PcmFormat),
    Data(Vec<u8>),
}

/// Builds RIFF/WAVE images in memory.
///
/// Subsections are emitted in the order they are added, which makes it easy to
/// produce files carrying several fmt/data pairs or stray fmt headers.
#[derive(Default)]
pub struct PcmWavBuilder {
    sections: Vec<Section>,
}

impl PcmWavBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fmt header followed by a data subsection holding `payload`.
    pub fn chunk(self, format: PcmFormat, payload: Vec<u8>) -> Self {
        self.format_only(format).data_only(payload)
    }

    pub fn format_only(mut self, format: PcmFormat) -> Self {
        self.sections.push(Section::Format(format));
        self
    }

    pub fn data_only(mut self, payload: Vec<u8>) -> Self {
        self.sections.push(Section::Data(payload));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let body_len: usize = self
            .sections
            .iter()
            .map(|section| match section {
                Section::Format(_) => FMT_HEADER_LEN,
                Section::Data(payload) => DATA_HEADER_LEN + payload.len(),
            })
            .sum();

        let mut out = Vec::with_capacity(12 + body_len);
        out.extend(join_bytes_le!(*RIFF_TAG, (4 + body_len) as u32, *WAVE_TAG));

        for section in &self.sections {
            match section {
                Section::Format(format) => format.write_header(&mut out),
                Section::Data(payload) => {
                    out.extend(join_bytes_le!(*DATA_TAG, payload.len() as u32));
                    out.extend_from_slice(payload);
                }
            }
        }
        out
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(&self.build())?;
        writer.flush()
    }
}

/// Packs interleaved 16-bit samples as little-endian bytes.
pub fn pack_i16(samples: &[i16]) -> Vec<u8> {
    join_bytes_le!(samples)
}

/// Packs 24-bit samples held in the low bits of `i32` as 3-byte little-endian.
pub fn pack_i24(samples: &[i32]) -> Vec<u8> {
    samples
        .iter()
        .flat_map(|sample| {
            let bytes = sample.to_le_bytes();
            [bytes[0], bytes[1], bytes[2]]
        })
        .collect()
}
