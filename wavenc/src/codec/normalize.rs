use super::{PcmBuffer, Samples};
use crate::container::ChunkDescriptor;
use crate::utils::errors::CodecError;

/// Converts the raw payload of `chunk` into samples the encoder accepts.
///
/// The sample slot width is `block_align / channels`, so padded layouts are
/// decoded by their storage width rather than by `bits_per_sample`:
///
/// | slot    | typical source             | result                                   |
/// |---------|----------------------------|------------------------------------------|
/// | 1 byte  | 8-bit unsigned             | `i16`, `(b - 128) << 8`                  |
/// | 2 bytes | 16-bit, or 8-bit in 16     | `i16`                                    |
/// | 3 bytes | 24-bit                     | `i32`, low byte zero, sample in top bits |
/// | 4 bytes | 32-bit, or 24-bit in 32    | `i32`                                    |
///
/// Interleaving is preserved. Bytes after the last complete frame are ignored.
pub fn normalize(chunk: &ChunkDescriptor, payload: &[u8]) -> Result<PcmBuffer, CodecError> {
    let unsupported = || CodecError::UnsupportedLayout {
        channels: chunk.channels,
        bits_per_sample: chunk.bits_per_sample,
    };

    if !matches!(chunk.channels, 1 | 2) || chunk.block_align % chunk.channels != 0 {
        return Err(unsupported());
    }

    let width = chunk.bytes_per_sample();
    if !(1..=4).contains(&width) || usize::from(chunk.bits_per_sample) > width * 8 {
        return Err(unsupported());
    }

    let usable = usize::from(chunk.block_align)
        .checked_mul(chunk.frame_count())
        .filter(|&n| n <= payload.len())
        .ok_or_else(unsupported)?;
    let data = &payload[..usable];

    let samples = match width {
        1 => Samples::I16(data.iter().map(|&b| (i16::from(b) - 0x80) << 8).collect()),
        2 => Samples::I16(
            data.chunks_exact(2)
                .map(|b| i16::from_le_bytes([b[0], b[1]]))
                .collect(),
        ),
        3 => Samples::I32(
            data.chunks_exact(3)
                .map(|b| i32::from_le_bytes([0, b[0], b[1], b[2]]))
                .collect(),
        ),
        _ => Samples::I32(
            data.chunks_exact(4)
                .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect(),
        ),
    };

    Ok(PcmBuffer::new(chunk.channels, samples))
}
