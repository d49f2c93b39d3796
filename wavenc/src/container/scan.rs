use std::ops::Range;

use crate::utils::byteorder::{read_u16_le, read_u32_le};
use crate::utils::errors::ContainerError;

pub const RIFF_TAG: &[u8; 4] = b"RIFF";
pub const WAVE_TAG: &[u8; 4] = b"WAVE";
pub const FMT_TAG: &[u8; 4] = b"fmt ";
pub const DATA_TAG: &[u8; 4] = b"data";

/// `"RIFF"`, group size, `"WAVE"`.
pub const RIFF_HEADER_LEN: usize = 12;
/// `"fmt "`, size and the 16-byte PCM format body.
pub const FMT_HEADER_LEN: usize = 24;
/// `"data"` and the declared payload size.
pub const DATA_HEADER_LEN: usize = 8;

pub const PCM_FORMAT_TAG: u16 = 1;
pub const PCM_FMT_BODY_LEN: u32 = 16;

/// Audio format and payload location of one fmt/data pair.
///
/// `payload` indexes the buffer the scanner was run over. Its length is
/// already clamped to the bytes physically present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkDescriptor {
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub payload: Range<usize>,
}

impl ChunkDescriptor {
    /// Bytes occupied by one sample slot of one channel, taken from the block
    /// alignment. May exceed `bits_per_sample / 8` for padded layouts such as
    /// 24-bit samples stored in 4 bytes.
    pub fn bytes_per_sample(&self) -> usize {
        match self.channels {
            0 => 0,
            channels => usize::from(self.block_align / channels),
        }
    }

    /// Number of complete multi-channel frames in the payload.
    pub fn frame_count(&self) -> usize {
        match usize::from(self.block_align) {
            0 => 0,
            frame => self.payload.len() / frame,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct FormatChunk {
    channels: u16,
    sample_rate: u32,
    byte_rate: u32,
    block_align: u16,
    bits_per_sample: u16,
}

impl FormatChunk {
    /// Decodes the fmt header at `offset`; `None` when it does not fit in `buf`.
    fn read(buf: &[u8], offset: usize) -> Option<(u32, u16, Self)> {
        if buf.len().checked_sub(offset)? < FMT_HEADER_LEN {
            return None;
        }
        let size = read_u32_le(buf, offset + 4)?;
        let tag = read_u16_le(buf, offset + 8)?;
        let chunk = FormatChunk {
            channels: read_u16_le(buf, offset + 10)?,
            sample_rate: read_u32_le(buf, offset + 12)?,
            byte_rate: read_u32_le(buf, offset + 16)?,
            block_align: read_u16_le(buf, offset + 20)?,
            bits_per_sample: read_u16_le(buf, offset + 22)?,
        };
        Some((size, tag, chunk))
    }

    fn is_supported(size: u32, tag: u16, chunk: &FormatChunk) -> bool {
        size == PCM_FMT_BODY_LEN
            && tag == PCM_FORMAT_TAG
            && matches!(chunk.channels, 1 | 2)
            && matches!(chunk.bits_per_sample, 8 | 16 | 24 | 32)
    }
}

#[derive(Debug, Clone, Copy)]
struct DataChunk {
    /// Offset of the `"data"` tag.
    offset: usize,
    declared_size: u32,
}

impl DataChunk {
    fn payload_start(&self) -> usize {
        self.offset + DATA_HEADER_LEN
    }

    /// Where scanning resumes, using the declared rather than the clamped size.
    fn resume_offset(&self) -> usize {
        self.payload_start()
            .saturating_add(self.declared_size as usize)
    }

    fn payload(&self, buf_len: usize) -> Range<usize> {
        let start = self.payload_start().min(buf_len);
        let available = buf_len - start;
        start..start + available.min(self.declared_size as usize)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    #[default]
    Fresh,
    Scanning,
    Finished,
    Failed,
}

/// Incremental scanner locating successive fmt/data pairs in a RIFF/WAVE
/// image held in memory.
///
/// The scanner only keeps offsets; the caller passes the same buffer to every
/// call. The first call validates the RIFF/WAVE group header. Every later call
/// resumes right after the previous payload as declared in its header, so files
/// holding several back-to-back chunks are walked one pair at a time. A payload
/// is always paired with the most recent supported fmt header seen so far.
///
/// Once the scanner has failed or run out of chunks it stays that way.
#[derive(Debug, Default)]
pub struct WavScanner {
    state: ScanState,
    riff: Option<usize>,
    format: Option<FormatChunk>,
    data: Option<DataChunk>,
    chunks_found: usize,
}

impl WavScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances to the next chunk, returning `false` when there is none or the
    /// container is malformed.
    pub fn advance(&mut self, buf: &[u8]) -> bool {
        matches!(self.next_chunk(buf), Ok(Some(_)))
    }

    /// Advances to the next chunk.
    ///
    /// Returns `Ok(None)` once no further fmt/data pair exists, and an error
    /// when the container is unusable from this point on. Either outcome is
    /// permanent.
    pub fn next_chunk(&mut self, buf: &[u8]) -> Result<Option<ChunkDescriptor>, ContainerError> {
        match self.state {
            ScanState::Finished | ScanState::Failed => return Ok(None),
            ScanState::Fresh | ScanState::Scanning => {}
        }

        match self.scan(buf) {
            Ok(Some(descriptor)) => {
                self.state = ScanState::Scanning;
                self.chunks_found += 1;
                Ok(Some(descriptor))
            }
            Ok(None) => {
                self.state = ScanState::Finished;
                self.data = None;
                Ok(None)
            }
            Err(e) => {
                self.state = ScanState::Failed;
                self.format = None;
                self.data = None;
                Err(e)
            }
        }
    }

    /// Descriptor of the chunk found by the last successful advance.
    pub fn current(&self, buf: &[u8]) -> Option<ChunkDescriptor> {
        let format = self.format?;
        let data = self.data?;
        Some(ChunkDescriptor {
            channels: format.channels,
            sample_rate: format.sample_rate,
            byte_rate: format.byte_rate,
            block_align: format.block_align,
            bits_per_sample: format.bits_per_sample,
            payload: data.payload(buf.len()),
        })
    }

    /// Offset just past the last payload (as declared), or 0 before the first.
    pub fn cursor(&self) -> usize {
        self.data.map_or(0, |d| d.resume_offset())
    }

    pub fn chunks_found(&self) -> usize {
        self.chunks_found
    }

    pub fn has_failed(&self) -> bool {
        self.state == ScanState::Failed
    }

    fn scan(&mut self, buf: &[u8]) -> Result<Option<ChunkDescriptor>, ContainerError> {
        if buf.is_empty() {
            return Err(ContainerError::Empty);
        }

        let mut pos = self.cursor();
        if pos >= buf.len() {
            return Ok(None);
        }

        if self.riff.is_none() {
            let riff = (buf.len() - pos >= RIFF_HEADER_LEN)
                .then(|| find_tag(buf, pos, RIFF_TAG))
                .flatten()
                .filter(|&at| at + RIFF_HEADER_LEN <= buf.len())
                .ok_or(ContainerError::MissingRiff)?;

            if &buf[riff + 8..riff + RIFF_HEADER_LEN] != WAVE_TAG {
                return Err(ContainerError::NotWave);
            }
            self.riff = Some(riff);
            pos = riff + RIFF_HEADER_LEN;
        }

        let mut fmt_pos = pos;
        while buf.len() - fmt_pos > FMT_HEADER_LEN {
            let Some(at) = find_tag(buf, fmt_pos, FMT_TAG) else {
                break;
            };
            let Some((size, tag, chunk)) = FormatChunk::read(buf, at) else {
                break;
            };

            if FormatChunk::is_supported(size, tag, &chunk) {
                self.format = Some(chunk);
                pos = at + FMT_HEADER_LEN;
                break;
            }

            log::debug!(
                "Skipping unsupported fmt header at {at}: size {size}, tag {tag}, {} ch, {} bps",
                chunk.channels,
                chunk.bits_per_sample
            );
            fmt_pos = at + FMT_TAG.len();
        }

        if self.format.is_none() {
            return Err(ContainerError::NoPcmFormat);
        }

        let data = (buf.len() - pos >= DATA_HEADER_LEN)
            .then(|| find_tag(buf, pos, DATA_TAG))
            .flatten()
            .and_then(|at| {
                read_u32_le(buf, at + 4).map(|declared_size| DataChunk {
                    offset: at,
                    declared_size,
                })
            });

        match data {
            Some(data) => {
                self.data = Some(data);
                Ok(self.current(buf))
            }
            None if self.data.is_none() => Err(ContainerError::MissingData),
            None => Ok(None),
        }
    }
}

/// Position of the first occurrence of `tag` at or after `from`.
fn find_tag(buf: &[u8], from: usize, tag: &[u8; 4]) -> Option<usize> {
    buf.get(from..)?
        .windows(tag.len())
        .position(|window| window == tag)
        .map(|i| from + i)
}
