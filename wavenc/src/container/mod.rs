//! RIFF/WAVE container handling.
//!
//! [`WavScanner`] walks the fmt/data pairs of an in-memory WAV image;
//! [`PcmWavBuilder`] produces such images.

pub mod scan;
pub mod writer;

pub use scan::{ChunkDescriptor, WavScanner};
pub use writer::{PcmFormat, PcmWavBuilder};
