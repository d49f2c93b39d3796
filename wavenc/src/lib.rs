//! Concurrent RIFF/WAVE to MP3 transcoding.
//!
//! ## Technical Overview
//!
//! A run converts a batch of WAV files with one producer thread and a fixed
//! pool of encoder threads connected by a bounded queue.
//!
//! ### Container Handling
//!
//! Files are read fully into memory and scanned for successive `fmt `/`data`
//! pairs. Every pair found becomes one MP3 file, so a source holding several
//! chunks yields `name.mp3`, `name1.mp3`, `name2.mp3` and so on. Declared sizes
//! are clamped to the bytes present.
//!
//! ### Supported Input
//!
//! - Linear PCM (format tag 1)
//! - 1 or 2 channels
//! - 8, 16, 24 or 32 bits per sample
//!
//! ### Completion
//!
//! Every discovered file is counted once, whether it could not be read, could
//! not be parsed or was encoded. The run finishes when that count reaches zero.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wavenc::codec::lame::LameEncoderFactory;
//! use wavenc::process::pipeline::{Pipeline, PipelineConfig};
//!
//! let pipeline = Pipeline::new(
//!     PipelineConfig::new(4),
//!     Arc::new(LameEncoderFactory::default()),
//! );
//!
//! let summary = pipeline.run(vec!["music/song.wav".into()], None)?;
//! println!("{} chunk(s) encoded", summary.chunks_encoded);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// MP3 encoding boundary.
///
/// - **Traits** ([`codec::EncoderFactory`], [`codec::FrameEncoder`]): per-chunk encoder streams
/// - **LAME** ([`codec::lame`]): production encoder
/// - **Bitrate** ([`codec::bitrate`]): standard MPEG bitrate selection
/// - **Normalization** ([`codec::normalize`]): sample width conversion
pub mod codec;

/// RIFF/WAVE container support.
///
/// - **Scanning** ([`container::WavScanner`]): locates fmt/data pairs
/// - **Writing** ([`container::PcmWavBuilder`]): builds PCM WAV images
pub mod container;

/// Work items, dispatch, workers and orchestration.
pub mod process;

/// Thread coordination primitives.
///
/// - **Queue** ([`sync::BoundedQueue`]): blocking fixed-capacity FIFO
/// - **Tracker** ([`sync::CompletionTracker`]): outstanding work counter
pub mod sync;

/// Utility functions and supporting infrastructure.
///
/// - **Byte Order** ([`utils::byteorder`]): little-endian packing and reading
/// - **Error Handling** ([`utils::errors`]): Error types
pub mod utils;
