//! Utility functions and supporting infrastructure.
//!
//! Error types shared across the pipeline and little-endian byte helpers used
//! when emitting RIFF structures.

pub mod byteorder;
pub mod errors;
