use std::path::PathBuf;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContainerError {
    #[error("Buffer is empty")]
    Empty,

    #[error("Can't find RIFF header")]
    MissingRiff,

    #[error("Format is not WAVE")]
    NotWave,

    #[error("Can't find PCM fmt header with 1 or 2 channels, 8, 16, 24 or 32 bps")]
    NoPcmFormat,

    #[error("Can't find data header")]
    MissingData,
}

#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    #[error("Encoder configuration rejected: {0}")]
    Configure(String),

    #[error("Encoding failed: {0}")]
    Encode(String),

    #[error("Flushing encoder failed: {0}")]
    Flush(String),

    #[error("Unsupported sample layout: {channels} channel(s), {bits_per_sample} bps")]
    UnsupportedLayout { channels: u16, bits_per_sample: u16 },
}

/// Returned by [`BoundedQueue::enqueue`](crate::sync::BoundedQueue::enqueue)
/// when the item could not be stored. The rejected item is handed back.
#[derive(thiserror::Error)]
pub enum QueueError<T> {
    #[error("Queue storage could not grow to hold the item")]
    Alloc(T),
}

impl<T> std::fmt::Debug for QueueError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueError::Alloc(_) => f.write_str("QueueError::Alloc(..)"),
        }
    }
}

impl<T> QueueError<T> {
    pub fn into_inner(self) -> T {
        match self {
            QueueError::Alloc(item) => item,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("No source files to process")]
    NoSources,

    #[error("Worker count must be at least 1")]
    NoWorkers,

    #[error("Queue capacity must be at least 1")]
    ZeroCapacity,

    #[error("Failed to spawn {role} thread: {source}")]
    Spawn {
        role: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not deliver the stop signal to {role} threads")]
    StopSignal { role: &'static str },

    #[error("{role} thread panicked")]
    Panicked { role: &'static str },

    #[error("Output directory {0} is not usable: {1}")]
    OutputDir(PathBuf, #[source] std::io::Error),
}
