use std::path::{Path, PathBuf};

use crate::container::{ChunkDescriptor, WavScanner};
use crate::utils::errors::ContainerError;

/// Source discovery and dispatch onto the work queue.
///
/// Provides [`run_manager`](manager::run_manager), the single producer of a run.
pub mod manager;

/// Orchestration of a complete run.
///
/// Provides [`Pipeline`](pipeline::Pipeline), which wires the queue, tracker,
/// manager and workers together and reports a [`RunSummary`](pipeline::RunSummary).
pub mod pipeline;

/// Encoder threads draining the work queue.
///
/// Provides [`WorkerPool`](worker::WorkerPool) and the per-chunk encode path.
pub mod worker;

/// Entry travelling through the work queue.
#[derive(Debug)]
pub enum Job {
    Encode(WorkItem),
    /// Asks the worker that receives it to exit.
    Stop,
}

/// One source file loaded into memory, plus its chunk scanning state.
///
/// A work item is owned by exactly one thread at a time: the manager until it
/// is enqueued, then the worker that dequeues it.
#[derive(Debug)]
pub struct WorkItem {
    path: PathBuf,
    data: Vec<u8>,
    scanner: WavScanner,
}

/// A chunk of the item's buffer together with its format.
#[derive(Debug)]
pub struct Chunk<'a> {
    pub index: usize,
    pub descriptor: ChunkDescriptor,
    pub payload: &'a [u8],
}

impl WorkItem {
    pub fn new(path: impl Into<PathBuf>, data: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            data,
            scanner: WavScanner::new(),
        }
    }

    /// Reads `path` fully into memory.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let data = std::fs::read(path)?;
        Ok(Self::new(path, data))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the loaded file in bytes.
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Moves to the next fmt/data pair; see [`WavScanner::next_chunk`].
    pub fn next_chunk(&mut self) -> Result<Option<Chunk<'_>>, ContainerError> {
        let index = self.scanner.chunks_found();
        let descriptor = self.scanner.next_chunk(&self.data)?;
        Ok(descriptor.map(|descriptor| Chunk {
            index,
            payload: &self.data[descriptor.payload.clone()],
            descriptor,
        }))
    }
}

/// Output path for the chunk at `index` of `source`: the source path without
/// its last extension, a numeric suffix for every chunk after the first, then
/// `.mp3`. With `output_dir` the file name is kept and the directory replaced.
pub fn output_path(source: &Path, index: usize, output_dir: Option<&Path>) -> PathBuf {
    let stem = source.file_stem().unwrap_or_default();
    let mut name = stem.to_os_string();
    if index > 0 {
        name.push(index.to_string());
    }
    name.push(".mp3");

    match output_dir {
        Some(dir) => dir.join(name),
        None => source.with_file_name(name),
    }
}
