use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use super::{Chunk, Job, WorkItem};
use crate::codec::{EncoderFactory, EncoderSettings, normalize};
use crate::sync::{BoundedQueue, CompletionTracker};
use crate::utils::errors::{CodecError, PipelineError};

/// Per-worker counters, summed by the pipeline after join.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    pub files: usize,
    pub chunks_encoded: usize,
    pub chunks_failed: usize,
    pub files_without_chunks: usize,
}

impl std::ops::AddAssign for WorkerStats {
    fn add_assign(&mut self, rhs: Self) {
        self.files += rhs.files;
        self.chunks_encoded += rhs.chunks_encoded;
        self.chunks_failed += rhs.chunks_failed;
        self.files_without_chunks += rhs.files_without_chunks;
    }
}

#[derive(Debug, thiserror::Error)]
enum ChunkError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Can't write {0}: {1}")]
    Write(PathBuf, #[source] std::io::Error),
}

/// Everything a worker thread shares with its siblings.
#[derive(Clone)]
struct WorkerContext {
    queue: Arc<BoundedQueue<Job>>,
    tracker: Arc<CompletionTracker>,
    factory: Arc<dyn EncoderFactory>,
    output_dir: Option<PathBuf>,
}

/// Fixed set of encoder threads draining one queue.
pub struct WorkerPool {
    queue: Arc<BoundedQueue<Job>>,
    handles: Vec<thread::JoinHandle<WorkerStats>>,
}

impl WorkerPool {
    /// Starts `workers` threads named `wav2mp3-worker-<n>`.
    ///
    /// If a spawn fails, the threads already running are stopped and joined
    /// before the error is returned.
    pub fn spawn(
        workers: usize,
        queue: Arc<BoundedQueue<Job>>,
        tracker: Arc<CompletionTracker>,
        factory: Arc<dyn EncoderFactory>,
        output_dir: Option<PathBuf>,
    ) -> Result<Self, PipelineError> {
        if workers == 0 {
            return Err(PipelineError::NoWorkers);
        }

        let ctx = WorkerContext {
            queue: Arc::clone(&queue),
            tracker,
            factory,
            output_dir,
        };

        let mut pool = Self {
            queue,
            handles: Vec::with_capacity(workers),
        };

        for id in 0..workers {
            let ctx = ctx.clone();
            let spawned = thread::Builder::new()
                .name(format!("wav2mp3-worker-{id}"))
                .spawn(move || worker_loop(id, ctx));

            match spawned {
                Ok(handle) => pool.handles.push(handle),
                Err(source) => {
                    // Join what is running; their stats are lost with the run.
                    let _ = pool.stop_and_join();
                    return Err(PipelineError::Spawn {
                        role: "worker",
                        source,
                    });
                }
            }
        }

        log::debug!("Started {workers} worker(s)");
        Ok(pool)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Workers only exit on a stop sentinel, so a finished thread before that
    /// point has panicked.
    pub fn any_exited(&self) -> bool {
        self.handles.iter().any(|h| h.is_finished())
    }

    /// Sends one stop sentinel per running worker and waits for all of them.
    pub fn stop_and_join(self) -> Result<WorkerStats, PipelineError> {
        let running = self.handles.iter().filter(|h| !h.is_finished()).count();
        for _ in 0..running {
            if let Err(e) = self.queue.enqueue(Job::Stop) {
                log::error!("Can't queue stop sentinel: {e}");
                return Err(PipelineError::StopSignal { role: "worker" });
            }
        }

        let mut total = WorkerStats::default();
        let mut panicked = false;
        for handle in self.handles {
            match handle.join() {
                Ok(stats) => total += stats,
                Err(_) => panicked = true,
            }
        }

        if panicked {
            return Err(PipelineError::Panicked { role: "worker" });
        }
        Ok(total)
    }
}

fn worker_loop(id: usize, ctx: WorkerContext) -> WorkerStats {
    let mut stats = WorkerStats::default();

    loop {
        match ctx.queue.dequeue() {
            Job::Stop => break,
            Job::Encode(item) => {
                process_item(item, &ctx, &mut stats);
                ctx.tracker.mark_one();
            }
        }
    }

    log::debug!(
        "Worker {id} done: {} file(s), {} chunk(s) encoded, {} failed",
        stats.files,
        stats.chunks_encoded,
        stats.chunks_failed
    );
    stats
}

fn process_item(mut item: WorkItem, ctx: &WorkerContext, stats: &mut WorkerStats) {
    stats.files += 1;
    let source = item.path().to_path_buf();
    let mut seen = 0;

    loop {
        let chunk = match item.next_chunk() {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                log::warn!("{}: {e}", source.display());
                break;
            }
        };
        seen += 1;

        let output = super::output_path(&source, chunk.index, ctx.output_dir.as_deref());
        match encode_chunk(&chunk, &output, ctx.factory.as_ref()) {
            Ok(bytes) => {
                log::info!(
                    "{} -> {} ({} Hz, {} ch, {} bps, {bytes} bytes)",
                    source.display(),
                    output.display(),
                    chunk.descriptor.sample_rate,
                    chunk.descriptor.channels,
                    chunk.descriptor.bits_per_sample,
                );
                stats.chunks_encoded += 1;
            }
            Err(e) => {
                log::error!("{} chunk {}: {e}", source.display(), chunk.index);
                stats.chunks_failed += 1;
            }
        }
    }

    if seen == 0 {
        stats.files_without_chunks += 1;
    }
}

/// Encodes one chunk and writes it to `output`. Returns the number of bytes
/// written. Encoding finishes before `output` is created, and a file left half
/// written is removed.
fn encode_chunk(
    chunk: &Chunk<'_>,
    output: &Path,
    factory: &dyn EncoderFactory,
) -> Result<usize, ChunkError> {
    let settings = EncoderSettings::for_chunk(&chunk.descriptor);
    let pcm = normalize(&chunk.descriptor, chunk.payload)?;

    let mut encoder = factory.configure(&settings)?;
    let mut mp3 = encoder.encode(&pcm)?;
    mp3.extend(encoder.flush()?);
    drop(pcm);

    write_output(output, &mp3).map_err(|e| ChunkError::Write(output.to_path_buf(), e))?;
    Ok(mp3.len())
}

fn write_output(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let file = fs::File::create(path)?;
    finish_output(file, path, bytes)
}

/// Writes `bytes` to the freshly created `out` at `path`, removing the file
/// again if that fails.
fn finish_output<W: Write>(mut out: W, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let result = out.write_all(bytes).and_then(|()| out.flush());
    drop(out);

    if result.is_err() {
        let _ = fs::remove_file(path);
    }
    result
}
