use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use super::Job;
use super::manager::{DispatchStats, ManagerContext, run_manager};
use super::worker::{WorkerPool, WorkerStats};
use crate::codec::EncoderFactory;
use crate::sync::{BoundedQueue, CompletionTracker};
use crate::utils::errors::PipelineError;

/// How often the orchestrator wakes up to report progress and check threads.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub workers: usize,
    pub queue_capacity: usize,
    /// Directory receiving every output. `None` writes next to each source.
    pub output_dir: Option<PathBuf>,
}

impl PipelineConfig {
    /// `workers` threads and a queue twice that deep.
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            queue_capacity: workers.saturating_mul(2),
            output_dir: None,
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }
}

/// Requests cancellation of a running [`Pipeline`] from any thread.
///
/// Sources not yet dispatched are skipped; items already queued are still
/// encoded.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Totals for one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub files_discovered: usize,
    pub files_unreadable: usize,
    pub files_without_chunks: usize,
    pub chunks_encoded: usize,
    pub chunks_failed: usize,
    pub files_not_dispatched: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    fn new(discovered: usize, dispatch: DispatchStats, workers: WorkerStats) -> Self {
        Self {
            files_discovered: discovered,
            files_unreadable: dispatch.unreadable,
            files_without_chunks: workers.files_without_chunks,
            chunks_encoded: workers.chunks_encoded,
            chunks_failed: workers.chunks_failed,
            files_not_dispatched: dispatch.not_dispatched + dispatch.rejected,
            elapsed: Duration::ZERO,
        }
    }
}

/// Progress callback, called with `(done, total)` files.
pub type Progress<'a> = &'a dyn Fn(usize, usize);

/// Converts a batch of sources with one producer and a pool of workers.
///
/// Startup goes tracker and queue, manager, workers. Shutdown waits for the
/// tracker to reach zero, joins the manager, then stops and joins the workers.
pub struct Pipeline {
    config: PipelineConfig,
    factory: Arc<dyn EncoderFactory>,
    stop: Arc<AtomicBool>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, factory: Arc<dyn EncoderFactory>) -> Self {
        Self {
            config,
            factory,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The flag is never cleared, so a stop also applies to later runs.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.stop))
    }

    pub fn run(
        &self,
        sources: Vec<PathBuf>,
        progress: Option<Progress<'_>>,
    ) -> Result<RunSummary, PipelineError> {
        if sources.is_empty() {
            return Err(PipelineError::NoSources);
        }
        if self.config.workers == 0 {
            return Err(PipelineError::NoWorkers);
        }
        if let Some(dir) = &self.config.output_dir {
            std::fs::create_dir_all(dir).map_err(|e| PipelineError::OutputDir(dir.clone(), e))?;
        }

        let start = Instant::now();
        let total = sources.len();

        let tracker = Arc::new(CompletionTracker::new());
        let queue = Arc::new(
            BoundedQueue::<Job>::new(self.config.queue_capacity)
                .ok_or(PipelineError::ZeroCapacity)?,
        );

        let ctx = ManagerContext {
            sources,
            queue: Arc::clone(&queue),
            tracker: Arc::clone(&tracker),
            stop: Arc::clone(&self.stop),
        };
        let manager = thread::Builder::new()
            .name("wav2mp3-manager".into())
            .spawn(move || run_manager(ctx))
            .map_err(|source| PipelineError::Spawn {
                role: "manager",
                source,
            })?;

        let pool = match WorkerPool::spawn(
            self.config.workers,
            Arc::clone(&queue),
            Arc::clone(&tracker),
            Arc::clone(&self.factory),
            self.config.output_dir.clone(),
        ) {
            Ok(pool) => pool,
            Err(e) => {
                self.abandon(&queue, manager);
                return Err(e);
            }
        };
        log::info!(
            "Converting {total} file(s) with {} worker(s)",
            self.config.workers
        );

        let mut manager = Some(manager);
        let mut dispatch = None;
        loop {
            let finished = tracker.wait_until_zero_timeout(POLL_INTERVAL);
            if let Some(report) = progress {
                report(done_count(tracker.current(), total), total);
            }
            if finished {
                break;
            }

            if manager.as_ref().is_some_and(|h| h.is_finished()) {
                if let Some(handle) = manager.take() {
                    match handle.join() {
                        Ok(stats) => dispatch = Some(stats),
                        Err(_) => {
                            let _ = pool.stop_and_join();
                            return Err(PipelineError::Panicked { role: "manager" });
                        }
                    }
                }
            }

            if pool.any_exited() {
                if let Some(handle) = manager.take() {
                    self.abandon(&queue, handle);
                }
                let _ = pool.stop_and_join();
                return Err(PipelineError::Panicked { role: "worker" });
            }
        }

        let dispatch = match (dispatch, manager) {
            (Some(stats), _) => stats,
            (None, Some(handle)) => handle
                .join()
                .map_err(|_| PipelineError::Panicked { role: "manager" })?,
            (None, None) => DispatchStats::default(),
        };
        let workers = pool.stop_and_join()?;

        let mut summary = RunSummary::new(total, dispatch, workers);
        summary.elapsed = start.elapsed();
        Ok(summary)
    }

    /// Stops a manager that has no consumers left, draining the queue so its
    /// pending enqueue cannot block forever.
    fn abandon(&self, queue: &BoundedQueue<Job>, manager: thread::JoinHandle<DispatchStats>) {
        self.stop.store(true, Ordering::Release);
        while !manager.is_finished() {
            if queue.try_dequeue().is_none() {
                thread::sleep(Duration::from_millis(1));
            }
        }
        let _ = manager.join();
        while queue.try_dequeue().is_some() {}
    }
}

fn done_count(outstanding: i64, total: usize) -> usize {
    let outstanding = usize::try_from(outstanding.max(0)).unwrap_or(usize::MAX);
    total.saturating_sub(outstanding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{EncoderSettings, FrameEncoder, PcmBuffer};
    use crate::container::{PcmFormat, PcmWavBuilder};
    use crate::utils::errors::CodecError;
    use std::fs;
    use std::sync::Mutex;

    struct Passthrough;

    impl FrameEncoder for Passthrough {
        fn encode(&mut self, pcm: &PcmBuffer) -> Result<Vec<u8>, CodecError> {
            Ok(vec![1; pcm.frames()])
        }

        fn flush(&mut self) -> Result<Vec<u8>, CodecError> {
            Ok(Vec::new())
        }
    }

    struct PassthroughFactory;

    impl EncoderFactory for PassthroughFactory {
        fn configure(&self, _: &EncoderSettings) -> Result<Box<dyn FrameEncoder>, CodecError> {
            Ok(Box::new(Passthrough))
        }
    }

    fn pipeline(workers: usize) -> Pipeline {
        Pipeline::new(PipelineConfig::new(workers), Arc::new(PassthroughFactory))
    }

    fn write_wav(dir: &std::path::Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let data = PcmWavBuilder::new()
            .chunk(PcmFormat::new(2, 44_100, 16), vec![0; 64])
            .build();
        fs::write(&path, data).unwrap();
        path
    }

    #[test]
    fn config_defaults_queue_to_twice_workers() {
        let config = PipelineConfig::new(3);
        assert_eq!(config.queue_capacity, 6);
        assert_eq!(config.output_dir, None);
    }

    #[test]
    fn rejects_invalid_configuration() {
        assert!(matches!(pipeline(2).run(Vec::new(), None), Err(PipelineError::NoSources)));
        assert!(matches!(
            pipeline(0).run(vec!["a.wav".into()], None),
            Err(PipelineError::NoWorkers)
        ));

        let zero_capacity = Pipeline::new(
            PipelineConfig::new(1).with_queue_capacity(0),
            Arc::new(PassthroughFactory),
        );
        assert!(matches!(
            zero_capacity.run(vec!["a.wav".into()], None),
            Err(PipelineError::ZeroCapacity)
        ));
    }

    #[test]
    fn converts_many_files_with_small_queue() {
        let dir = tempfile::tempdir().unwrap();
        let mut sources: Vec<_> = (0..25)
            .map(|i| write_wav(dir.path(), &format!("t{i}.wav")))
            .collect();
        sources.push(dir.path().join("gone.wav"));

        let calls = Mutex::new(Vec::new());
        let report: Progress<'_> = &|done, total| calls.lock().unwrap().push((done, total));

        let summary = Pipeline::new(
            PipelineConfig::new(4).with_queue_capacity(1),
            Arc::new(PassthroughFactory),
        )
        .run(sources, Some(report))
        .unwrap();

        assert_eq!(summary.files_discovered, 26);
        assert_eq!(summary.files_unreadable, 1);
        assert_eq!(summary.chunks_encoded, 25);
        assert_eq!(summary.files_not_dispatched, 0);
        for i in 0..25 {
            assert!(dir.path().join(format!("t{i}.mp3")).exists());
        }

        let calls = calls.into_inner().unwrap();
        assert_eq!(calls.last(), Some(&(26, 26)));
        assert!(calls.windows(2).all(|w| w[0].0 <= w[1].0));
    }

    #[test]
    fn output_dir_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out").join("nested");
        let source = write_wav(dir.path(), "a.wav");

        let summary = Pipeline::new(
            PipelineConfig::new(1).with_output_dir(&out),
            Arc::new(PassthroughFactory),
        )
        .run(vec![source], None)
        .unwrap();

        assert_eq!(summary.chunks_encoded, 1);
        assert!(out.join("a.mp3").exists());
        assert!(!dir.path().join("a.mp3").exists());
    }

    #[test]
    fn stop_before_run_terminates() {
        let dir = tempfile::tempdir().unwrap();
        let sources = vec![write_wav(dir.path(), "a.wav"), write_wav(dir.path(), "b.wav")];

        let pipeline = pipeline(2);
        let stop = pipeline.stop_handle();
        stop.request_stop();
        assert!(stop.is_stop_requested());

        let summary = pipeline.run(sources, None).unwrap();
        assert_eq!(summary.files_not_dispatched, 2);
        assert_eq!(summary.chunks_encoded, 0);
    }

    #[test]
    fn done_count_handles_unset_tracker() {
        assert_eq!(done_count(i64::MAX, 10), 0);
        assert_eq!(done_count(3, 10), 7);
        assert_eq!(done_count(0, 10), 10);
    }
}
