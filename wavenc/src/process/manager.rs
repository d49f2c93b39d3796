use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{Job, WorkItem};
use crate::sync::{BoundedQueue, CompletionTracker};

/// Shared state the manager thread needs.
pub struct ManagerContext {
    pub sources: Vec<PathBuf>,
    pub queue: Arc<BoundedQueue<Job>>,
    pub tracker: Arc<CompletionTracker>,
    pub stop: Arc<AtomicBool>,
}

/// What the manager did with the sources it was given.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    pub dispatched: usize,
    pub unreadable: usize,
    pub rejected: usize,
    pub not_dispatched: usize,
}

/// Loads every source and hands it to the workers.
///
/// The tracker is reset to the number of sources before anything else, so a
/// fast worker can never mark an item before the total is known. Sources that
/// are unreadable, rejected by the queue or skipped after a stop request are
/// marked complete here; everything else is marked by the worker that encodes
/// it.
pub fn run_manager(ctx: ManagerContext) -> DispatchStats {
    let ManagerContext {
        sources,
        queue,
        tracker,
        stop,
    } = ctx;

    tracker.reset(sources.len());
    let mut stats = DispatchStats::default();

    let mut sources = sources.into_iter();
    for path in sources.by_ref() {
        if stop.load(Ordering::Acquire) {
            log::info!("Stop requested, not dispatching {}", path.display());
            stats.not_dispatched += 1;
            tracker.mark_one();
            break;
        }

        let item = match WorkItem::load(&path) {
            Ok(item) => item,
            Err(e) => {
                log::warn!("Can't read {}: {e}", path.display());
                stats.unreadable += 1;
                tracker.mark_one();
                continue;
            }
        };

        log::debug!("Queueing {} ({} bytes)", path.display(), item.byte_len());
        match queue.enqueue(Job::Encode(item)) {
            Ok(()) => stats.dispatched += 1,
            Err(e) => {
                log::error!("Can't queue {}: {e}", path.display());
                drop(e.into_inner());
                stats.rejected += 1;
                tracker.mark_one();
            }
        }
    }

    for path in sources {
        log::debug!("Skipping {}", path.display());
        stats.not_dispatched += 1;
        tracker.mark_one();
    }

    stats
}
