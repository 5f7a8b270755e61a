//! Work dispatcher
//!
//! Fans the pages of one document out to a bounded pool of workers and
//! collects their verdicts back in page order.
//!
//! Each dispatch cycle owns a fresh work queue and result map; nothing
//! survives between calls. The pool is sized `min(parallelism, pages)`, so a
//! document never gets more workers than it has pages.

use crate::cancel::CancellationToken;
use crate::classifier::PageClassifier;
use crate::error::{OrientError, Result};
use crate::page::{Page, PageVerdict, Verdict};
use crate::progress::{NoProgress, ProcessingStage, ProgressCallback};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rayon::prelude::*;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Number of workers for a batch: never more than the work, never zero
/// for a non-empty batch
pub fn worker_count(parallelism: usize, items: usize) -> usize {
    parallelism.max(1).min(items)
}

/// Dispatcher options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Upper bound on concurrent workers; hardware parallelism when unset
    pub parallelism: Option<usize>,
}

impl DispatchOptions {
    /// Options with a fixed parallelism
    pub fn with_parallelism(parallelism: usize) -> Self {
        Self {
            parallelism: Some(parallelism),
        }
    }

    /// Parallelism actually used
    pub fn effective_parallelism(&self) -> usize {
        self.parallelism.unwrap_or_else(num_cpus::get).max(1)
    }
}

/// Verdicts of one dispatch cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    /// One entry per input page, in input order
    pub verdicts: Vec<PageVerdict>,
    /// Workers spawned for the cycle
    pub workers: usize,
}

impl DispatchReport {
    /// Drop page numbers, keeping order
    pub fn into_verdicts(self) -> Vec<Verdict> {
        self.verdicts.into_iter().map(|pv| pv.verdict).collect()
    }
}

// ============================================================
// Per-cycle state
// ============================================================

/// A page queued for classification with its 1-based position
struct WorkItem {
    position: u32,
    page: Page,
}

/// Shared pop-or-empty queue
struct WorkQueue {
    items: Mutex<VecDeque<WorkItem>>,
}

impl WorkQueue {
    fn load(pages: Vec<Page>) -> Self {
        let items = pages
            .into_iter()
            .enumerate()
            .map(|(idx, page)| WorkItem {
                position: idx as u32 + 1,
                page,
            })
            .collect();
        Self {
            items: Mutex::new(items),
        }
    }

    fn pop(&self) -> Option<WorkItem> {
        // A poisoned lock only means another worker panicked; the deque is intact
        let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        items.pop_front()
    }
}

/// Concurrent position -> verdict map, insert-once per key
struct ResultMap {
    entries: DashMap<u32, PageVerdict>,
}

impl ResultMap {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: DashMap::with_capacity(capacity),
        }
    }

    fn insert(&self, position: u32, verdict: PageVerdict) -> Result<()> {
        match self.entries.entry(position) {
            Entry::Occupied(_) => Err(OrientError::InternalInvariantViolation(format!(
                "page position {} was classified twice",
                position
            ))),
            Entry::Vacant(slot) => {
                slot.insert(verdict);
                Ok(())
            }
        }
    }

    /// Drain positions 1..=total in order
    fn into_ordered(self, total: usize) -> Result<Vec<PageVerdict>> {
        if self.entries.len() != total {
            return Err(OrientError::InternalInvariantViolation(format!(
                "expected {} verdicts, found {}",
                total,
                self.entries.len()
            )));
        }
        (1..=total as u32)
            .map(|position| {
                self.entries
                    .remove(&position)
                    .map(|(_, verdict)| verdict)
                    .ok_or_else(|| {
                        OrientError::InternalInvariantViolation(format!(
                            "no verdict for page position {}",
                            position
                        ))
                    })
            })
            .collect()
    }
}

/// Everything a worker shares with its siblings
struct Shared<'a, C: ?Sized> {
    queue: &'a WorkQueue,
    results: &'a ResultMap,
    classifier: &'a C,
    cancel: &'a CancellationToken,
    abort: &'a CancellationToken,
    progress: &'a dyn ProgressCallback,
    completed: &'a AtomicUsize,
    total: usize,
}

impl<C: PageClassifier + ?Sized> Shared<'_, C> {
    fn stopped(&self) -> bool {
        self.abort.is_cancelled() || self.cancel.is_cancelled()
    }

    /// Worker loop: pop, classify, record; returns pages handled
    fn run_worker(&self, worker_id: usize) -> Result<usize> {
        let mut handled = 0usize;

        while !self.stopped() {
            let Some(item) = self.queue.pop() else {
                break;
            };
            let page_number = item.page.number;

            let verdict = match self.classifier.classify(item.page) {
                Ok(verdict) => verdict,
                Err(e) => {
                    self.abort.cancel();
                    let e = e.on_page(page_number);
                    warn!(worker = worker_id, page = page_number, error = %e, "aborting batch");
                    return Err(e);
                }
            };

            let record = PageVerdict {
                page_number,
                verdict,
            };
            if let Err(e) = self.results.insert(item.position, record) {
                self.abort.cancel();
                return Err(e);
            }

            handled += 1;
            let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
            self.progress
                .on_page_complete(page_number, verdict, done, self.total);
        }

        debug!(worker = worker_id, pages = handled, "worker finished");
        Ok(handled)
    }
}

// ============================================================
// Dispatcher
// ============================================================

/// Bounded worker pool applying a classifier to every page
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    options: DispatchOptions,
}

impl Dispatcher {
    pub fn new(options: DispatchOptions) -> Self {
        Self { options }
    }

    /// Classify every page; `output[i]` is the verdict of `pages[i]`
    pub fn dispatch<C>(&self, pages: Vec<Page>, classifier: &C) -> Result<Vec<Verdict>>
    where
        C: PageClassifier + ?Sized,
    {
        let report = self.dispatch_with(pages, classifier, &CancellationToken::new(), &NoProgress)?;
        Ok(report.into_verdicts())
    }

    /// Classify every page with external cancellation and progress reporting
    ///
    /// The first classifier error stops the remaining workers before their
    /// next page and is returned; no partial verdicts are produced.
    pub fn dispatch_with<C>(
        &self,
        pages: Vec<Page>,
        classifier: &C,
        cancel: &CancellationToken,
        progress: &dyn ProgressCallback,
    ) -> Result<DispatchReport>
    where
        C: PageClassifier + ?Sized,
    {
        if pages.is_empty() {
            return Err(OrientError::InvalidInput(
                "document has no pages".to_string(),
            ));
        }

        let total = pages.len();
        let workers = worker_count(self.options.effective_parallelism(), total);
        info!(pages = total, workers, "dispatching pages");
        progress.on_stage_start(ProcessingStage::Detecting, total);

        let queue = WorkQueue::load(pages);
        let results = ResultMap::with_capacity(total);
        let abort = CancellationToken::new();
        let completed = AtomicUsize::new(0);
        let shared = Shared {
            queue: &queue,
            results: &results,
            classifier,
            cancel,
            abort: &abort,
            progress,
            completed: &completed,
            total,
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("orient-worker-{}", i))
            .build()
            .map_err(|e| std::io::Error::other(format!("failed to start worker pool: {}", e)))?;

        // Join barrier: install returns once every worker loop has returned
        let outcomes: Vec<Result<usize>> = pool.install(|| {
            (0..workers)
                .into_par_iter()
                .with_max_len(1)
                .map(|worker_id| shared.run_worker(worker_id))
                .collect()
        });

        if let Some(err) = outcomes.into_iter().find_map(|outcome| outcome.err()) {
            return Err(err);
        }
        if cancel.is_cancelled() {
            warn!(completed = completed.load(Ordering::SeqCst), total, "dispatch cancelled");
            return Err(OrientError::Cancelled);
        }

        let verdicts = results.into_ordered(total)?;
        Ok(DispatchReport { verdicts, workers })
    }
}
