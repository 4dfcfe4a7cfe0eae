//! Background training with a snapshot-and-handoff protocol
//!
//! ## Protocol
//!
//! ```text
//! owner thread                         worker thread
//! ------------                         -------------
//! snapshot = table.clone()
//! spawn(snapshot, Weak<Handoff>)  -->  tree = train(&snapshot)
//! ... keeps mutating the table,        upgrade Weak
//!     evaluating the old tree ...        ok:   store result, raise `ready`
//!                                        gone: log and drop the result
//! poll() sees `ready`
//!   take result, swap trees
//! ```
//!
//! The worker never touches the owner's tree. The owner swaps the finished
//! tree in with a plain assignment under its own `&mut self`, so readers
//! see the old complete tree or the new complete tree and never a partial
//! one.
//!
//! The worker only holds a [`Weak`] reference to the handoff cell. If the
//! owner is dropped while training runs, the upgrade fails on completion and
//! the result is discarded instead of being delivered to nobody.
//!
//! There is no cancellation and no timeout: a launched run always finishes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use ldtree_core::Table;
use log::{debug, warn};

use crate::trainer;
use crate::tree::DecisionTree;
use crate::{MLError, MLResult};

/// Cell the worker publishes its result into
#[derive(Debug, Default)]
struct Handoff {
    result: Mutex<Option<MLResult<DecisionTree>>>,
    ready: AtomicBool,
}

impl Handoff {
    fn publish(&self, result: MLResult<DecisionTree>) {
        let mut slot = self.result.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(result);
        self.ready.store(true, Ordering::Release);
    }

    fn take(&self) -> Option<MLResult<DecisionTree>> {
        self.result
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }
}

/// One in-flight background training run
#[derive(Debug)]
pub struct TrainingJob {
    handoff: Arc<Handoff>,
    worker: Option<JoinHandle<()>>,
    started: Instant,
    samples: u32,
}

impl TrainingJob {
    /// Start training on a frozen copy of `snapshot`
    ///
    /// The schema is checked before a thread is spawned, so an unusable
    /// table fails here without starting anything.
    pub fn spawn(snapshot: Table) -> MLResult<Self> {
        let columns = snapshot.column_count();
        if columns < 2 {
            return Err(MLError::InsufficientSchema { columns });
        }

        let samples = snapshot.total_row_count();
        let handoff = Arc::new(Handoff::default());
        let weak: Weak<Handoff> = Arc::downgrade(&handoff);

        let worker = thread::Builder::new()
            .name("ldtree-train".into())
            .spawn(move || {
                let result = trainer::train(&snapshot);
                match weak.upgrade() {
                    Some(handoff) => handoff.publish(result),
                    None => warn!("Training finished after its owner was dropped; discarding result"),
                }
            })?;

        debug!("Background training started on {} samples", samples);
        Ok(Self {
            handoff,
            worker: Some(worker),
            started: Instant::now(),
            samples,
        })
    }

    /// Whether the worker has stopped, so [`poll`](Self::poll) will not block
    ///
    /// True once a result is published, and also when the worker died
    /// without publishing one.
    pub fn is_finished(&self) -> bool {
        self.is_published()
            || self.worker.as_ref().map_or(true, |worker| worker.is_finished())
    }

    fn is_published(&self) -> bool {
        self.handoff.ready.load(Ordering::Acquire)
    }

    /// Time since launch
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Logical sample count of the snapshot being trained on
    pub fn samples(&self) -> u32 {
        self.samples
    }

    /// Non-blocking completion check
    ///
    /// `WouldBlock` while the worker runs. Once it finishes, yields the
    /// trained tree or the training error. A worker that died without
    /// publishing reports [`MLError::WorkerPanicked`].
    pub fn poll(&mut self) -> nb::Result<DecisionTree, MLError> {
        if !self.is_published() {
            let died = self.worker.as_ref().is_some_and(|worker| worker.is_finished());
            if !died {
                return Err(nb::Error::WouldBlock);
            }
            // Finished without raising `ready`: re-check, then treat as a panic
            if !self.is_published() {
                self.join();
                return Err(nb::Error::Other(MLError::WorkerPanicked));
            }
        }

        self.join();
        self.take_result().map_err(nb::Error::Other)
    }

    /// Block until the worker finishes and return its result
    pub fn wait(mut self) -> MLResult<DecisionTree> {
        self.join();
        self.take_result()
    }

    fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Training worker panicked");
            }
        }
    }

    fn take_result(&self) -> MLResult<DecisionTree> {
        let result = self.handoff.take().unwrap_or(Err(MLError::WorkerPanicked));
        match &result {
            Ok(_) => debug!(
                "Background training finished in {:?} ({} samples)",
                self.elapsed(),
                self.samples
            ),
            Err(err) => warn!("Background training failed: {}", err),
        }
        result
    }
}
