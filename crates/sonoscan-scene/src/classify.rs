//! Throttled asynchronous classification.
//!
//! The segmenter is slow compared to the depth feed, so it runs on its own
//! worker thread. Requests are admitted by a [`ClassifyThrottle`]: at most
//! one pass in flight, and no new pass sooner than a minimum interval after
//! the last one was admitted. Anything else is dropped, never queued.
//!
//! ```text
//! sensor ──request()──► throttle ──bounded(1)──► worker ──► GridStore
//!                          │                       │
//!                          └──── in-flight flag ◄──┘ (cleared on completion)
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use parking_lot::Mutex;

use crate::fusion::GridStore;
use crate::grid::ClassFrame;
use crate::{Result, SceneError};

/// Produces a per-pixel class-id frame from some sensor input.
///
/// Stands in for the neural segmentation model. Implementations run on the
/// worker thread and may take as long as they need.
pub trait Segmenter: Send + 'static {
    /// What the sensor hands over for classification.
    type Input: Send + 'static;

    /// Classify one input. `None` means no usable result; the store keeps
    /// its previous class grid.
    fn segment(&mut self, input: &Self::Input) -> Option<ClassFrame>;
}

/// Admission control: one in flight, minimum spacing between admissions.
#[derive(Debug)]
pub struct ClassifyThrottle {
    min_interval: Duration,
    in_flight: AtomicBool,
    last_admitted: Mutex<Option<Instant>>,
}

impl ClassifyThrottle {
    /// A throttle admitting at most one pass per `min_interval`.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            in_flight: AtomicBool::new(false),
            last_admitted: Mutex::new(None),
        }
    }

    /// Try to admit a request at `now`. On success the in-flight flag is
    /// set and must later be cleared with [`release`](Self::release).
    pub fn try_acquire(&self, now: Instant) -> bool {
        let mut last = self.last_admitted.lock();
        if let Some(prev) = *last
            && now.saturating_duration_since(prev) < self.min_interval
        {
            return false;
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        *last = Some(now);
        true
    }

    /// Mark the in-flight pass as finished.
    pub fn release(&self) {
        self.in_flight.store(false, Ordering::Release);
    }

    /// Whether a pass is currently running.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Minimum spacing between admitted requests.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

/// Counters for the classification path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyStats {
    /// Requests admitted to the worker.
    pub admitted: u64,
    /// Requests dropped by the throttle.
    pub dropped: u64,
    /// Results written to the store.
    pub applied: u64,
    /// Results discarded (stopped, empty or malformed).
    pub discarded: u64,
}

#[derive(Debug, Default)]
struct Counters {
    admitted: AtomicU64,
    dropped: AtomicU64,
    applied: AtomicU64,
    discarded: AtomicU64,
}

struct Shared {
    throttle: ClassifyThrottle,
    running: AtomicBool,
    counters: Counters,
}

/// Background classification worker feeding a [`GridStore`].
///
/// Dropping the worker stops it and joins the thread.
pub struct ClassificationWorker<S: Segmenter> {
    shared: Arc<Shared>,
    tx: Option<Sender<S::Input>>,
    handle: Option<JoinHandle<()>>,
}

impl<S: Segmenter> ClassificationWorker<S> {
    /// Spawn the worker thread.
    pub fn spawn(segmenter: S, store: Arc<GridStore>, min_interval: Duration) -> Result<Self> {
        let shared = Arc::new(Shared {
            throttle: ClassifyThrottle::new(min_interval),
            running: AtomicBool::new(true),
            counters: Counters::default(),
        });
        let (tx, rx) = bounded::<S::Input>(1);

        let handle = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("sonoscan-classify".into())
                .spawn(move || worker_loop(segmenter, &store, &rx, &shared))
                .map_err(SceneError::Spawn)?
        };

        tracing::info!(min_interval_ms = min_interval.as_millis() as u64, "classification worker started");

        Ok(Self {
            shared,
            tx: Some(tx),
            handle: Some(handle),
        })
    }

    /// Offer an input for classification.
    ///
    /// Returns `true` when the request was admitted; `false` when it was
    /// dropped because a pass is in flight, the minimum interval has not
    /// elapsed, or the worker is stopped.
    pub fn request(&self, input: S::Input) -> bool {
        self.request_at(input, Instant::now())
    }

    /// [`request`](Self::request) with an explicit timestamp.
    pub fn request_at(&self, input: S::Input, now: Instant) -> bool {
        let Some(tx) = self.tx.as_ref() else {
            return false;
        };
        if !self.shared.running.load(Ordering::Acquire) || !self.shared.throttle.try_acquire(now) {
            self.shared.counters.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        match tx.try_send(input) {
            Ok(()) => {
                self.shared.counters.admitted.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) => {
                self.shared.throttle.release();
                self.shared.counters.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Whether a classification pass is running.
    pub fn is_busy(&self) -> bool {
        self.shared.throttle.is_in_flight()
    }

    /// Counters since spawn.
    pub fn stats(&self) -> ClassifyStats {
        let c = &self.shared.counters;
        ClassifyStats {
            admitted: c.admitted.load(Ordering::Relaxed),
            dropped: c.dropped.load(Ordering::Relaxed),
            applied: c.applied.load(Ordering::Relaxed),
            discarded: c.discarded.load(Ordering::Relaxed),
        }
    }

    /// Stop accepting requests, discard any result still in flight, and
    /// join the worker.
    pub fn stop(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        // Disconnecting the channel ends the worker's recv loop.
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("classification worker panicked");
            } else {
                tracing::info!("classification worker stopped");
            }
        }
    }
}

impl<S: Segmenter> Drop for ClassificationWorker<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop<S: Segmenter>(
    mut segmenter: S,
    store: &GridStore,
    rx: &Receiver<S::Input>,
    shared: &Shared,
) {
    while let Ok(input) = rx.recv() {
        let result = segmenter.segment(&input);
        let applied = match result {
            Some(frame) if shared.running.load(Ordering::Acquire) => {
                store.ingest_classification_frame(&frame.as_image())
            }
            Some(_) => {
                tracing::debug!("discarding classification result after stop");
                false
            }
            None => false,
        };
        let counter = if applied {
            &shared.counters.applied
        } else {
            &shared.counters.discarded
        };
        counter.fetch_add(1, Ordering::Relaxed);
        shared.throttle.release();
    }
}
