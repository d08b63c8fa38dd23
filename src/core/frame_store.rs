//! Frame store - fixed-length sequence of asynchronously loaded frames
//!
//! **Why**: The tunnel is scrubbed by scroll position, so any frame may be
//! requested at any time, long before the whole sequence is decoded. The
//! store answers `resolve(progress)` immediately with whatever is loaded.
//!
//! **Used by**: Scroll binder (resolve on every progress update), app glue
//! (begin_load at startup, pump once per tick)
//!
//! # Slot Lifecycle
//!
//! Each slot goes `Pending -> Ready` or `Pending -> Failed` exactly once.
//! A failed decode never aborts the batch; it only makes the slot absent
//! from `resolve()`.
//!
//! # Threading
//!
//! Decoding runs on `Workers`. Results come back over a channel and are
//! applied by `pump()` on the owning thread, so slots are plain fields with
//! no locking. Settlement order is unspecified; only the aggregate
//! "all settled" signal is ordered.
//!
//! # Fallback
//!
//! If the requested slot is not Ready, `resolve()` returns slot 0 when it is
//! Ready, otherwise nothing. Always slot 0, never "last good frame".

use crossbeam_channel::{Receiver, RecvTimeoutError, unbounded};
use log::{debug, info, trace, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use super::fetch::{FrameFetcher, FrameTemplate};
use super::workers::Workers;
use crate::config::ConfigError;
use crate::entities::frame::{Frame, FrameLoadError};

/// Fraction of a frame below an integer index still treated as that index
const BOUNDARY_EPSILON: f32 = 1e-3;

/// Slot loading state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Pending, // Fetch issued (or not yet issued), no result yet
    Ready,   // Decoded image available
    Failed,  // Fetch or decode failed, image absent
}

/// One position in the sequence
#[derive(Debug, Clone)]
pub struct FrameSlot {
    state: SlotState,
    image: Option<Frame>,
}

impl FrameSlot {
    fn pending() -> Self {
        Self {
            state: SlotState::Pending,
            image: None,
        }
    }

    pub fn state(&self) -> SlotState {
        self.state
    }

    pub fn image(&self) -> Option<&Frame> {
        self.image.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.state == SlotState::Ready
    }

    /// Apply a fetch result. Returns false if the slot already settled.
    fn settle(&mut self, result: Result<Frame, FrameLoadError>) -> bool {
        if self.state != SlotState::Pending {
            return false;
        }
        match result {
            Ok(frame) => {
                self.state = SlotState::Ready;
                self.image = Some(frame);
            }
            Err(_) => {
                self.state = SlotState::Failed;
                self.image = None;
            }
        }
        true
    }
}

/// Normalized scroll position and the frame index it maps to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackCursor {
    progress: f32,
}

impl PlaybackCursor {
    /// Clamp to [0,1]; NaN maps to 0
    pub fn new(progress: f32) -> Self {
        let progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        Self { progress }
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// `floor(progress * (total - 1))`, clamped to `[0, total - 1]`
    ///
    /// Progress that lands on a frame boundary (e.g. `k / (total - 1)`)
    /// selects frame `k` even when f32 rounding puts the product a hair
    /// below the integer.
    pub fn frame_index(&self, total_frames: usize) -> usize {
        if total_frames <= 1 {
            return 0;
        }
        let last = total_frames - 1;
        let scaled = self.progress * last as f32;
        let index = (scaled + BOUNDARY_EPSILON).floor() as usize;
        index.min(last)
    }
}

/// Aggregate result handed to the "all settled" callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub total: usize,
    pub ready: usize,
    pub failed: usize,
}

/// Callback fired once every slot has settled
pub type OnAllSettled = Box<dyn FnOnce(&LoadSummary)>;

/// One fetch result travelling back to the owner thread
struct Settlement {
    index: usize,
    result: Result<Frame, FrameLoadError>,
}

/// State shared between the store and the handles it gives out
#[derive(Debug)]
struct LoadShared {
    total: usize,
    settled: AtomicUsize,
    cancelled: AtomicBool,
}

/// Cancellation-aware handle to an in-flight batch load
///
/// Cloneable; every clone observes the same settlement count. Cancelling
/// skips fetches that have not started and makes the store ignore results
/// that arrive afterwards.
#[derive(Debug, Clone)]
pub struct LoadHandle {
    shared: Arc<LoadShared>,
}

impl LoadHandle {
    pub fn cancel(&self) {
        if !self.shared.cancelled.swap(true, Ordering::SeqCst) {
            debug!(
                "Frame load cancelled ({}/{} settled)",
                self.settled(),
                self.total()
            );
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::SeqCst)
    }

    /// Slots settled so far (as applied by `pump`)
    pub fn settled(&self) -> usize {
        self.shared.settled.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.shared.total
    }

    pub fn is_complete(&self) -> bool {
        self.settled() == self.total()
    }
}

/// Batch load bookkeeping owned by the sequence
struct ActiveLoad {
    rx: Receiver<Settlement>,
    handle: LoadHandle,
    on_all_settled: Option<OnAllSettled>,
}

/// Ordered, fixed-length frame sequence
pub struct FrameSequence {
    template: FrameTemplate,
    frames: Vec<FrameSlot>,
    load: Option<ActiveLoad>,
}

impl std::fmt::Debug for FrameSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSequence")
            .field("template", &self.template)
            .field("total_frames", &self.frames.len())
            .field("ready", &self.ready_count())
            .field("loading", &self.load.is_some())
            .finish()
    }
}

impl FrameSequence {
    /// Allocate `total_frames` Pending slots
    ///
    /// # Errors
    ///
    /// `ConfigError::TotalFrames` if `total_frames < 1`
    pub fn new(total_frames: usize, template: FrameTemplate) -> Result<Self, ConfigError> {
        if total_frames < 1 {
            return Err(ConfigError::TotalFrames(total_frames));
        }

        Ok(Self {
            template,
            frames: (0..total_frames).map(|_| FrameSlot::pending()).collect(),
            load: None,
        })
    }

    pub fn total_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn slot(&self, index: usize) -> Option<&FrameSlot> {
        self.frames.get(index)
    }

    pub fn slots(&self) -> &[FrameSlot] {
        &self.frames
    }

    pub fn ready_count(&self) -> usize {
        self.frames.iter().filter(|s| s.state == SlotState::Ready).count()
    }

    pub fn failed_count(&self) -> usize {
        self.frames.iter().filter(|s| s.state == SlotState::Failed).count()
    }

    /// Number of slots no longer Pending
    pub fn settled_count(&self) -> usize {
        self.frames.iter().filter(|s| s.state != SlotState::Pending).count()
    }

    pub fn is_settled(&self) -> bool {
        self.settled_count() == self.frames.len()
    }

    /// Start fetching every frame on the worker pool
    ///
    /// `on_all_settled` runs exactly once, from `pump()`, after every slot is
    /// Ready or Failed. A sequence loads once: a second call logs a warning,
    /// drops the new callback and returns the existing handle.
    pub fn begin_load<F>(
        &mut self,
        workers: &Workers,
        fetcher: Arc<dyn FrameFetcher>,
        on_all_settled: F,
    ) -> LoadHandle
    where
        F: FnOnce(&LoadSummary) + 'static,
    {
        if let Some(load) = &self.load {
            warn!("FrameSequence: load already started, ignoring second begin_load");
            return load.handle.clone();
        }

        let total = self.frames.len();
        info!(
            "FrameSequence: starting load of {} frames from {}",
            total,
            self.template.pattern()
        );

        let (tx, rx) = unbounded();
        let handle = LoadHandle {
            shared: Arc::new(LoadShared {
                total,
                settled: AtomicUsize::new(0),
                cancelled: AtomicBool::new(false),
            }),
        };

        for index in 0..total {
            let path = self.template.path(index + 1);
            let fetcher = Arc::clone(&fetcher);
            let token = handle.clone();
            let tx = tx.clone();

            workers.execute(move || {
                if token.is_cancelled() {
                    return;
                }
                let result = fetcher.fetch(index, &path);
                if let Err(e) = &result {
                    warn!("FrameSequence: failed to load frame {}: {}", index + 1, e);
                }
                // Receiver is gone after teardown; nothing to report to
                let _ = tx.send(Settlement { index, result });
            });
        }

        self.load = Some(ActiveLoad {
            rx,
            handle: handle.clone(),
            on_all_settled: Some(Box::new(on_all_settled)),
        });

        handle
    }

    /// Apply queued settlements on the calling (owner) thread
    ///
    /// Non-blocking. Returns the summary if the batch completed during this
    /// call (the same moment `on_all_settled` fires), otherwise `None`.
    pub fn pump(&mut self) -> Option<LoadSummary> {
        let Some(load) = self.load.as_ref() else {
            return None;
        };
        let pending: Vec<Settlement> = load.rx.try_iter().collect();
        self.apply(pending)
    }

    /// Block until every slot settles or `timeout` expires
    ///
    /// Returns true if the batch is complete. Used by headless rendering
    /// and tests; the interactive loop uses `pump()`.
    pub fn wait_settled(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;

        loop {
            self.pump();
            let Some(load) = self.load.as_ref() else {
                return false;
            };
            if load.handle.is_complete() {
                return true;
            }
            if load.handle.is_cancelled() {
                return false;
            }

            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            match load.rx.recv_timeout(deadline - now) {
                Ok(settlement) => {
                    self.apply(vec![settlement]);
                }
                Err(RecvTimeoutError::Timeout) => return false,
                Err(RecvTimeoutError::Disconnected) => return self.is_settled(),
            }
        }
    }

    fn apply(&mut self, settlements: Vec<Settlement>) -> Option<LoadSummary> {
        let load = self.load.as_mut()?;

        if load.handle.is_cancelled() {
            if !settlements.is_empty() {
                trace!(
                    "FrameSequence: dropping {} settlements after cancel",
                    settlements.len()
                );
            }
            return None;
        }

        for Settlement { index, result } in settlements {
            let Some(slot) = self.frames.get_mut(index) else {
                continue;
            };
            if slot.settle(result) {
                load.handle.shared.settled.fetch_add(1, Ordering::SeqCst);
            }
        }

        if load.handle.is_complete()
            && let Some(callback) = load.on_all_settled.take()
        {
            let summary = LoadSummary {
                total: self.frames.len(),
                ready: self.frames.iter().filter(|s| s.state == SlotState::Ready).count(),
                failed: self.frames.iter().filter(|s| s.state == SlotState::Failed).count(),
            };
            info!(
                "FrameSequence: all frames settled ({} ready, {} failed)",
                summary.ready, summary.failed
            );
            callback(&summary);
            return Some(summary);
        }

        None
    }

    /// Image for a scroll progress value, with slot-0 fallback
    pub fn resolve(&self, progress: f32) -> Option<&Frame> {
        let index = PlaybackCursor::new(progress).frame_index(self.frames.len());

        let slot = &self.frames[index];
        if slot.is_ready() {
            return slot.image();
        }

        let first = &self.frames[0];
        if first.is_ready() { first.image() } else { None }
    }

    /// Stop consuming results; queued fetches are skipped
    pub fn cancel_load(&self) {
        if let Some(load) = &self.load {
            load.handle.cancel();
        }
    }
}

impl Drop for FrameSequence {
    fn drop(&mut self) {
        self.cancel_load();
    }
}
