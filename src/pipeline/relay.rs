// SPDX-License-Identifier: GPL-3.0-only

//! Relay queue between the annotating driver and the display
//!
//! Annotated frames accumulate until the queue holds `fill_threshold` of them.
//! At that point the buffering gate opens, exactly once, and a pop worker
//! starts releasing one frame per tick in push order. The gate never closes
//! again: once playback starts the queue only drains at display pace.
//!
//! The queue itself is a `crossbeam_channel` so push and pop are safe from
//! different threads; the gate and stop flags are atomics.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, info, warn};

use super::worker::{LoopAction, RunState, WorkerController};
use crate::frame::Frame;

pub struct RelayQueue {
    sender: Sender<Frame>,
    receiver: Receiver<Frame>,
    fill_threshold: usize,
    buffering: AtomicBool,
    pop_started: AtomicBool,
    /// Frame most recently released to the display
    current: ArcSwapOption<Frame>,
    popped: AtomicU64,
    run: RunState,
}

impl RelayQueue {
    pub fn new(fill_threshold: usize) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            sender,
            receiver,
            fill_threshold,
            buffering: AtomicBool::new(true),
            pop_started: AtomicBool::new(false),
            current: ArcSwapOption::empty(),
            popped: AtomicU64::new(0),
            run: RunState::new(),
        }
    }

    /// Append a frame. Never blocks and never rejects.
    pub fn push(&self, frame: Frame) {
        // The receiver lives as long as self, so send cannot fail
        if self.sender.send(frame).is_err() {
            warn!("Relay queue receiver disconnected, frame dropped");
        }
    }

    /// Frames currently waiting in the queue
    pub fn size(&self) -> usize {
        self.receiver.len()
    }

    pub fn fill_threshold(&self) -> usize {
        self.fill_threshold
    }

    pub fn is_buffering(&self) -> bool {
        self.buffering.load(Ordering::SeqCst)
    }

    /// Flip the gate from buffering to streaming.
    ///
    /// Returns `true` only for the call that performed the transition.
    pub fn try_open_gate(&self) -> bool {
        let opened = self
            .buffering
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if opened {
            info!(queued = self.size(), threshold = self.fill_threshold, "Buffering complete");
        }
        opened
    }

    /// Open the gate if the fill threshold has been reached.
    ///
    /// Returns `true` exactly once over the queue's lifetime.
    pub fn check_gate(&self) -> bool {
        self.is_buffering() && self.size() >= self.fill_threshold && self.try_open_gate()
    }

    /// Release the oldest frame, if the gate is open and one is queued.
    ///
    /// The released frame also becomes the current output.
    pub fn try_pop(&self) -> Option<Arc<Frame>> {
        if self.is_buffering() {
            return None;
        }
        let frame = Arc::new(self.receiver.try_recv().ok()?);
        self.current.store(Some(Arc::clone(&frame)));
        self.popped.fetch_add(1, Ordering::Relaxed);
        Some(frame)
    }

    /// Frame the display should show, if playback has produced one
    pub fn current_output(&self) -> Option<Arc<Frame>> {
        self.current.load_full()
    }

    /// Frames released since the gate opened
    pub fn popped_count(&self) -> u64 {
        self.popped.load(Ordering::Relaxed)
    }

    /// Spawn the pop worker, releasing one frame every `tick`.
    ///
    /// Only the first call starts a worker; later calls return `None`.
    pub fn start_pop(self: &Arc<Self>, tick: Duration) -> Option<WorkerController> {
        if self.pop_started.swap(true, Ordering::SeqCst) {
            warn!("Relay pop worker already started");
            return None;
        }

        let queue = Arc::clone(self);
        Some(WorkerController::start(
            "relay-pop",
            self.run.clone(),
            tick,
            move || {
                if let Some(frame) = queue.try_pop() {
                    debug!(sequence = frame.sequence, remaining = queue.size(), "Popped frame");
                }
                LoopAction::Continue
            },
        ))
    }

    /// Stop the pop worker (if any) and mark the queue stopped
    pub fn stop(&self) {
        self.run.stop();
    }

    pub fn is_stopped(&self) -> bool {
        self.run.is_stopped()
    }

    pub fn run_state(&self) -> &RunState {
        &self.run
    }
}
