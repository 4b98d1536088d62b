// SPDX-License-Identifier: GPL-3.0-only

//! Latest-frame slot between the acquisition worker and the driver
//!
//! Single writer, many readers, no lock. Readers may see a frame that is one
//! or more captures old, but never a partially written one: publishing swaps
//! a whole `Arc<Frame>`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;

use crate::frame::Frame;

pub struct SharedFrameSlot {
    latest: ArcSwap<Frame>,
    generation: AtomicU64,
}

impl SharedFrameSlot {
    /// Create a slot primed with an initial frame
    pub fn new(initial: Frame) -> Self {
        Self {
            latest: ArcSwap::from_pointee(initial),
            generation: AtomicU64::new(0),
        }
    }

    /// Replace the current frame. Older frames are dropped once no reader
    /// holds them.
    pub fn publish(&self, frame: Frame) {
        self.latest.store(Arc::new(frame));
        self.generation.fetch_add(1, Ordering::Release);
    }

    /// Most recently published frame
    pub fn latest(&self) -> Arc<Frame> {
        self.latest.load_full()
    }

    /// Number of publishes since creation
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}
