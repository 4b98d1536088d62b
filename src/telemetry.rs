// SPDX-License-Identifier: GPL-3.0-only

//! Throughput counters and the stale-frame advisory

use std::time::Instant;
use tracing::warn;

/// Tracks occurrences of an event and reports them per second since start
///
/// The caller must increment the count.
#[derive(Debug, Clone)]
pub struct CountsPerSec {
    start_time: Instant,
    occurrences: u64,
}

impl CountsPerSec {
    pub fn start() -> Self {
        Self::start_at(Instant::now())
    }

    pub fn start_at(start_time: Instant) -> Self {
        Self {
            start_time,
            occurrences: 0,
        }
    }

    pub fn increment(&mut self) {
        self.occurrences += 1;
    }

    pub fn occurrences(&self) -> u64 {
        self.occurrences
    }

    pub fn counts_per_sec(&self) -> f64 {
        self.counts_per_sec_at(Instant::now())
    }

    /// Rate as of `now`; 0 when no time has elapsed
    pub fn counts_per_sec_at(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.start_time).as_secs_f64();
        if elapsed > 0.0 {
            self.occurrences as f64 / elapsed
        } else {
            0.0
        }
    }
}

/// Instantaneous loop rate from the gap between consecutive ticks
#[derive(Debug, Clone)]
pub struct LoopRate {
    last_tick: Instant,
    last_fps: f64,
}

impl LoopRate {
    pub fn start() -> Self {
        Self::start_at(Instant::now())
    }

    pub fn start_at(last_tick: Instant) -> Self {
        Self {
            last_tick,
            last_fps: 0.0,
        }
    }

    /// Record a tick and return the rate implied by the gap since the last one
    pub fn tick(&mut self) -> f64 {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> f64 {
        let gap = now.saturating_duration_since(self.last_tick);
        self.last_fps = if gap.is_zero() {
            0.0
        } else {
            1.0 / gap.as_secs_f64()
        };
        self.last_tick = now;
        self.last_fps
    }

    pub fn last_fps(&self) -> f64 {
        self.last_fps
    }
}

/// Warns when the latest-frame slot has not changed for too many ticks
///
/// Purely advisory: the pipeline keeps running on the old frame.
#[derive(Debug, Clone)]
pub struct StaleFrameMonitor {
    threshold: u32,
    last_generation: u64,
    unchanged: u32,
    warned: bool,
}

impl StaleFrameMonitor {
    /// A threshold of 0 disables the warning
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            last_generation: 0,
            unchanged: 0,
            warned: false,
        }
    }

    /// Feed the slot generation seen this tick. Returns `true` on the tick the
    /// warning fires.
    pub fn observe(&mut self, generation: u64) -> bool {
        if generation != self.last_generation {
            self.last_generation = generation;
            self.unchanged = 0;
            self.warned = false;
            return false;
        }

        self.unchanged = self.unchanged.saturating_add(1);
        if self.threshold > 0 && self.unchanged >= self.threshold && !self.warned {
            self.warned = true;
            warn!(
                ticks = self.unchanged,
                generation, "Source frame unchanged, capture may be stalled"
            );
            return true;
        }
        false
    }

    pub fn unchanged_ticks(&self) -> u32 {
        self.unchanged
    }
}
