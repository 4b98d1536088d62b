// SPDX-License-Identifier: GPL-3.0-only

//! Generated test-pattern source
//!
//! Produces a gradient with a vertical bar sweeping across it, so successive
//! frames differ. The target's lifetime is controlled through a
//! [`SourceHandle`], which another thread can invalidate to simulate the
//! captured window disappearing.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{FrameSource, Point};
use crate::errors::SourceError;
use crate::frame::{CHANNELS, Frame};

/// Shared validity of a synthetic target
#[derive(Debug, Clone)]
pub struct SourceHandle {
    valid: Arc<AtomicBool>,
}

impl SourceHandle {
    pub fn new() -> Self {
        Self {
            valid: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Make the target disappear
    pub fn invalidate(&self) {
        self.valid.store(false, Ordering::SeqCst);
    }

    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::SeqCst)
    }
}

impl Default for SourceHandle {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SyntheticSource {
    width: u32,
    height: u32,
    handle: SourceHandle,
    phase: u32,
    closed: bool,
}

impl SyntheticSource {
    pub fn open(width: u32, height: u32, handle: SourceHandle) -> Result<Self, SourceError> {
        if !handle.is_valid() {
            return Err(SourceError::NotFound("synthetic".to_string()));
        }
        Ok(Self {
            width: width.max(1),
            height: height.max(1),
            handle,
            phase: 0,
            closed: false,
        })
    }

    fn render(&self) -> Vec<u8> {
        let bar_x = self.phase % self.width;
        let mut data = Vec::with_capacity(self.width as usize * self.height as usize * CHANNELS);
        for y in 0..self.height {
            for x in 0..self.width {
                if x == bar_x {
                    data.extend_from_slice(&[255, 255, 255]);
                } else {
                    let r = (x * 255 / self.width) as u8;
                    let g = (y * 255 / self.height) as u8;
                    data.extend_from_slice(&[r, g, 96]);
                }
            }
        }
        data
    }
}

impl FrameSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn capture(&mut self) -> Result<Frame, SourceError> {
        if self.closed {
            return Err(SourceError::Closed);
        }
        if !self.handle.is_valid() {
            return Err(SourceError::NotFound("synthetic".to_string()));
        }
        let data = self.render();
        self.phase = self.phase.wrapping_add(1);
        Frame::new(self.width, self.height, data)
            .ok_or_else(|| SourceError::Decode("pattern size mismatch".to_string()))
    }

    fn translate_to_screen(&self, local: Point) -> Point {
        local
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
