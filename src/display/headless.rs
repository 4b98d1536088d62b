// SPDX-License-Identifier: GPL-3.0-only

//! Display surface that renders nowhere
//!
//! Counts and records what it is shown. With a frame limit it asks to stop
//! once that many frames have been presented, which makes bounded headless
//! runs possible.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

use super::DisplaySurface;
use crate::errors::DisplayError;
use crate::frame::Frame;

#[derive(Default)]
pub struct HeadlessSurface {
    presented: Arc<AtomicU64>,
    sequences: Option<Arc<Mutex<Vec<u64>>>>,
    last_status: Arc<Mutex<Option<String>>>,
    frame_limit: Option<u64>,
    released: Arc<AtomicBool>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request stop after `limit` presented frames
    pub fn with_frame_limit(mut self, limit: u64) -> Self {
        self.frame_limit = Some(limit);
        self
    }

    /// Keep the sequence number of every presented frame
    pub fn with_recorder(mut self) -> Self {
        self.sequences = Some(Arc::new(Mutex::new(Vec::new())));
        self
    }

    pub fn presented_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.presented)
    }

    /// Recorded sequences, if recording was enabled
    pub fn recorded(&self) -> Option<Arc<Mutex<Vec<u64>>>> {
        self.sequences.clone()
    }

    /// Most recent status line shown
    pub fn last_status(&self) -> Arc<Mutex<Option<String>>> {
        Arc::clone(&self.last_status)
    }

    pub fn released_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.released)
    }
}

impl DisplaySurface for HeadlessSurface {
    fn present(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        if self.released.load(Ordering::SeqCst) {
            return Err(DisplayError::Render("surface released".to_string()));
        }
        if let Some(sequences) = &self.sequences
            && let Ok(mut list) = sequences.lock()
        {
            list.push(frame.sequence);
        }
        self.presented.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn show_status(&mut self, message: &str) -> Result<(), DisplayError> {
        if self.released.load(Ordering::SeqCst) {
            return Err(DisplayError::Render("surface released".to_string()));
        }
        if let Ok(mut status) = self.last_status.lock() {
            *status = Some(message.to_string());
        }
        Ok(())
    }

    fn poll_stop(&mut self) -> Result<bool, DisplayError> {
        Ok(self
            .frame_limit
            .is_some_and(|limit| self.presented.load(Ordering::SeqCst) >= limit))
    }

    fn release(&mut self) {
        if !self.released.swap(true, Ordering::SeqCst) {
            debug!(presented = self.presented.load(Ordering::SeqCst), "Headless surface released");
        }
    }
}
