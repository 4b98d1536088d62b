// SPDX-License-Identifier: GPL-3.0-only

//! Frame sources
//!
//! A source is opened by constructing it (failing with
//! [`SourceError::NotFound`] when the target does not exist) and then polled
//! with [`FrameSource::capture`]. The acquisition worker owns the source for
//! its whole run and closes it on exit.

pub mod image_dir;
pub mod synthetic;

pub use image_dir::{ImageDirSource, list_targets};
pub use synthetic::{SourceHandle, SyntheticSource};

use crate::errors::SourceError;
use crate::frame::Frame;

/// A point in frame or screen pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

pub trait FrameSource: Send {
    /// Human-readable target name for logging
    fn name(&self) -> &str;

    /// Grab the most recent frame.
    ///
    /// `SourceError::NotFound` means the target has gone away and the source
    /// will not recover.
    fn capture(&mut self) -> Result<Frame, SourceError>;

    /// Map a pixel of a captured frame to a position on screen.
    ///
    /// The offset is fixed when the source is opened; if the target moves
    /// afterwards the result is stale.
    fn translate_to_screen(&self, local: Point) -> Point;

    /// Release the target. Later captures fail with `SourceError::Closed`.
    fn close(&mut self);
}
