// SPDX-License-Identifier: GPL-3.0-only

//! Recognition types and the boundary to the detector
//!
//! The detector itself is an external collaborator: anything that turns a
//! frame into bounding boxes with feature vectors can implement
//! [`Recognizer`]. Naming the detections is done here, against a
//! [`ReferenceSet`].

pub mod reference;

pub use reference::ReferenceSet;

use std::fmt;

use crate::constants::UNKNOWN_LABEL;
use crate::frame::Frame;

/// Pixel bounding box, edges inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl BoundingBox {
    pub fn new(top: i32, right: i32, bottom: i32, left: i32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Map a box found on a downscaled frame back to full resolution.
    /// Coordinates saturate at the `i32` range.
    pub fn scaled(&self, factor: u32) -> Self {
        let f = i32::try_from(factor.max(1)).unwrap_or(i32::MAX);
        Self {
            top: self.top.saturating_mul(f),
            right: self.right.saturating_mul(f),
            bottom: self.bottom.saturating_mul(f),
            left: self.left.saturating_mul(f),
        }
    }
}

/// One raw detection: where, plus the feature vector describing it
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub features: Vec<f32>,
}

/// Name assigned to a region
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Label {
    Named(String),
    Unknown,
}

impl Label {
    pub fn as_str(&self) -> &str {
        match self {
            Label::Named(name) => name,
            Label::Unknown => UNKNOWN_LABEL,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Label::Named(name) => Some(name),
            Label::Unknown => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A labelled box, in the coordinates of the frame recognition ran on
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub bbox: BoundingBox,
    pub label: Label,
}

/// Outcome of one recognition pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecognitionResult {
    pub regions: Vec<Region>,
}

impl RecognitionResult {
    /// Name every detection against the reference set
    pub fn classify(detections: Vec<Detection>, references: &ReferenceSet) -> Self {
        let regions = detections
            .into_iter()
            .map(|detection| Region {
                label: references.classify(&detection.features),
                bbox: detection.bbox,
            })
            .collect();
        Self { regions }
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Names of the recognised (non-unknown) regions
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().filter_map(|r| r.label.name())
    }
}

/// Finds regions of interest in a frame
pub trait Recognizer: Send {
    fn detect_regions(&mut self, frame: &Frame) -> Vec<Detection>;
}

/// Recognizer that never finds anything
///
/// Used when no detector is wired in; the pipeline then only relays frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRecognizer;

impl Recognizer for NullRecognizer {
    fn detect_regions(&mut self, _frame: &Frame) -> Vec<Detection> {
        Vec::new()
    }
}
