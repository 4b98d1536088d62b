// SPDX-License-Identifier: GPL-3.0-only

//! Recognition scheduling and overlay drawing
//!
//! On sampling ticks the annotator shrinks the frame, runs the recognizer on
//! it and names the detections against the reference set. On every tick,
//! sampled or not, the cached regions are scaled back to full resolution and
//! drawn as a box plus a filled name plate onto a copy of the frame.

pub mod font;

use image::{Rgb, RgbImage};
use std::time::Instant;
use tracing::{debug, trace};

use crate::constants::overlay;
use crate::frame::Frame;
use crate::recognition::{BoundingBox, RecognitionResult, Recognizer, ReferenceSet, Region};

/// Pixel rectangle of a label plate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlateGeometry {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    /// Extension beyond the box on each side
    pub margin: i32,
}

impl PlateGeometry {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }
}

/// Horizontal plate extension for a box of `box_width` pixels.
///
/// The plate needs `chars * char_width_px` pixels. If that is wider than the
/// box the plate grows by half the difference on each side, otherwise it
/// overhangs by a fixed minimal margin.
pub fn plate_margin(box_width: i32, label: &str, char_width_px: f32) -> i32 {
    let plate_width = (label.chars().count() as f32 * char_width_px) as i32;
    if box_width < plate_width {
        (plate_width - box_width) / 2
    } else {
        overlay::MIN_PLATE_MARGIN
    }
}

/// Plate drawn under `bbox` (full-resolution coordinates)
pub fn plate_geometry(bbox: &BoundingBox, label: &str, char_width_px: f32) -> PlateGeometry {
    let margin = plate_margin(bbox.width(), label, char_width_px);
    PlateGeometry {
        left: bbox.left - margin,
        top: bbox.bottom,
        right: bbox.right + margin,
        bottom: bbox.bottom + overlay::PLATE_HEIGHT,
        margin,
    }
}

pub struct Annotator {
    recognizer: Box<dyn Recognizer>,
    references: ReferenceSet,
    resize_divisor: u32,
    char_width_px: f32,
    cached: RecognitionResult,
    recognitions: u64,
}

impl Annotator {
    pub fn new(
        recognizer: Box<dyn Recognizer>,
        references: ReferenceSet,
        resize_divisor: u32,
        char_width_px: f32,
    ) -> Self {
        Self {
            recognizer,
            references,
            resize_divisor: resize_divisor.max(1),
            char_width_px,
            cached: RecognitionResult::default(),
            recognitions: 0,
        }
    }

    /// Annotate one frame. When `sample` is set the cached result is replaced
    /// by a fresh recognition pass first.
    pub fn annotate(&mut self, frame: &Frame, sample: bool) -> Frame {
        if sample {
            self.recognize(frame);
        }
        self.draw(frame)
    }

    fn recognize(&mut self, frame: &Frame) {
        let start = Instant::now();
        let small = frame.downscale(self.resize_divisor);
        let detections = self.recognizer.detect_regions(&small);
        let detect_time = start.elapsed();

        self.cached = RecognitionResult::classify(detections, &self.references);
        self.recognitions += 1;

        debug!(
            regions = self.cached.regions.len(),
            detect_ms = detect_time.as_millis(),
            total_ms = start.elapsed().as_millis(),
            "Recognition pass complete"
        );
    }

    fn draw(&self, frame: &Frame) -> Frame {
        if self.cached.is_empty() {
            return frame.clone();
        }

        let mut image = frame.to_rgb_image();
        for region in &self.cached.regions {
            self.draw_region(&mut image, region);
        }
        trace!(regions = self.cached.regions.len(), "Overlays drawn");
        frame.derive(image)
    }

    fn draw_region(&self, image: &mut RgbImage, region: &Region) {
        let bbox = region.bbox.scaled(self.resize_divisor);
        let label = region.label.as_str();
        let plate = plate_geometry(&bbox, label, self.char_width_px);
        let box_color = Rgb(overlay::BOX_COLOR);

        draw_rectangle(image, &bbox, overlay::BOX_THICKNESS, box_color);
        fill_rect(image, plate.left, plate.top, plate.right, plate.bottom, box_color);

        let scale = ((self.char_width_px / font::GLYPH_ADVANCE as f32) as i32).max(1);
        font::draw_text(
            image,
            plate.left + overlay::TEXT_INSET_X,
            plate.top + overlay::TEXT_OFFSET_Y,
            label,
            scale,
            Rgb(overlay::TEXT_COLOR),
        );
    }

    /// Regions drawn on every frame until the next sampling tick
    pub fn last_result(&self) -> &RecognitionResult {
        &self.cached
    }

    /// Recognition passes run so far
    pub fn recognitions(&self) -> u64 {
        self.recognitions
    }

    pub fn resize_divisor(&self) -> u32 {
        self.resize_divisor
    }
}

fn draw_rectangle(image: &mut RgbImage, bbox: &BoundingBox, thickness: i32, color: Rgb<u8>) {
    let t = thickness.max(1);
    // Lines are centred on the box edges
    let half = t / 2;
    fill_rect(image, bbox.left - half, bbox.top - half, bbox.right + half, bbox.top - half + t - 1, color);
    fill_rect(image, bbox.left - half, bbox.bottom - half, bbox.right + half, bbox.bottom - half + t - 1, color);
    fill_rect(image, bbox.left - half, bbox.top - half, bbox.left - half + t - 1, bbox.bottom + half, color);
    fill_rect(image, bbox.right - half, bbox.top - half, bbox.right - half + t - 1, bbox.bottom + half, color);
}

/// Fill the inclusive rectangle, skipping pixels outside the image
fn fill_rect(image: &mut RgbImage, left: i32, top: i32, right: i32, bottom: i32, color: Rgb<u8>) {
    let width = image.width() as i32;
    let height = image.height() as i32;
    if width == 0 || height == 0 {
        return;
    }
    let left = left.max(0);
    let top = top.max(0);
    let right = right.min(width - 1);
    let bottom = bottom.min(height - 1);

    for y in top..=bottom {
        for x in left..=right {
            image.put_pixel(x as u32, y as u32, color);
        }
    }
}
