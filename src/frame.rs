// SPDX-License-Identifier: GPL-3.0-only

//! Frame type shared by every pipeline stage
//!
//! A frame is an RGB8 buffer behind an `Arc`, so handing it between the
//! acquisition thread, the driver and the display is a reference-count bump.
//! Frames are never mutated once published; annotation draws into a copy.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use image::RgbImage;

/// Bytes per pixel (RGB)
pub const CHANNELS: usize = 3;

static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// One captured (or annotated) image
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGB rows (stride = width * 3)
    pub data: Arc<[u8]>,
    /// Capture order, unique per process
    pub sequence: u64,
    /// Timestamp when the frame was captured
    pub captured_at: Instant,
}

impl Frame {
    /// Wrap raw RGB bytes. Returns `None` when the buffer does not match the
    /// dimensions.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() != width as usize * height as usize * CHANNELS {
            return None;
        }
        Some(Self {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
            sequence: NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed),
            captured_at: Instant::now(),
        })
    }

    /// Solid-colour frame
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * CHANNELS);
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
            sequence: NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed),
            captured_at: Instant::now(),
        }
    }

    pub fn from_rgb_image(img: RgbImage) -> Self {
        let width = img.width();
        let height = img.height();
        Self {
            width,
            height,
            data: Arc::from(img.into_raw().into_boxed_slice()),
            sequence: NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed),
            captured_at: Instant::now(),
        }
    }

    /// Copy into an owned, drawable image buffer
    pub fn to_rgb_image(&self) -> RgbImage {
        // Buffer length is checked on construction
        RgbImage::from_raw(self.width, self.height, self.data.to_vec())
            .unwrap_or_else(|| RgbImage::new(self.width, self.height))
    }

    /// Build the annotated successor of this frame. Keeps the sequence number
    /// and capture time so ordering checks survive annotation.
    pub fn derive(&self, img: RgbImage) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
            data: Arc::from(img.into_raw().into_boxed_slice()),
            sequence: self.sequence,
            captured_at: self.captured_at,
        }
    }

    /// Same pixels, new identity: a fresh sequence number and capture time.
    /// Sources that replay cached images use this for every capture.
    pub fn recaptured(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            data: Arc::clone(&self.data),
            sequence: NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed),
            captured_at: Instant::now(),
        }
    }

    pub fn stride(&self) -> usize {
        self.width as usize * CHANNELS
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Pixel at (x, y), clamped to the frame bounds
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        if self.is_empty() {
            return [0, 0, 0];
        }
        let x = x.min(self.width - 1) as usize;
        let y = y.min(self.height - 1) as usize;
        let idx = y * self.stride() + x * CHANNELS;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    /// Shrink both dimensions by `divisor` using a box filter.
    ///
    /// A divisor of 1 (or 0) returns a clone sharing the same buffer.
    pub fn downscale(&self, divisor: u32) -> Frame {
        if divisor <= 1 || self.is_empty() {
            return self.clone();
        }

        let dst_width = (self.width / divisor).max(1);
        let dst_height = (self.height / divisor).max(1);
        let src_stride = self.stride();
        let mut out = Vec::with_capacity(dst_width as usize * dst_height as usize * CHANNELS);

        for dy in 0..dst_height {
            let y0 = (dy * divisor) as usize;
            let y1 = ((dy + 1) * divisor).min(self.height) as usize;
            for dx in 0..dst_width {
                let x0 = (dx * divisor) as usize;
                let x1 = ((dx + 1) * divisor).min(self.width) as usize;

                let mut sums = [0u32; CHANNELS];
                let mut count = 0u32;
                for sy in y0..y1 {
                    let row = sy * src_stride;
                    for sx in x0..x1 {
                        let idx = row + sx * CHANNELS;
                        for (channel, sum) in sums.iter_mut().enumerate() {
                            *sum += self.data[idx + channel] as u32;
                        }
                        count += 1;
                    }
                }
                let count = count.max(1);
                for sum in sums {
                    out.push((sum / count) as u8);
                }
            }
        }

        Frame {
            width: dst_width,
            height: dst_height,
            data: Arc::from(out.into_boxed_slice()),
            sequence: self.sequence,
            captured_at: self.captured_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_wrong_length() {
        assert!(Frame::new(2, 2, vec![0; 11]).is_none());
        assert!(Frame::new(2, 2, vec![0; 12]).is_some());
    }

    #[test]
    fn test_sequence_increases() {
        let a = Frame::filled(1, 1, [0, 0, 0]);
        let b = Frame::filled(1, 1, [0, 0, 0]);
        assert!(b.sequence > a.sequence);
    }

    #[test]
    fn test_downscale_averages_blocks() {
        // 4x2: left half black, right half white
        let mut data = Vec::new();
        for _row in 0..2 {
            data.extend_from_slice(&[0, 0, 0, 0, 0, 0, 255, 255, 255, 255, 255, 255]);
        }
        let frame = Frame::new(4, 2, data).unwrap();

        let small = frame.downscale(2);
        assert_eq!((small.width, small.height), (2, 1));
        assert_eq!(small.pixel(0, 0), [0, 0, 0]);
        assert_eq!(small.pixel(1, 0), [255, 255, 255]);
        assert_eq!(small.sequence, frame.sequence);
    }

    #[test]
    fn test_downscale_by_one_shares_buffer() {
        let frame = Frame::filled(3, 3, [10, 20, 30]);
        let same = frame.downscale(1);
        assert!(Arc::ptr_eq(&frame.data, &same.data));
    }

    #[test]
    fn test_pixel_is_clamped() {
        let frame = Frame::filled(2, 2, [1, 2, 3]);
        assert_eq!(frame.pixel(10, 10), [1, 2, 3]);
    }
}
