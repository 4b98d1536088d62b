// SPDX-License-Identifier: GPL-3.0-only

//! Frame source backed by image files
//!
//! The target is either a single image or a directory of images, which are
//! replayed in name order forever. Each file is decoded once and cached.
//! Removing the target while the source is running ends it with
//! `SourceError::NotFound`, like a captured window being closed.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{FrameSource, Point};
use crate::constants::file_formats;
use crate::errors::SourceError;
use crate::frame::Frame;

pub struct ImageDirSource {
    target: PathBuf,
    name: String,
    files: Vec<PathBuf>,
    cache: Vec<Option<Frame>>,
    next: usize,
    offset: Point,
    closed: bool,
}

impl ImageDirSource {
    /// Open `target`, a directory of images or one image file.
    ///
    /// `offset` is the on-screen position of the frame's top-left pixel.
    pub fn open(target: &Path, offset: Point) -> Result<Self, SourceError> {
        if !target.exists() {
            return Err(SourceError::NotFound(target.display().to_string()));
        }

        let files = if target.is_dir() {
            list_targets(target)?
        } else {
            vec![target.to_path_buf()]
        };
        if files.is_empty() {
            return Err(SourceError::NotFound(format!(
                "{} (no images)",
                target.display()
            )));
        }

        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| target.display().to_string());

        info!(target = %target.display(), images = files.len(), "Opened image source");

        Ok(Self {
            target: target.to_path_buf(),
            name,
            cache: vec![None; files.len()],
            files,
            next: 0,
            offset,
            closed: false,
        })
    }

    fn load(&self, index: usize) -> Result<Frame, SourceError> {
        let path = &self.files[index];
        debug!(path = %path.display(), "Decoding image");
        let img = image::open(path)?;
        Ok(Frame::from_rgb_image(img.to_rgb8()))
    }
}

impl FrameSource for ImageDirSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn capture(&mut self) -> Result<Frame, SourceError> {
        if self.closed {
            return Err(SourceError::Closed);
        }
        if !self.target.exists() {
            return Err(SourceError::NotFound(self.target.display().to_string()));
        }

        let index = self.next;
        self.next = (self.next + 1) % self.files.len();

        if let Some(frame) = &self.cache[index] {
            return Ok(frame.recaptured());
        }
        let frame = self.load(index)?;
        self.cache[index] = Some(frame.clone());
        Ok(frame)
    }

    fn translate_to_screen(&self, local: Point) -> Point {
        Point::new(local.x + self.offset.x, local.y + self.offset.y)
    }

    fn close(&mut self) {
        if !self.closed {
            debug!(target = %self.target.display(), "Closing image source");
            self.closed = true;
            self.cache.clear();
        }
    }
}

/// Image files a directory offers as capture targets, sorted by name
pub fn list_targets(dir: &Path) -> Result<Vec<PathBuf>, SourceError> {
    let entries = fs::read_dir(dir)
        .map_err(|e| SourceError::NotFound(format!("{}: {}", dir.display(), e)))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(file_formats::is_image_extension)
        })
        .collect();
    files.sort();
    Ok(files)
}
