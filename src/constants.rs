// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Default values for the pipeline configuration
pub mod defaults {
    /// Every Nth pipeline tick runs recognition
    pub const SAMPLE_INTERVAL: u32 = 100;

    /// Frames are shrunk by this factor before recognition
    pub const RESIZE_DIVISOR: u32 = 2;

    /// Largest accepted resize divisor
    pub const MAX_RESIZE_DIVISOR: u32 = 64;

    /// Annotated frames buffered before playback starts
    pub const FILL_THRESHOLD: usize = 30;

    /// Approximate pixel width of one label character
    pub const LABEL_PLATE_CHAR_WIDTH_PX: f32 = 10.0;

    /// Unchanged ticks before a stale-frame warning is logged
    pub const STALE_FRAME_TICKS: u32 = 300;

    /// Idle interval for the acquisition loop between captures
    pub const WORKER_IDLE_MS: u64 = 1;

    /// Pop/display cadence once playback has started (~60 Hz)
    pub const DISPLAY_TICK_MS: u64 = 16;

    /// Minimum period of one driver tick
    pub const DRIVER_TICK_MS: u64 = 16;
}

/// Overlay drawing constants
pub mod overlay {
    /// Box and plate colour (magenta)
    pub const BOX_COLOR: [u8; 3] = [255, 0, 255];

    /// Label text colour
    pub const TEXT_COLOR: [u8; 3] = [255, 255, 255];

    /// Bounding box line thickness in pixels
    pub const BOX_THICKNESS: i32 = 2;

    /// Label plate height below the box
    pub const PLATE_HEIGHT: i32 = 35;

    /// Plate margin used when the label fits inside the box width
    pub const MIN_PLATE_MARGIN: i32 = 1;

    /// Text inset from the plate's left edge
    pub const TEXT_INSET_X: i32 = 5;

    /// Text offset from the box bottom
    pub const TEXT_OFFSET_Y: i32 = 12;
}

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Tick counter modulo for periodic logging
    pub const TICK_LOG_INTERVAL: u64 = 30;

    /// Terminal key poll timeout per display iteration
    pub const KEY_POLL_TIMEOUT: Duration = Duration::from_millis(1);
}

/// Label used for faces that match no reference
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Row name used for unmatched faces in the attendance table
pub const UNKNOWN_ATTENDEE: &str = "UNKNOWN";

/// Attendance file name inside a class directory
pub const ATTENDANCE_FILE: &str = "attendance.json";

/// Supported image file formats for directory sources
pub mod file_formats {
    /// Supported image file extensions
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

/// Application information utilities
pub mod app_info {
    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extensions() {
        assert!(file_formats::is_image_extension("JPG"));
        assert!(file_formats::is_image_extension("png"));
        assert!(!file_formats::is_image_extension("mp4"));
    }
}
