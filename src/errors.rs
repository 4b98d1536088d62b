// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the recognition pipeline
//!
//! Errors raised inside the acquisition and display workers never cross a
//! thread boundary: they are logged and turned into that worker's stopped
//! state. Only errors from setup (opening the source, creating the display
//! surface, loading configuration) reach the caller as values.

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Frame source errors
    Source(SourceError),
    /// Display surface errors
    Display(DisplayError),
    /// Configuration errors
    Config(ConfigError),
    /// Reference set could not be loaded or is malformed
    Reference(String),
    /// Attendance table could not be read or written
    Attendance(String),
    /// Filesystem errors
    Io(String),
    /// Generic error with message
    Other(String),
}

/// Frame source errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The capture target does not exist (or no longer exists)
    NotFound(String),
    /// A captured image could not be decoded
    Decode(String),
    /// The source handle was closed
    Closed,
}

/// Display surface errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayError {
    /// The rendering surface could not be created
    Unavailable(String),
    /// Drawing a frame failed
    Render(String),
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An option holds a value outside its allowed range
    InvalidValue { option: &'static str, reason: String },
    /// The configuration file could not be parsed
    Parse(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Source(e) => write!(f, "Source error: {}", e),
            AppError::Display(e) => write!(f, "Display error: {}", e),
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
            AppError::Reference(msg) => write!(f, "Reference set error: {}", msg),
            AppError::Attendance(msg) => write!(f, "Attendance error: {}", msg),
            AppError::Io(msg) => write!(f, "I/O error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::NotFound(target) => write!(f, "Capture target not found: {}", target),
            SourceError::Decode(msg) => write!(f, "Failed to decode frame: {}", msg),
            SourceError::Closed => write!(f, "Source handle is closed"),
        }
    }
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::Unavailable(msg) => write!(f, "Display unavailable: {}", msg),
            DisplayError::Render(msg) => write!(f, "Render failed: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue { option, reason } => {
                write!(f, "invalid value for '{}': {}", option, reason)
            }
            ConfigError::Parse(msg) => write!(f, "failed to parse config: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for SourceError {}
impl std::error::Error for DisplayError {}
impl std::error::Error for ConfigError {}

impl From<SourceError> for AppError {
    fn from(err: SourceError) -> Self {
        AppError::Source(err)
    }
}

impl From<DisplayError> for AppError {
    fn from(err: DisplayError) -> Self {
        AppError::Display(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<std::io::Error> for DisplayError {
    fn from(err: std::io::Error) -> Self {
        DisplayError::Render(err.to_string())
    }
}

impl From<image::ImageError> for SourceError {
    fn from(err: image::ImageError) -> Self {
        SourceError::Decode(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}
