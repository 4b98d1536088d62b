// SPDX-License-Identifier: GPL-3.0-only

//! Rollcall - live face recognition overlay and class attendance
//!
//! Frames are captured continuously from a visual source, every Nth one is
//! run through recognition, and the resulting labelled boxes are drawn onto
//! every frame. Annotated frames are buffered and played back on a display
//! surface once enough of them have accumulated.
//!
//! # Architecture
//!
//! - [`source`]: frame sources (image files, synthetic pattern)
//! - [`pipeline`]: acquisition worker, latest-frame slot, sampler, relay queue
//!   and the driver that ties them together
//! - [`recognition`]: recognizer interface and nearest-neighbour labelling
//! - [`annotate`]: overlay drawing
//! - [`display`]: display surfaces and the display worker
//! - [`attendance`]: per-class attendance tables
//! - [`config`]: pipeline configuration

pub mod annotate;
pub mod attendance;
pub mod config;
pub mod constants;
pub mod display;
pub mod errors;
pub mod frame;
pub mod pipeline;
pub mod recognition;
pub mod source;
pub mod telemetry;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use errors::{AppError, AppResult};
pub use frame::Frame;
pub use pipeline::{PipelineDriver, PipelineReport, PipelineSetup, StopReason, StopRequest};
