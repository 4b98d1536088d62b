// SPDX-License-Identifier: GPL-3.0-only

//! Concurrent capture, annotation and playback pipeline
//!
//! - [`acquisition`]: worker keeping the latest-frame slot fresh
//! - [`slot`]: single-value latest-frame slot
//! - [`sampler`]: every-Nth-tick recognition throttle
//! - [`relay`]: gated FIFO between the driver and the display
//! - [`worker`]: cooperative-stop thread handle shared by all workers
//! - [`driver`]: the tick loop and shutdown coordination

pub mod acquisition;
pub mod driver;
pub mod relay;
pub mod sampler;
pub mod slot;
pub mod worker;

pub use driver::{
    PipelineContext, PipelineDriver, PipelineReport, PipelineSetup, PipelineState, StopReason,
    StopRequest,
};
pub use relay::RelayQueue;
pub use sampler::ThrottledSampler;
pub use slot::SharedFrameSlot;
pub use worker::{LoopAction, RunState, WorkerController};
