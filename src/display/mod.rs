// SPDX-License-Identifier: GPL-3.0-only

//! Display surfaces and the display worker
//!
//! The worker shows whatever frame the relay queue currently exposes and
//! watches the surface for the user's stop key. Render failures end the
//! worker; they never propagate out of its thread.

pub mod headless;
pub mod terminal;

pub use headless::HeadlessSurface;
pub use terminal::TerminalSurface;

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, trace, warn};

use crate::errors::DisplayError;
use crate::frame::Frame;
use crate::pipeline::relay::RelayQueue;
use crate::pipeline::worker::{LoopAction, RunState, WorkerController};

/// Something a frame can be rendered to
pub trait DisplaySurface: Send {
    /// Draw one frame
    fn present(&mut self, frame: &Frame) -> Result<(), DisplayError>;

    /// Show a status line while there is no frame to present yet
    fn show_status(&mut self, _message: &str) -> Result<(), DisplayError> {
        Ok(())
    }

    /// Whether the user asked to quit since the last poll
    fn poll_stop(&mut self) -> Result<bool, DisplayError>;

    /// Give back the rendering resources. Safe to call more than once.
    fn release(&mut self);
}

/// Start rendering `relay`'s current output on `surface`.
///
/// The surface is released when the worker ends, whatever the reason.
pub fn spawn(
    surface: Box<dyn DisplaySurface>,
    relay: Arc<RelayQueue>,
    run: RunState,
    pacing: Duration,
) -> WorkerController {
    let mut last_shown: Option<Arc<Frame>> = None;

    WorkerController::start_with_state(
        "display",
        run,
        pacing,
        surface,
        move |surface| {
            // Annotated frames can share a source sequence, so compare the popped Arc
            if let Some(frame) = relay.current_output()
                && last_shown
                    .as_ref()
                    .is_none_or(|shown| !Arc::ptr_eq(shown, &frame))
            {
                if let Err(e) = surface.present(&frame) {
                    warn!(error = %e, "Display failed, stopping");
                    return LoopAction::Stop;
                }
                trace!(sequence = frame.sequence, "Frame displayed");
                last_shown = Some(frame);
            }

            match surface.poll_stop() {
                Ok(true) => {
                    info!("Stop requested from display");
                    LoopAction::Stop
                }
                Ok(false) => LoopAction::Continue,
                Err(e) => {
                    warn!(error = %e, "Display input failed, stopping");
                    LoopAction::Stop
                }
            }
        },
        |mut surface| surface.release(),
    )
}
