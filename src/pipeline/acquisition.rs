// SPDX-License-Identifier: GPL-3.0-only

//! Acquisition worker: keeps the latest-frame slot fresh
//!
//! There is no backpressure. Every capture overwrites the slot, so a slow
//! driver simply skips frames.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::slot::SharedFrameSlot;
use super::worker::{LoopAction, RunState, WorkerController};
use crate::constants::timing;
use crate::errors::SourceError;
use crate::source::FrameSource;

/// Start capturing from `source` into `slot` until `run` is stopped or the
/// source target disappears. The source is closed when the loop ends.
pub fn spawn(
    source: Box<dyn FrameSource>,
    slot: Arc<SharedFrameSlot>,
    run: RunState,
    pacing: Duration,
) -> WorkerController {
    let mut captures: u64 = 0;

    WorkerController::start_with_state(
        "acquisition",
        run,
        pacing,
        source,
        move |source| match source.capture() {
            Ok(frame) => {
                slot.publish(frame);
                captures += 1;
                if captures % timing::TICK_LOG_INTERVAL == 0 {
                    debug!(captures, "Acquisition progress");
                }
                LoopAction::Continue
            }
            Err(SourceError::NotFound(target)) => {
                warn!(target = %target, "Capture target gone, stopping acquisition");
                LoopAction::Stop
            }
            Err(SourceError::Closed) => {
                warn!("Source closed, stopping acquisition");
                LoopAction::Stop
            }
            Err(e) => {
                // Undecodable frames are skipped; the slot keeps the last good one
                debug!(error = %e, "Capture failed, retrying");
                LoopAction::Continue
            }
        },
        |mut source| {
            info!(source = %source.name(), "Releasing frame source");
            source.close();
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use crate::source::{SourceHandle, SyntheticSource};

    #[test]
    fn test_publishes_frames() {
        let handle = SourceHandle::new();
        let source = SyntheticSource::open(8, 8, handle).unwrap();
        let slot = Arc::new(SharedFrameSlot::new(Frame::filled(8, 8, [0, 0, 0])));
        let run = RunState::new();

        let mut worker = spawn(Box::new(source), Arc::clone(&slot), run.clone(), Duration::from_millis(1));
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while slot.generation() < 3 && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        worker.stop();

        assert!(slot.generation() >= 3);
        assert!(run.is_stopped());
    }

    #[test]
    fn test_stops_itself_when_target_disappears() {
        let handle = SourceHandle::new();
        let source = SyntheticSource::open(8, 8, handle.clone()).unwrap();
        let slot = Arc::new(SharedFrameSlot::new(Frame::filled(8, 8, [0, 0, 0])));
        let run = RunState::new();

        let mut worker = spawn(Box::new(source), slot, run.clone(), Duration::from_millis(1));
        handle.invalidate();
        worker.join();

        assert!(run.is_stopped());
    }
}
