// SPDX-License-Identifier: GPL-3.0-only
//! Thread lifecycle management for pipeline workers
//!
//! Acquisition, relay popping and display all run the same shape of loop:
//! check the stop flag, do one iteration, yield. This module owns that shape
//! so every worker starts, stops and reports its state the same way.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Action returned by a worker iteration to control loop behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Continue running the loop
    Continue,
    /// Stop the loop gracefully
    Stop,
}

/// Shared stopped flag of one worker
///
/// The flag exists before the worker thread does, so the driver can observe
/// and set it whether or not the worker has been started yet. Once set it is
/// never cleared.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    stopped: Arc<AtomicBool>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the worker stopped
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Controller for a worker loop running in a separate thread
///
/// # Example
///
/// ```ignore
/// let run = RunState::new();
/// let controller = WorkerController::start("acquisition", run.clone(), Duration::ZERO, move || {
///     match source.capture() {
///         Ok(frame) => {
///             slot.publish(frame);
///             LoopAction::Continue
///         }
///         Err(_) => LoopAction::Stop,
///     }
/// });
///
/// // Later, stop the loop
/// controller.stop();
/// ```
pub struct WorkerController {
    /// Thread handle for joining
    thread_handle: Option<JoinHandle<()>>,
    /// Stopped flag shared with the thread
    run: RunState,
    /// Name for logging
    name: String,
}

impl WorkerController {
    /// Start a worker loop in a named thread
    ///
    /// `loop_fn` is called repeatedly until it returns `LoopAction::Stop` or
    /// `run` is marked stopped. Between iterations the thread sleeps for
    /// `pacing`, or yields when `pacing` is zero.
    pub fn start<F>(name: &str, run: RunState, pacing: Duration, mut loop_fn: F) -> Self
    where
        F: FnMut() -> LoopAction + Send + 'static,
    {
        Self::start_with_state(name, run, pacing, (), move |_| loop_fn(), |_| {})
    }

    /// Start a worker loop that owns a resource
    ///
    /// `state` moves into the thread, is handed to every iteration, and is
    /// passed to `teardown` once the loop ends for any reason.
    pub fn start_with_state<S, F, D>(
        name: &str,
        run: RunState,
        pacing: Duration,
        mut state: S,
        mut loop_fn: F,
        teardown: D,
    ) -> Self
    where
        S: Send + 'static,
        F: FnMut(&mut S) -> LoopAction + Send + 'static,
        D: FnOnce(S) + Send + 'static,
    {
        let thread_run = run.clone();
        let name_clone = name.to_string();

        info!(name = %name, "Starting worker");

        let spawned = thread::Builder::new().name(name.to_string()).spawn(move || {
            debug!(name = %name_clone, "Worker thread started");

            loop {
                if thread_run.is_stopped() {
                    debug!(name = %name_clone, "Stop signal received");
                    break;
                }

                match loop_fn(&mut state) {
                    LoopAction::Continue => {}
                    LoopAction::Stop => {
                        debug!(name = %name_clone, "Worker requested stop");
                        break;
                    }
                }

                if pacing.is_zero() {
                    thread::yield_now();
                } else {
                    thread::sleep(pacing);
                }
            }

            // Whatever ended the loop, the rest of the pipeline sees it here
            thread_run.stop();
            teardown(state);
            info!(name = %name_clone, "Worker thread exiting");
        });

        let thread_handle = match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                error!(name = %name, error = %e, "Failed to spawn worker thread");
                run.stop();
                None
            }
        };

        Self {
            thread_handle,
            run,
            name: name.to_string(),
        }
    }

    /// Check if the thread is still executing
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// The worker's stopped flag
    pub fn run_state(&self) -> &RunState {
        &self.run
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Signal the loop to stop (non-blocking)
    pub fn request_stop(&self) {
        debug!(name = %self.name, "Requesting worker stop");
        self.run.stop();
    }

    /// Stop the loop and wait for the thread to finish
    pub fn stop(&mut self) {
        self.request_stop();
        self.join();
    }

    /// Wait for the thread to finish without sending stop signal
    pub fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            debug!(name = %self.name, "Waiting for worker thread to finish");
            if let Err(e) = handle.join() {
                // A panicking iteration never ran the exit path
                self.run.stop();
                warn!(name = %self.name, "Worker thread panicked: {:?}", e);
            } else {
                debug!(name = %self.name, "Worker thread finished");
            }
        }
    }
}

impl Drop for WorkerController {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.name, "WorkerController dropped, stopping loop");
            self.stop();
        }
    }
}
