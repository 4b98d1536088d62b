// SPDX-License-Identifier: GPL-3.0-only

//! Pipeline driver: tick loop, state machine and shutdown coordination
//!
//! ```text
//! INIT -> CAPTURING -> BUFFERING -> STREAMING -> STOPPED
//! ```
//!
//! Each tick takes the latest source frame, annotates it, queues it and, once
//! the relay queue is full enough, starts playback. The driver also watches
//! every worker's stopped flag at the top of each tick: the first one it sees
//! set (or an external stop request) stops everything, in a fixed order.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::acquisition;
use super::relay::RelayQueue;
use super::sampler::ThrottledSampler;
use super::slot::SharedFrameSlot;
use super::worker::{RunState, WorkerController};
use crate::annotate::Annotator;
use crate::config::PipelineConfig;
use crate::constants::timing;
use crate::display::{self, DisplaySurface};
use crate::errors::{AppResult, DisplayError};
use crate::recognition::{Recognizer, ReferenceSet};
use crate::source::FrameSource;
use crate::telemetry::{CountsPerSec, LoopRate, StaleFrameMonitor};

/// Lifecycle states of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    /// Running, nothing queued yet
    Capturing,
    /// Frames accumulating behind the closed gate
    Buffering,
    /// Gate open, relay popping and display rendering
    Streaming,
    Stopped,
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The acquisition worker stopped (source target gone)
    SourceLost,
    /// The display worker stopped (user key or render failure)
    DisplayClosed,
    /// The relay queue was stopped
    RelayStopped,
    /// Stop requested from outside the workers
    UserRequest,
    /// `max_ticks` reached
    TickLimit,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::SourceLost => write!(f, "capture source lost"),
            StopReason::DisplayClosed => write!(f, "display closed"),
            StopReason::RelayStopped => write!(f, "relay queue stopped"),
            StopReason::UserRequest => write!(f, "stopped by user"),
            StopReason::TickLimit => write!(f, "tick limit reached"),
        }
    }
}

/// Cloneable external stop switch (Ctrl+C handler, tests)
#[derive(Debug, Clone, Default)]
pub struct StopRequest(RunState);

impl StopRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.stop();
    }

    pub fn is_requested(&self) -> bool {
        self.0.is_stopped()
    }
}

/// Everything the workers share, bound to one run
pub struct PipelineContext {
    pub config: PipelineConfig,
    pub slot: Arc<SharedFrameSlot>,
    pub relay: Arc<RelayQueue>,
    pub acquisition: RunState,
    pub display: RunState,
    pub driver: RunState,
    pub stop: StopRequest,
}

/// Inputs for a run besides the frame source and display
pub struct PipelineSetup {
    pub config: PipelineConfig,
    pub recognizer: Box<dyn Recognizer>,
    pub references: ReferenceSet,
    pub stop: StopRequest,
    /// End the run after this many ticks
    pub max_ticks: Option<u64>,
}

/// Summary of a finished run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub reason: StopReason,
    pub ticks: u64,
    pub recognitions: u64,
    pub frames_popped: u64,
    pub frames_left_in_queue: usize,
    /// Reference names recognised at least once
    pub names_seen: BTreeSet<String>,
    pub counts_per_sec: f64,
    pub elapsed: Duration,
}

pub struct PipelineDriver {
    ctx: Arc<PipelineContext>,
    state: PipelineState,
    annotator: Annotator,
    sampler: ThrottledSampler,
    cps: CountsPerSec,
    loop_rate: LoopRate,
    stale: StaleFrameMonitor,
    acquisition: Option<WorkerController>,
    pop: Option<WorkerController>,
    display: Option<WorkerController>,
    /// Surface held by the driver until playback starts
    pending_surface: Option<Box<dyn DisplaySurface>>,
    ticks: u64,
    max_ticks: Option<u64>,
    names_seen: BTreeSet<String>,
    stop_reason: Option<StopReason>,
    started_at: Instant,
}

impl PipelineDriver {
    /// INIT: prime the frame slot with one synchronous capture, open the
    /// display surface and start acquisition.
    ///
    /// Fails without starting any thread if the source cannot deliver a first
    /// frame or the display surface cannot be created.
    pub fn init<F>(
        setup: PipelineSetup,
        mut source: Box<dyn FrameSource>,
        open_display: F,
    ) -> AppResult<Self>
    where
        F: FnOnce() -> Result<Box<dyn DisplaySurface>, DisplayError>,
    {
        let config = setup.config;
        config.validate()?;

        let first = source.capture()?;
        info!(
            source = %source.name(),
            width = first.width,
            height = first.height,
            "Source primed"
        );

        let surface = match open_display() {
            Ok(surface) => surface,
            Err(e) => {
                source.close();
                return Err(e.into());
            }
        };

        let ctx = Arc::new(PipelineContext {
            slot: Arc::new(SharedFrameSlot::new(first)),
            relay: Arc::new(RelayQueue::new(config.fill_threshold)),
            acquisition: RunState::new(),
            display: RunState::new(),
            driver: RunState::new(),
            stop: setup.stop,
            config,
        });

        let annotator = Annotator::new(
            setup.recognizer,
            setup.references,
            ctx.config.resize_divisor,
            ctx.config.label_plate_char_width_px,
        );

        let acquisition = acquisition::spawn(
            source,
            Arc::clone(&ctx.slot),
            ctx.acquisition.clone(),
            ctx.config.worker_idle(),
        );

        info!(
            sample_interval = ctx.config.sample_interval,
            resize_divisor = ctx.config.resize_divisor,
            fill_threshold = ctx.config.fill_threshold,
            "Pipeline initialised"
        );

        Ok(Self {
            sampler: ThrottledSampler::new(ctx.config.sample_interval),
            stale: StaleFrameMonitor::new(ctx.config.stale_frame_ticks),
            annotator,
            cps: CountsPerSec::start(),
            loop_rate: LoopRate::start(),
            acquisition: Some(acquisition),
            pop: None,
            display: None,
            pending_surface: Some(surface),
            ticks: 0,
            max_ticks: setup.max_ticks,
            names_seen: BTreeSet::new(),
            stop_reason: None,
            started_at: Instant::now(),
            state: PipelineState::Capturing,
            ctx,
        })
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn context(&self) -> &Arc<PipelineContext> {
        &self.ctx
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn recognitions(&self) -> u64 {
        self.annotator.recognitions()
    }

    /// Run one tick. Returns the stop reason once the pipeline has stopped.
    pub fn tick(&mut self) -> Option<StopReason> {
        if let Some(reason) = self.stop_reason {
            return Some(reason);
        }
        if let Some(reason) = self.observe_stop() {
            self.shutdown(reason);
            return Some(reason);
        }

        let frame = self.ctx.slot.latest();
        self.stale.observe(self.ctx.slot.generation());

        let sample = self.sampler.is_sampling_tick();
        let annotated = self.annotator.annotate(&frame, sample);
        if sample {
            for name in self.annotator.last_result().names() {
                if self.names_seen.insert(name.to_string()) {
                    info!(name = %name, "Recognised");
                }
            }
        }

        let relay = Arc::clone(&self.ctx.relay);
        relay.push(annotated);

        if relay.check_gate() {
            self.start_streaming();
        } else if relay.is_buffering() {
            if self.state == PipelineState::Capturing {
                self.state = PipelineState::Buffering;
            }
            if self.ticks % timing::TICK_LOG_INTERVAL == 0 {
                debug!(queued = relay.size(), threshold = relay.fill_threshold(), "Buffering");
            }
            if let Some(surface) = self.pending_surface.as_mut() {
                let status = format!("Buffering... ({}/{})", relay.size(), relay.fill_threshold());
                if let Err(e) = surface.show_status(&status) {
                    warn!(error = %e, "Display status failed");
                    self.shutdown(StopReason::DisplayClosed);
                    return Some(StopReason::DisplayClosed);
                }
            }
        }

        self.cps.increment();
        let fps = self.loop_rate.tick();
        if self.ticks % timing::TICK_LOG_INTERVAL == 0 {
            debug!(
                tick = self.ticks,
                cps = self.cps.counts_per_sec(),
                fps,
                queued = relay.size(),
                "Pipeline rate"
            );
        }

        self.sampler.advance();
        self.ticks += 1;

        if self.max_ticks.is_some_and(|limit| self.ticks >= limit) {
            self.shutdown(StopReason::TickLimit);
            return Some(StopReason::TickLimit);
        }
        None
    }

    /// Tick until something stops the pipeline, pacing ticks to
    /// `driver_tick_ms`
    pub fn run(mut self) -> PipelineReport {
        let period = Duration::from_millis(self.ctx.config.driver_tick_ms);
        let reason = loop {
            let started = Instant::now();
            if let Some(reason) = self.tick() {
                break reason;
            }
            match period.checked_sub(started.elapsed()) {
                Some(rest) if !rest.is_zero() => thread::sleep(rest),
                _ => thread::yield_now(),
            }
        };
        self.report(reason)
    }

    /// Stop every worker and release the display. Idempotent.
    ///
    /// Order: display, acquisition, relay, then rendering resources.
    pub fn shutdown(&mut self, reason: StopReason) {
        if self.state == PipelineState::Stopped {
            return;
        }
        info!(reason = %reason, ticks = self.ticks, "Stopping pipeline");

        self.ctx.display.stop();
        self.ctx.acquisition.stop();
        self.ctx.relay.stop();
        self.ctx.driver.stop();

        // Joining the display worker runs its surface teardown
        if let Some(mut worker) = self.display.take() {
            worker.join();
        }
        if let Some(mut surface) = self.pending_surface.take() {
            surface.release();
        }
        if let Some(mut worker) = self.pop.take() {
            worker.join();
        }
        if let Some(mut worker) = self.acquisition.take() {
            worker.join();
        }

        self.stop_reason = Some(reason);
        self.state = PipelineState::Stopped;
    }

    /// Summary of the run so far
    pub fn report(&self, reason: StopReason) -> PipelineReport {
        PipelineReport {
            reason,
            ticks: self.ticks,
            recognitions: self.annotator.recognitions(),
            frames_popped: self.ctx.relay.popped_count(),
            frames_left_in_queue: self.ctx.relay.size(),
            names_seen: self.names_seen.clone(),
            counts_per_sec: self.cps.counts_per_sec(),
            elapsed: self.started_at.elapsed(),
        }
    }

    fn observe_stop(&mut self) -> Option<StopReason> {
        if self.ctx.stop.is_requested() || self.ctx.driver.is_stopped() {
            return Some(StopReason::UserRequest);
        }
        if self.ctx.acquisition.is_stopped() {
            return Some(StopReason::SourceLost);
        }
        if self.ctx.display.is_stopped() {
            return Some(StopReason::DisplayClosed);
        }
        if self.ctx.relay.is_stopped() {
            return Some(StopReason::RelayStopped);
        }

        // Before playback the driver owns the surface and polls its keys
        if let Some(surface) = self.pending_surface.as_mut() {
            match surface.poll_stop() {
                Ok(true) => return Some(StopReason::UserRequest),
                Ok(false) => {}
                Err(e) => {
                    warn!(error = %e, "Display input failed");
                    return Some(StopReason::DisplayClosed);
                }
            }
        }
        None
    }

    fn start_streaming(&mut self) {
        let relay = &self.ctx.relay;
        self.pop = relay.start_pop(self.ctx.config.display_tick());

        if let Some(surface) = self.pending_surface.take() {
            self.display = Some(display::spawn(
                surface,
                Arc::clone(relay),
                self.ctx.display.clone(),
                self.ctx.config.display_tick(),
            ));
        }

        info!(tick = self.ticks, queued = relay.size(), "Streaming started");
        self.state = PipelineState::Streaming;
    }
}

impl Drop for PipelineDriver {
    fn drop(&mut self) {
        if self.state != PipelineState::Stopped {
            debug!("PipelineDriver dropped while running, stopping");
            self.shutdown(StopReason::UserRequest);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::HeadlessSurface;
    use crate::recognition::NullRecognizer;
    use crate::source::{SourceHandle, SyntheticSource};

    fn setup(fill_threshold: usize) -> PipelineSetup {
        PipelineSetup {
            config: PipelineConfig {
                fill_threshold,
                sample_interval: 3,
                worker_idle_ms: 1,
                display_tick_ms: 1,
                driver_tick_ms: 0,
                ..Default::default()
            },
            recognizer: Box::new(NullRecognizer),
            references: ReferenceSet::default(),
            stop: StopRequest::new(),
            max_ticks: None,
        }
    }

    fn headless() -> Result<Box<dyn DisplaySurface>, DisplayError> {
        Ok(Box::new(HeadlessSurface::new()))
    }

    #[test]
    fn test_state_progression() {
        let source = SyntheticSource::open(8, 8, SourceHandle::new()).unwrap();
        let mut driver = PipelineDriver::init(setup(3), Box::new(source), headless).unwrap();
        assert_eq!(driver.state(), PipelineState::Capturing);

        assert!(driver.tick().is_none());
        assert_eq!(driver.state(), PipelineState::Buffering);
        assert!(driver.tick().is_none());
        assert!(driver.tick().is_none());
        assert_eq!(driver.state(), PipelineState::Streaming);

        driver.shutdown(StopReason::UserRequest);
        assert_eq!(driver.state(), PipelineState::Stopped);
        assert_eq!(driver.tick(), Some(StopReason::UserRequest));
    }

    #[test]
    fn test_buffering_progress_shown_on_display() {
        let source = SyntheticSource::open(8, 8, SourceHandle::new()).unwrap();
        let surface = HeadlessSurface::new();
        let status = surface.last_status();
        let presented = surface.presented_counter();
        let mut driver = PipelineDriver::init(setup(5), Box::new(source), move || {
            Ok(Box::new(surface) as Box<dyn DisplaySurface>)
        })
        .unwrap();

        assert!(driver.tick().is_none());
        assert!(driver.tick().is_none());
        assert_eq!(status.lock().unwrap().as_deref(), Some("Buffering... (2/5)"));
        assert_eq!(presented.load(std::sync::atomic::Ordering::SeqCst), 0);

        driver.shutdown(StopReason::UserRequest);
    }

    #[test]
    fn test_display_failure_aborts_init() {
        let source = SyntheticSource::open(8, 8, SourceHandle::new()).unwrap();
        let result = PipelineDriver::init(setup(3), Box::new(source), || {
            Err(DisplayError::Unavailable("no tty".to_string()))
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_external_stop() {
        let source = SyntheticSource::open(8, 8, SourceHandle::new()).unwrap();
        let setup = setup(100);
        let stop = setup.stop.clone();
        let mut driver = PipelineDriver::init(setup, Box::new(source), headless).unwrap();

        assert!(driver.tick().is_none());
        stop.request();
        assert_eq!(driver.tick(), Some(StopReason::UserRequest));
        assert!(driver.context().acquisition.is_stopped());
        assert!(driver.context().display.is_stopped());
        assert!(driver.context().relay.is_stopped());
    }
}
