// SPDX-License-Identifier: GPL-3.0-only

//! End-to-end pipeline runs with a synthetic source and headless display

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use rollcall::config::PipelineConfig;
use rollcall::display::{DisplaySurface, HeadlessSurface};
use rollcall::errors::DisplayError;
use rollcall::frame::Frame;
use rollcall::pipeline::{PipelineDriver, PipelineSetup, PipelineState, StopReason, StopRequest};
use rollcall::recognition::{BoundingBox, Detection, Recognizer, ReferenceSet};
use rollcall::source::{SourceHandle, SyntheticSource};

/// Finds one face per call, always matching "Ada"
struct CountingRecognizer {
    calls: Arc<AtomicUsize>,
}

impl Recognizer for CountingRecognizer {
    fn detect_regions(&mut self, _frame: &Frame) -> Vec<Detection> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        vec![Detection {
            bbox: BoundingBox::new(2, 12, 10, 2),
            features: vec![0.0, 0.1],
        }]
    }
}

fn config(sample_interval: u32, fill_threshold: usize) -> PipelineConfig {
    PipelineConfig {
        sample_interval,
        fill_threshold,
        worker_idle_ms: 1,
        display_tick_ms: 1,
        driver_tick_ms: 0,
        ..Default::default()
    }
}

fn setup(config: PipelineConfig, calls: &Arc<AtomicUsize>) -> PipelineSetup {
    PipelineSetup {
        config,
        recognizer: Box::new(CountingRecognizer {
            calls: Arc::clone(calls),
        }),
        references: ReferenceSet::new(
            vec!["Ada".to_string(), "Bob".to_string()],
            vec![vec![0.0, 0.0], vec![5.0, 5.0]],
        )
        .unwrap(),
        stop: StopRequest::new(),
        max_ticks: None,
    }
}

fn headless() -> Result<Box<dyn DisplaySurface>, DisplayError> {
    Ok(Box::new(HeadlessSurface::new()))
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    false
}

#[test]
fn test_recognition_runs_once_per_interval() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut setup = setup(config(4, 1000), &calls);
    setup.max_ticks = Some(40);

    let source = SyntheticSource::open(32, 32, SourceHandle::new()).unwrap();
    let driver = PipelineDriver::init(setup, Box::new(source), headless).unwrap();
    let report = driver.run();

    assert_eq!(report.reason, StopReason::TickLimit);
    assert_eq!(report.ticks, 40);
    assert_eq!(report.recognitions, 10);
    assert_eq!(calls.load(Ordering::SeqCst), 10);
    assert!(report.names_seen.contains("Ada"));
    assert!(!report.names_seen.contains("Bob"));
}

#[test]
fn test_nothing_displayed_while_buffering() {
    let calls = Arc::new(AtomicUsize::new(0));
    let surface = HeadlessSurface::new();
    let presented = surface.presented_counter();

    let source = SyntheticSource::open(16, 16, SourceHandle::new()).unwrap();
    let mut driver = PipelineDriver::init(setup(config(100, 5), &calls), Box::new(source), move || {
        Ok(Box::new(surface) as Box<dyn DisplaySurface>)
    })
    .unwrap();

    for _ in 0..4 {
        assert!(driver.tick().is_none());
    }
    assert_eq!(driver.state(), PipelineState::Buffering);
    assert!(driver.context().relay.is_buffering());
    assert_eq!(driver.context().relay.size(), 4);
    assert_eq!(presented.load(Ordering::SeqCst), 0);

    assert!(driver.tick().is_none());
    assert_eq!(driver.state(), PipelineState::Streaming);
    assert!(!driver.context().relay.is_buffering());
    assert!(wait_until(|| presented.load(Ordering::SeqCst) > 0));

    driver.shutdown(StopReason::UserRequest);
}

#[test]
fn test_source_loss_stops_everything_within_one_tick() {
    let calls = Arc::new(AtomicUsize::new(0));
    let handle = SourceHandle::new();
    let source = SyntheticSource::open(16, 16, handle.clone()).unwrap();
    let mut driver =
        PipelineDriver::init(setup(config(10, 3), &calls), Box::new(source), headless).unwrap();

    for _ in 0..5 {
        assert!(driver.tick().is_none());
    }
    assert_eq!(driver.state(), PipelineState::Streaming);

    handle.invalidate();
    let ctx = Arc::clone(driver.context());
    assert!(wait_until(|| ctx.acquisition.is_stopped()));

    assert_eq!(driver.tick(), Some(StopReason::SourceLost));
    assert_eq!(driver.state(), PipelineState::Stopped);
    assert!(ctx.display.is_stopped());
    assert!(ctx.relay.is_stopped());
}

#[test]
fn test_display_key_ends_run_in_order() {
    let calls = Arc::new(AtomicUsize::new(0));
    let surface = HeadlessSurface::new().with_frame_limit(5).with_recorder();
    let recorded = surface.recorded().unwrap();
    let released = surface.released_flag();

    let mut config = config(3, 2);
    config.driver_tick_ms = 1;
    let source = SyntheticSource::open(16, 16, SourceHandle::new()).unwrap();
    let driver = PipelineDriver::init(setup(config, &calls), Box::new(source), move || {
        Ok(Box::new(surface) as Box<dyn DisplaySurface>)
    })
    .unwrap();
    let ctx = Arc::clone(driver.context());

    let report = driver.run();

    assert_eq!(report.reason, StopReason::DisplayClosed);
    assert!(ctx.acquisition.is_stopped());
    assert!(ctx.relay.is_stopped());
    assert!(released.load(Ordering::SeqCst));

    // Frames reach the display in the order they were queued; consecutive
    // ticks on the same source frame share its sequence
    let shown = recorded.lock().unwrap().clone();
    assert_eq!(shown.len(), 5);
    assert!(shown.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn test_external_stop_before_streaming_releases_display() {
    let calls = Arc::new(AtomicUsize::new(0));
    let surface = HeadlessSurface::new();
    let released = surface.released_flag();

    let setup = setup(config(100, 1000), &calls);
    let stop = setup.stop.clone();
    let source = SyntheticSource::open(16, 16, SourceHandle::new()).unwrap();
    let mut driver = PipelineDriver::init(setup, Box::new(source), move || {
        Ok(Box::new(surface) as Box<dyn DisplaySurface>)
    })
    .unwrap();

    assert!(driver.tick().is_none());
    stop.request();
    assert_eq!(driver.tick(), Some(StopReason::UserRequest));
    assert!(released.load(Ordering::SeqCst));
    assert_eq!(driver.context().relay.popped_count(), 0);
}

#[test]
fn test_lost_source_fails_init() {
    let calls = Arc::new(AtomicUsize::new(0));
    let handle = SourceHandle::new();
    let source = SyntheticSource::open(16, 16, handle.clone()).unwrap();
    handle.invalidate();

    let result = PipelineDriver::init(setup(config(10, 3), &calls), Box::new(source), headless);
    assert!(result.is_err());
}
