// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Running the capture / recognition / playback pipeline
//! - Listing image targets a source can replay
//! - Creating and showing a class attendance table

use chrono::Local;
use clap::Args;
use rollcall::attendance::{AttendanceSink, AttendanceTable, JsonAttendanceSink};
use rollcall::config::PipelineConfig;
use rollcall::display::{DisplaySurface, HeadlessSurface, TerminalSurface};
use rollcall::errors::DisplayError;
use rollcall::pipeline::{PipelineDriver, PipelineReport, PipelineSetup, StopRequest};
use rollcall::recognition::{NullRecognizer, ReferenceSet};
use rollcall::source::{self, FrameSource, ImageDirSource, Point, SourceHandle, SyntheticSource};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Synthetic source resolution
const SYNTHETIC_SIZE: (u32, u32) = (320, 240);

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Image file or directory of images to replay as the capture target
    #[arg(short, long, conflicts_with = "synthetic")]
    pub source: Option<PathBuf>,

    /// Use the built-in moving test pattern as the capture target
    #[arg(long)]
    pub synthetic: bool,

    /// Reference set (JSON) of known names and feature vectors.
    /// No face detector is bundled, so this binary only relays frames and
    /// never matches anyone against it.
    #[arg(short, long)]
    pub references: Option<PathBuf>,

    /// Render nowhere instead of to the terminal
    #[arg(long)]
    pub headless: bool,

    /// Stop after this many displayed frames (headless only)
    #[arg(long)]
    pub frames: Option<u64>,

    /// Config file (default: <config dir>/rollcall/config.json if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Run recognition every Nth tick
    #[arg(long)]
    pub sample_interval: Option<u32>,

    /// Shrink frames by this factor before recognition
    #[arg(long)]
    pub resize_divisor: Option<u32>,

    /// Frames to buffer before playback starts
    #[arg(long)]
    pub fill_threshold: Option<usize>,

    /// Class directory whose attendance table gets today's session.
    /// Without a bundled detector every name is recorded absent.
    #[arg(long)]
    pub attendance: Option<PathBuf>,
}

impl RunArgs {
    /// Whether the run takes over the terminal
    pub fn uses_terminal(&self) -> bool {
        !self.headless
    }

    /// Warning for `--attendance` runs, which can only record absences
    fn attendance_notice(&self) -> Option<String> {
        self.attendance.as_ref().map(|class_dir| {
            format!(
                "No face detector is bundled; attendance in {} will mark every name absent",
                class_dir.display()
            )
        })
    }

    fn apply_overrides(&self, config: &mut PipelineConfig) {
        if let Some(n) = self.sample_interval {
            config.sample_interval = n;
        }
        if let Some(n) = self.resize_divisor {
            config.resize_divisor = n;
        }
        if let Some(n) = self.fill_threshold {
            config.fill_threshold = n;
        }
    }
}

/// Run the pipeline until the source goes away, the user quits or the frame
/// limit is reached
pub fn run_pipeline(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = PipelineConfig::load_or_default(args.config.as_deref())?;
    args.apply_overrides(&mut config);
    config.validate()?;

    let references = match &args.references {
        Some(path) => ReferenceSet::load(path)?,
        None => ReferenceSet::default(),
    };
    if references.is_empty() {
        warn!("No reference set loaded, every face will be labelled unknown");
    }

    let source: Box<dyn FrameSource> = match &args.source {
        Some(target) if !args.synthetic => Box::new(ImageDirSource::open(target, Point::default())?),
        _ => {
            let (width, height) = SYNTHETIC_SIZE;
            Box::new(SyntheticSource::open(width, height, SourceHandle::new())?)
        }
    };

    // Set up Ctrl+C handler
    let stop = StopRequest::new();
    let stop_clone = stop.clone();
    ctrlc::set_handler(move || {
        stop_clone.request();
    })?;

    if let Some(notice) = args.attendance_notice() {
        warn!("{}", notice);
    }

    if args.frames.is_some() && !args.headless {
        warn!("--frames only applies to headless runs");
    }
    let headless = args.headless;
    let frame_limit = args.frames;

    let setup = PipelineSetup {
        config,
        // Face detection is not bundled; regions come only from a linked recognizer
        recognizer: Box::new(NullRecognizer),
        references: references.clone(),
        stop,
        max_ticks: None,
    };

    let driver = PipelineDriver::init(setup, source, move || open_display(headless, frame_limit))?;
    let report = driver.run();
    print_report(&report);

    if let Some(class_dir) = &args.attendance {
        record_attendance(class_dir, &references, &report)?;
    }

    Ok(())
}

fn open_display(
    headless: bool,
    frame_limit: Option<u64>,
) -> Result<Box<dyn DisplaySurface>, DisplayError> {
    if headless {
        let mut surface = HeadlessSurface::new();
        if let Some(limit) = frame_limit {
            surface = surface.with_frame_limit(limit);
        }
        return Ok(Box::new(surface));
    }
    let surface = TerminalSurface::open("rollcall")?;
    Ok(Box::new(surface))
}

fn print_report(report: &PipelineReport) {
    println!("Stopped: {}", report.reason);
    println!(
        "  {} ticks in {:.1}s ({:.1} per second)",
        report.ticks,
        report.elapsed.as_secs_f64(),
        report.counts_per_sec
    );
    println!("  {} recognitions", report.recognitions);
    println!(
        "  {} frames displayed, {} left in queue",
        report.frames_popped, report.frames_left_in_queue
    );
    if report.names_seen.is_empty() {
        println!("  Nobody recognised");
    } else {
        let names: Vec<&str> = report.names_seen.iter().map(String::as_str).collect();
        println!("  Recognised: {}", names.join(", "));
    }
}

/// Mark today's session in the class attendance table
fn record_attendance(
    class_dir: &Path,
    references: &ReferenceSet,
    report: &PipelineReport,
) -> Result<(), Box<dyn std::error::Error>> {
    let sink = JsonAttendanceSink::new(class_dir);
    let mut table = if sink.exists() {
        sink.load()?
    } else {
        AttendanceTable::new()
    };
    table.register(references.names().iter().cloned());

    let today = Local::now().date_naive();
    table.mark_session(today, report.names_seen.iter().map(String::as_str));
    sink.store(&table)?;

    info!(date = %today, present = report.names_seen.len(), "Attendance recorded");
    println!("Attendance saved: {}", sink.path().display());
    Ok(())
}

/// List the image files a directory source would replay
pub fn list_targets(dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let targets = source::list_targets(dir)?;

    if targets.is_empty() {
        println!("No images found in {}.", dir.display());
        return Ok(());
    }

    println!("Capture targets:");
    println!();
    for (index, path) in targets.iter().enumerate() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        match image::image_dimensions(path) {
            Ok((width, height)) => println!("  [{}] {} ({}x{})", index, name, width, height),
            Err(_) => println!("  [{}] {} (unreadable)", index, name),
        }
    }

    Ok(())
}

/// Create (or extend) a class attendance table from a reference set
pub fn init_attendance(
    class_dir: &Path,
    references: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let references = ReferenceSet::load(references)?;
    let sink = JsonAttendanceSink::new(class_dir);

    let mut table = if sink.exists() {
        println!("Extending existing table {}", sink.path().display());
        sink.load()?
    } else {
        AttendanceTable::new()
    };
    table.register(references.names().iter().cloned());
    sink.store(&table)?;

    println!(
        "Attendance table ready: {} ({} names)",
        sink.path().display(),
        references.len()
    );
    Ok(())
}

/// Print a class attendance table
pub fn show_attendance(class_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let sink = JsonAttendanceSink::new(class_dir);
    let table = sink.load()?;

    if table.is_empty() {
        println!("Attendance table is empty.");
        return Ok(());
    }
    print!("{}", table.render());
    Ok(())
}
