// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use rollcall::config;
use rollcall::constants::app_info;
use std::path::PathBuf;
use std::sync::Mutex;

mod cli;

#[derive(Parser)]
#[command(name = "rollcall")]
#[command(about = "Live face recognition overlay and class attendance")]
#[command(version = app_info::version())]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture, annotate and play back a live source
    Run(cli::RunArgs),

    /// List image files a directory source would replay
    Targets {
        /// Directory to scan
        dir: PathBuf,
    },

    /// Class attendance tables
    Attendance {
        #[command(subcommand)]
        command: AttendanceCommand,
    },
}

#[derive(Subcommand)]
enum AttendanceCommand {
    /// Create the table for a class from its reference set
    Init {
        /// Class directory
        dir: PathBuf,

        /// Reference set (JSON) listing the class members
        #[arg(short, long)]
        references: PathBuf,
    },

    /// Print a class's attendance table
    Show {
        /// Class directory
        dir: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let to_file = matches!(&cli.command, Commands::Run(args) if args.uses_terminal());
    init_logging(to_file)?;

    match cli.command {
        Commands::Run(args) => cli::run_pipeline(args),
        Commands::Targets { dir } => cli::list_targets(&dir),
        Commands::Attendance { command } => match command {
            AttendanceCommand::Init { dir, references } => cli::init_attendance(&dir, &references),
            AttendanceCommand::Show { dir } => cli::show_attendance(&dir),
        },
    }
}

/// Initialize logging
///
/// Set RUST_LOG environment variable to control log level.
/// Examples: RUST_LOG=debug, RUST_LOG=rollcall=debug, RUST_LOG=info
///
/// While the terminal renderer owns the screen, logs go to
/// `<state dir>/rollcall/rollcall.log` instead of stderr.
fn init_logging(to_file: bool) -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    if to_file {
        let dir = config::log_directory();
        std::fs::create_dir_all(&dir)?;
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("rollcall.log"))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .init();
    }
    Ok(())
}
