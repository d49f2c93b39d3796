use std::path::PathBuf;

use clap::{Parser as ClapParser, ValueEnum};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\nwavenc ",
    env!("WAVENC_VERSION"),
    "\nbuilt ",
    env!("BUILD_TIMESTAMP"),
);

#[derive(Debug, ClapParser)]
#[command(
    name         = env!("CARGO_PKG_NAME"),
    version      = env!("CARGO_PKG_VERSION"),
    long_version = LONG_VERSION,
    author       = env!("CARGO_PKG_AUTHORS"),
    about        = "Convert every WAV file in a folder to MP3",
    long_about   = None,
)]
pub struct Cli {
    /// Folder holding the .wav files (not searched recursively).
    #[arg(value_name = "FOLDER")]
    pub folder: PathBuf,

    /// Number of encoder threads [default: number of logical CPUs].
    #[arg(long, short = 'j', value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub jobs: Option<u32>,

    /// Write outputs here instead of next to each source.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// LAME algorithm quality, 0 (best, slowest) to 9 (worst, fastest).
    #[arg(long, short = 'q', value_name = "0-9", default_value_t = 5, value_parser = clap::value_parser!(u8).range(0..=9))]
    pub quality: u8,

    /// Write a YAML summary of the run to this file.
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Set the log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show a progress bar while converting.
    #[arg(long)]
    pub progress: bool,
}

impl Cli {
    pub fn workers(&self) -> usize {
        self.jobs
            .and_then(|jobs| usize::try_from(jobs).ok())
            .unwrap_or_else(num_cpus::get)
            .max(1)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    /// Convert LogLevel to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text with second-resolution timestamps.
    Plain,
    /// Structured JSON per log record.
    Json,
}
