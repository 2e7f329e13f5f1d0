//! Command-line interface definitions for portsweep.
//!
//! Uses `clap` derive macros for declarative argument parsing. Settings from
//! the config file fill in whatever the command line leaves unset.

use crate::config::{AppSettings, ScanConfiguration};
use crate::scanner::ScanMode;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// A threaded TCP port scanner with SYN probing and banner grabbing.
#[derive(Parser, Debug)]
#[command(name = "portsweep")]
#[command(version)]
#[command(about = "A threaded TCP connect/SYN port scanner", long_about = None)]
pub struct Args {
    /// Target hostname or IPv4 address
    #[arg(short, long, value_name = "HOST")]
    pub target: String,

    /// Ports to scan (e.g., "80", "1-1024", "22,80,8000-8100")
    #[arg(short, long, value_name = "SPEC")]
    pub ports: String,

    /// Number of worker threads [default: 100]
    #[arg(short = 'm', long, value_name = "N")]
    pub threads: Option<usize>,

    /// Per-probe timeout in milliseconds [default: 800]
    #[arg(long, value_name = "MS")]
    pub timeout: Option<u64>,

    /// Use half-open SYN probes (root on Linux; falls back to connect)
    #[arg(long)]
    pub syn: bool,

    /// Grab service banners from open ports (connect mode only)
    #[arg(long)]
    pub banner: bool,

    /// Path of the JSON report [default: results.json]
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress the progress bar and the summary
    #[arg(short, long)]
    pub quiet: bool,

    /// Settings file to use instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Default log filter for the requested verbosity.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Requested probe strategy.
    pub fn mode(&self) -> ScanMode {
        if self.syn {
            ScanMode::Syn
        } else {
            ScanMode::Connect
        }
    }

    /// Merge flags over `settings` into the per-run configuration.
    pub fn scan_configuration(&self, settings: &AppSettings) -> ScanConfiguration {
        let mut config = ScanConfiguration::from_settings(settings)
            .with_mode(self.mode())
            .with_banners(self.banner);
        if let Some(threads) = self.threads {
            config = config.with_threads(threads);
        }
        if let Some(ms) = self.timeout {
            config = config.with_timeout(Duration::from_millis(ms));
        }
        config
    }

    /// Report destination, from the flag or the settings.
    pub fn output_path(&self, settings: &AppSettings) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| settings.default_output.clone())
    }
}
