//! # portsweep - A Threaded TCP Port Scanner
//!
//! portsweep probes the TCP ports of a single IPv4 host, either with a full
//! connect or with a half-open SYN, and optionally records the banner that
//! open services send back.
//!
//! ## Features
//!
//! - **Two Probe Types**: TCP Connect everywhere, SYN Stealth on Linux with raw sockets
//! - **Thread Pool**: A fixed number of OS threads share one work queue
//! - **Banner Grabbing**: Passive read plus an HTTP `HEAD` probe on open ports
//! - **JSON Reports**: Port-ordered results written to disk
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use portsweep::config::ScanConfiguration;
//! use portsweep::scanner::ScanEngine;
//! use portsweep::types::{PortSpec, ScanTarget};
//! use std::net::Ipv4Addr;
//!
//! let ports: PortSpec = "22,80,8000-8100".parse().unwrap();
//! let target = ScanTarget::new("127.0.0.1", Ipv4Addr::LOCALHOST, ports.to_ports());
//! let report = ScanEngine::new(target, ScanConfiguration::new()).run().unwrap();
//!
//! for result in report.open_ports() {
//!     println!("{} open", result.port);
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Port and target types, port-spec parsing, name resolution
//! - [`scanner`] - Probe strategies, work queue, worker pool and scan engine
//! - [`banner`] - Banner grabbing on connected sockets
//! - [`config`] - Settings file and per-run configuration
//! - [`output`] - JSON report writer and console output
//! - [`error`] - Error types

pub mod banner;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod scanner;
pub mod types;

// Re-export commonly used types
pub use error::{CliError, ScanError};
pub use scanner::{PortResult, ScanEngine, ScanMode, ScanReport, Scanner};
pub use types::{Port, PortSpec, ScanTarget};
