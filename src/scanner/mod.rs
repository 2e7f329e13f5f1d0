//! Scanner module - coordinates the probing techniques.
//!
//! The [`ScanEngine`] seeds a [`WorkQueue`] with the target's ports, runs a
//! [`WorkerPool`] of OS threads over it with either the connect or the SYN
//! probe, and assembles the port-ordered [`ScanReport`] once every worker
//! has been joined.

pub mod aggregator;
pub mod packet;
pub mod pool;
pub mod queue;
#[cfg(target_os = "linux")]
pub mod syn;
pub mod tcp;
pub mod traits;

use crate::config::ScanConfiguration;
use crate::error::{ScanError, ScanResult};
use crate::types::ScanTarget;
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub use aggregator::ResultAggregator;
pub use pool::WorkerPool;
pub use queue::WorkQueue;
#[cfg(target_os = "linux")]
pub use syn::SynScanner;
pub use tcp::ConnectScanner;
pub use traits::{PortResult, ProbeOutcome, ScanMode, Scanner};

/// Whether this build can send raw SYN probes at all.
pub const SYN_SCAN_SUPPORTED: bool = cfg!(target_os = "linux");

/// Complete scan results, ready for serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Resolved IPv4 address of the target.
    pub target: String,
    /// Probe strategy actually used, after any fallback.
    pub scan_type: ScanMode,
    /// Milliseconds since the Unix epoch when the report was assembled.
    pub timestamp_ms: i64,
    /// One entry per scanned port, ascending.
    pub results: Vec<PortResult>,
}

impl ScanReport {
    pub fn open_ports(&self) -> impl Iterator<Item = &PortResult> {
        self.results.iter().filter(|r| r.open)
    }

    pub fn open_count(&self) -> usize {
        self.open_ports().count()
    }
}

/// Orchestrates one scan of one target.
pub struct ScanEngine {
    target: ScanTarget,
    config: ScanConfiguration,
    cancel: CancellationToken,
    progress: Option<ProgressBar>,
}

impl ScanEngine {
    pub fn new(target: ScanTarget, config: ScanConfiguration) -> Self {
        Self {
            target,
            config,
            cancel: CancellationToken::new(),
            progress: None,
        }
    }

    /// Stop handing out ports once `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Advance `progress` by one for every probed port.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn target(&self) -> &ScanTarget {
        &self.target
    }

    pub fn config(&self) -> &ScanConfiguration {
        &self.config
    }

    /// Build the probe strategy for this run.
    ///
    /// SYN mode falls back to connect mode for the whole run when the
    /// platform lacks raw sockets or the process lacks the privilege.
    pub fn build_scanner(&self) -> Arc<dyn Scanner> {
        if self.config.mode == ScanMode::Syn {
            match self.syn_scanner() {
                Ok(scanner) => return scanner,
                Err(e) => info!(error = %e, "SYN scan unavailable, falling back to connect scan"),
            }
        }

        Arc::new(
            ConnectScanner::new(self.target.ip, self.config.timeout, self.config.grab_banners)
                .with_banner_timeout_cap(self.config.banner_timeout_cap),
        )
    }

    #[cfg(target_os = "linux")]
    fn syn_scanner(&self) -> ScanResult<Arc<dyn Scanner>> {
        Ok(Arc::new(SynScanner::new(self.target.ip, self.config.timeout)?))
    }

    #[cfg(not(target_os = "linux"))]
    fn syn_scanner(&self) -> ScanResult<Arc<dyn Scanner>> {
        Err(ScanError::Unsupported)
    }

    /// Run the scan with the strategy chosen by [`ScanEngine::build_scanner`].
    pub fn run(self) -> ScanResult<ScanReport> {
        let scanner = self.build_scanner();
        self.run_with(scanner)
    }

    /// Run the scan with an explicit probe strategy.
    ///
    /// Blocks until every worker has exited.
    ///
    /// # Errors
    /// [`ScanError::Cancelled`] if the cancellation token fired, even when
    /// the last port had already been claimed; [`ScanError::Io`] if the
    /// worker threads could not be started.
    pub fn run_with(self, scanner: Arc<dyn Scanner>) -> ScanResult<ScanReport> {
        let ports = self.target.ports();
        let total = ports.len();
        let workers = self.config.worker_count(total);
        let mode = scanner.scan_type();
        let started = Instant::now();

        info!(
            target = %self.target,
            ports = total,
            workers,
            mode = %mode,
            timeout_ms = self.config.timeout.as_millis() as u64,
            "starting scan"
        );

        let queue = Arc::new(WorkQueue::new(ports.iter().copied()));
        let aggregator = Arc::new(ResultAggregator::with_capacity(total));

        WorkerPool::new(workers, scanner, Arc::clone(&queue), Arc::clone(&aggregator))
            .with_cancellation(self.cancel.clone())
            .with_progress(self.progress.clone())
            .run()?;

        let completed = aggregator.len();
        if self.cancel.is_cancelled() {
            warn!(completed, total, "scan cancelled");
            return Err(ScanError::Cancelled { completed, total });
        }

        let results = aggregator.drain_sorted();

        let report = ScanReport {
            target: self.target.ip.to_string(),
            scan_type: mode,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            results,
        };

        info!(
            open = report.open_count(),
            scanned = report.results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "scan finished"
        );

        Ok(report)
    }
}
