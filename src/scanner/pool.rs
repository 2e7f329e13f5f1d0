//! Fixed-size pool of worker threads draining the work queue.

use crate::error::{ScanError, ScanResult};
use crate::scanner::aggregator::ResultAggregator;
use crate::scanner::queue::WorkQueue;
use crate::scanner::traits::Scanner;
use indicatif::ProgressBar;
use std::sync::Arc;
use std::thread;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

/// Runs a probe strategy over every queued port on `workers` OS threads.
///
/// Each worker loops until the queue is empty or the cancellation token
/// fires: pop a port, probe it, publish the result, advance the progress
/// bar. The token is only checked between ports, so probes in flight
/// always finish.
pub struct WorkerPool {
    workers: usize,
    scanner: Arc<dyn Scanner>,
    queue: Arc<WorkQueue>,
    aggregator: Arc<ResultAggregator>,
    cancel: CancellationToken,
    progress: Option<ProgressBar>,
}

impl WorkerPool {
    pub fn new(
        workers: usize,
        scanner: Arc<dyn Scanner>,
        queue: Arc<WorkQueue>,
        aggregator: Arc<ResultAggregator>,
    ) -> Self {
        Self {
            workers: workers.max(1),
            scanner,
            queue,
            aggregator,
            cancel: CancellationToken::new(),
            progress: None,
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, progress: Option<ProgressBar>) -> Self {
        self.progress = progress;
        self
    }

    /// Spawn every worker and block until all of them have exited.
    ///
    /// # Errors
    /// Returns [`ScanError::Io`] if a thread cannot be spawned, or
    /// [`ScanError::WorkerPanicked`] if a worker died and its claimed port
    /// has no result. Workers that were running are always joined first.
    pub fn run(self) -> ScanResult<()> {
        let mut handles = Vec::with_capacity(self.workers);
        let mut spawn_error = None;

        for id in 0..self.workers {
            let worker = Worker {
                id,
                scanner: Arc::clone(&self.scanner),
                queue: Arc::clone(&self.queue),
                aggregator: Arc::clone(&self.aggregator),
                cancel: self.cancel.clone(),
                progress: self.progress.clone(),
            };

            match thread::Builder::new()
                .name(format!("portsweep-worker-{}", id))
                .spawn(move || worker.run())
            {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    error!(worker = id, error = %e, "failed to spawn worker thread");
                    spawn_error = Some(e);
                    break;
                }
            }
        }

        if spawn_error.is_some() {
            // Let the workers that did start wind down quickly.
            self.cancel.cancel();
        }

        let mut panicked = 0;
        for handle in handles {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                error!(thread = %name, "worker thread panicked");
                panicked += 1;
            }
        }

        if let Some(e) = spawn_error {
            return Err(ScanError::Io(e));
        }
        if panicked > 0 {
            return Err(ScanError::WorkerPanicked(panicked));
        }
        Ok(())
    }
}

/// State owned by a single worker thread.
struct Worker {
    id: usize,
    scanner: Arc<dyn Scanner>,
    queue: Arc<WorkQueue>,
    aggregator: Arc<ResultAggregator>,
    cancel: CancellationToken,
    progress: Option<ProgressBar>,
}

impl Worker {
    fn run(self) {
        let mut scanned = 0usize;

        while !self.cancel.is_cancelled() {
            let Some(port) = self.queue.pop() else {
                break;
            };

            let result = self.scanner.scan_port(port);
            trace!(worker = self.id, port = %port, open = result.open, "probed");

            if let Some(pb) = &self.progress {
                pb.inc(1);
                if result.open {
                    pb.set_message(format!("open: {}", port));
                }
            }

            self.aggregator.publish(result);
            scanned += 1;
        }

        debug!(worker = self.id, scanned, "worker finished");
    }
}
