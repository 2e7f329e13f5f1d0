//! Thread-safe collection point for port results.

use crate::scanner::traits::PortResult;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Collects results published by workers in arrival order.
///
/// The scan engine drains it once, after every worker has been joined.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    results: Mutex<Vec<PortResult>>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size for the expected number of results.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            results: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    /// Record one finished port.
    pub fn publish(&self, result: PortResult) {
        self.lock().push(result);
    }

    /// Number of results published so far.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Final results sorted ascending by port.
    ///
    /// Leaves the aggregator empty.
    pub fn drain_sorted(&self) -> Vec<PortResult> {
        let mut results = std::mem::take(&mut *self.lock());
        results.sort_by_key(|r| r.port);
        results
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PortResult>> {
        self.results.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
