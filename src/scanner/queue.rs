//! Shared work queue of pending ports.

use crate::types::Port;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Ports waiting to be probed.
///
/// Every `pop` hands a distinct port to exactly one caller. Access is
/// serialized by an internal lock that is never held while probing.
#[derive(Debug, Default)]
pub struct WorkQueue {
    pending: Mutex<VecDeque<Port>>,
}

impl WorkQueue {
    /// Seed a queue with the full port set, in the given order.
    pub fn new(ports: impl IntoIterator<Item = Port>) -> Self {
        Self {
            pending: Mutex::new(ports.into_iter().collect()),
        }
    }

    /// Claim the next port, or `None` once the queue is drained.
    pub fn pop(&self) -> Option<Port> {
        self.lock().pop_front()
    }

    /// Number of ports not yet claimed.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Port>> {
        // A worker that panicked mid-pop cannot leave the deque half-updated.
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    fn ports(range: std::ops::RangeInclusive<u16>) -> Vec<Port> {
        range.filter_map(Port::new).collect()
    }

    #[test]
    fn test_pop_in_order_then_empty() {
        let queue = WorkQueue::new(ports(1..=3));
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop().map(Port::as_u16), Some(1));
        assert_eq!(queue.pop().map(Port::as_u16), Some(2));
        assert_eq!(queue.pop().map(Port::as_u16), Some(3));
        assert_eq!(queue.pop(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_concurrent_pops_are_exclusive() {
        let queue = Arc::new(WorkQueue::new(ports(1..=5000)));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    let mut claimed = Vec::new();
                    while let Some(port) = queue.pop() {
                        claimed.push(port);
                    }
                    claimed
                })
            })
            .collect();

        let mut seen = HashSet::new();
        let mut total = 0;
        for handle in handles {
            for port in handle.join().unwrap() {
                assert!(seen.insert(port), "port {port} claimed twice");
                total += 1;
            }
        }
        assert_eq!(total, 5000);
        assert!(queue.is_empty());
    }
}
