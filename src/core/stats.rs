//! Point-in-time statistics for a delay queue.

use std::time::Duration;

/// Snapshot of a queue's counters, taken under its lock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Configured delay.
    pub delay: Duration,

    /// Messages waiting out their delay.
    pub pending: usize,

    /// Messages eligible for delivery.
    pub ready: usize,

    /// Successful submits since construction.
    pub processed: u64,

    /// Transient messages dropped because they expired before promotion.
    pub discarded: u64,

    /// Submit and retrieve calls recorded in the operation log.
    pub operations: usize,
}

impl QueueStats {
    /// Messages currently held, pending or ready.
    pub fn held(&self) -> usize {
        self.pending + self.ready
    }

    /// Get summary string.
    pub fn summary(&self) -> String {
        format!(
            "Delay: {:?}, Pending: {}, Ready: {}, Processed: {}, Discarded: {}, Operations: {}",
            self.delay, self.pending, self.ready, self.processed, self.discarded, self.operations
        )
    }
}
