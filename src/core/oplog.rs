//! Append-only log of operation timestamps and the peak-load query over it.

use std::time::Duration;

/// Chronological record of submit/retrieve calls, in nanoseconds.
///
/// Entries are non-decreasing: [`record`](OperationLog::record) clamps a
/// reading older than the last entry up to that entry and reports it.
#[derive(Debug, Clone, Default)]
pub struct OperationLog {
    entries: Vec<u64>,
}

impl OperationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `at_ns`, returning the value actually logged.
    pub fn record(&mut self, at_ns: u64) -> u64 {
        let logged = match self.entries.last() {
            Some(&last) if at_ns < last => {
                log::warn!(
                    "clock moved backwards by {} ns; clamping operation timestamp",
                    last - at_ns
                );
                last
            }
            _ => at_ns,
        };
        self.entries.push(logged);
        logged
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<u64> {
        self.entries.last().copied()
    }

    /// Largest number of entries inside any closed window
    /// `[anchor, anchor + window]` anchored at a logged timestamp.
    ///
    /// A log with fewer than two entries reports 1.
    pub fn peak(&self, window: Duration) -> usize {
        if self.entries.len() < 2 {
            return 1;
        }
        let window_ns = u64::try_from(window.as_nanos()).unwrap_or(u64::MAX);

        // Two pointers: `end` only moves forward because anchors are sorted.
        let mut best = 1;
        let mut end = 0;
        for (start, &anchor) in self.entries.iter().enumerate() {
            let limit = anchor.saturating_add(window_ns);
            if end < start {
                end = start;
            }
            while end + 1 < self.entries.len() && self.entries[end + 1] <= limit {
                end += 1;
            }
            best = best.max(end - start + 1);
        }
        best
    }
}
