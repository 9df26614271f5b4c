use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A source of timestamps for queues and messages.
///
/// Every arrival time, eligibility check and operation-log entry is read from
/// a `Clock`, so swapping the implementation changes how the whole engine
/// perceives time.
pub trait Clock: Send + Sync + 'static {
    /// Returns the current timestamp in nanoseconds since the UNIX epoch.
    fn now(&self) -> u64;
}

/// Wall-clock time in nanoseconds. A clock set before the epoch reads as zero.
pub(crate) fn wall_clock_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// A clock that uses `std::time::SystemTime`.
///
/// This is the default implementation. It is susceptible to NTP adjustments;
/// the queue clamps backwards steps so its operation log stays ordered.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        wall_clock_ns()
    }
}

/// A clock that uses the CPU's Time-Stamp Counter (TSC) via the `quanta` crate.
///
/// Anchored to `SystemTime` at construction, then advanced by TSC ticks, so it
/// never steps backwards.
#[derive(Debug, Clone)]
pub struct QuantaClock {
    clock: quanta::Clock,
    start_wall_ns: u64,
    start_instant: quanta::Instant,
}

impl Default for QuantaClock {
    fn default() -> Self {
        let clock = quanta::Clock::new();
        let start_instant = clock.now();
        Self {
            clock,
            start_wall_ns: wall_clock_ns(),
            start_instant,
        }
    }
}

impl QuantaClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for QuantaClock {
    fn now(&self) -> u64 {
        let delta = self.clock.now().duration_since(self.start_instant);
        self.start_wall_ns + delta.as_nanos() as u64
    }
}

/// A clock chosen at runtime from a [`ClockSource`](super::ClockSource).
#[derive(Debug, Clone)]
pub enum ConfiguredClock {
    System(SystemClock),
    Quanta(QuantaClock),
}

impl Clock for ConfiguredClock {
    fn now(&self) -> u64 {
        match self {
            ConfiguredClock::System(clock) => clock.now(),
            ConfiguredClock::Quanta(clock) => clock.now(),
        }
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying instant, so a test can hand one clone to a
/// queue and keep another to drive time forward.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ns: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock frozen at `start_ns`.
    pub fn new(start_ns: u64) -> Self {
        Self {
            now_ns: Arc::new(AtomicU64::new(start_ns)),
        }
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let by_ns = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.now_ns.fetch_add(by_ns, Ordering::SeqCst);
    }

    /// Jumps the clock to an absolute instant. May move backwards.
    pub fn set(&self, now_ns: u64) {
        self.now_ns.store(now_ns, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now_ns.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(100);
        let handle = clock.clone();
        handle.advance(Duration::from_nanos(50));
        assert_eq!(clock.now(), 150);
        handle.set(10);
        assert_eq!(clock.now(), 10);
    }

    #[test]
    fn quanta_clock_does_not_go_backwards() {
        let clock = QuantaClock::new();
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }

    #[test]
    fn system_clock_is_after_epoch() {
        assert!(SystemClock.now() > 0);
    }
}
