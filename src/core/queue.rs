//! The delay queue engine.
//!
//! A [`DelayQueue`] holds every submitted message invisible for a fixed delay,
//! then releases it in order of the message's own timestamp.
//!
//! ```text
//!  submit ──► pending (FIFO by arrival) ──promotion──► ready (min by timestamp) ──► retrieve
//!                     │
//!                     └── expired transient messages are dropped here
//! ```
//!
//! Promotion is lazy: it runs at the start of every [`retrieve`](DelayQueue::retrieve),
//! [`peek`](DelayQueue::peek) and [`retrieve_all`](DelayQueue::retrieve_all).
//! Nothing ever blocks waiting for a message to become eligible; callers poll.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use timedelay::core::{ActorId, DelayQueue, ManualClock, Message, SubmitOutcome};
//!
//! let clock = ManualClock::new(0);
//! let queue = DelayQueue::with_clock(Duration::from_millis(40), clock.clone());
//!
//! let msg = Message::new(ActorId::random(), ActorId::random(), "hello");
//! assert_eq!(queue.submit(msg.clone()), SubmitOutcome::Accepted);
//! assert_eq!(queue.retrieve(), None);
//!
//! clock.advance(Duration::from_millis(40));
//! assert_eq!(queue.retrieve(), Some(msg));
//! ```

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, trace};

use super::clock::{Clock, ConfiguredClock, SystemClock};
use super::config::QueueConfig;
use super::error::Result;
use super::message::{Message, MessageId};
use super::oplog::OperationLog;
use super::stats::QueueStats;

/// Result of [`DelayQueue::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum SubmitOutcome {
    /// The message was enqueued.
    Accepted,
    /// A message with the same id is already held; nothing changed.
    Duplicate,
}

impl SubmitOutcome {
    pub fn is_accepted(self) -> bool {
        self == SubmitOutcome::Accepted
    }
}

struct PendingEntry {
    message: Message,
    arrival_ns: u64,
}

impl PendingEntry {
    fn expired(&self, now_ns: u64) -> bool {
        match self.message.lifetime() {
            Some(lifetime) => now_ns >= self.arrival_ns.saturating_add(duration_ns(lifetime)),
            None => false,
        }
    }
}

/// Ready-area entry, ordered by message timestamp then promotion order.
struct ReadyEntry {
    message: Message,
    seq: u64,
}

impl ReadyEntry {
    fn key(&self) -> (u64, u64) {
        (self.message.timestamp_ns(), self.seq)
    }
}

impl PartialEq for ReadyEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for ReadyEntry {}

impl PartialOrd for ReadyEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ReadyEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<PendingEntry>,
    ready: BinaryHeap<Reverse<ReadyEntry>>,
    /// Ids held in `pending` or `ready`.
    held: HashSet<MessageId>,
    ops: OperationLog,
    processed: u64,
    discarded: u64,
    next_seq: u64,
}

impl QueueState {
    /// Latest instant the queue has observed, so readings never step back.
    fn observe(&self, clock_ns: u64) -> u64 {
        self.ops.last().map_or(clock_ns, |last| clock_ns.max(last))
    }

    fn pop_ready(&mut self) -> Option<Message> {
        let Reverse(entry) = self.ready.pop()?;
        self.held.remove(&entry.message.id());
        Some(entry.message)
    }
}

/// A time-delayed, deduplicating message queue.
///
/// All state sits behind one mutex; every public method takes it exactly once,
/// so each call is atomic with respect to every other call on the same queue.
/// Separate queues share nothing.
pub struct DelayQueue<C: Clock = SystemClock> {
    delay: Duration,
    delay_ns: u64,
    clock: C,
    state: Mutex<QueueState>,
}

impl DelayQueue<SystemClock> {
    /// Creates a queue on the system clock.
    pub fn new(delay: Duration) -> Self {
        Self::with_clock(delay, SystemClock)
    }
}

impl DelayQueue<ConfiguredClock> {
    /// Creates a queue from configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDelay` if the configured delay is negative.
    pub fn from_config(config: &QueueConfig) -> Result<Self> {
        Ok(Self::with_clock(config.delay()?, config.clock.build()))
    }
}

impl<C: Clock> DelayQueue<C> {
    /// Creates a queue with a custom clock source (e.g., TSC-based or manual).
    pub fn with_clock(delay: Duration, clock: C) -> Self {
        Self {
            delay,
            delay_ns: duration_ns(delay),
            clock,
            state: Mutex::new(QueueState::default()),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Enqueues `message` unless one with the same id is already held.
    ///
    /// An accepted message is stamped with the current time as its arrival,
    /// logged as an operation and counted toward
    /// [`total_processed`](Self::total_processed). A duplicate changes nothing.
    pub fn submit(&self, message: Message) -> SubmitOutcome {
        let mut state = self.lock();
        let id = message.id();
        if state.held.contains(&id) {
            debug!("rejecting duplicate message {id}");
            return SubmitOutcome::Duplicate;
        }
        let arrival_ns = state.ops.record(self.clock.now());
        state.held.insert(id);
        state.pending.push_back(PendingEntry {
            message,
            arrival_ns,
        });
        state.processed += 1;
        SubmitOutcome::Accepted
    }

    /// Removes and returns the earliest-timestamped eligible message.
    ///
    /// The call is logged as an operation whether or not a message is returned.
    pub fn retrieve(&self) -> Option<Message> {
        let mut state = self.lock();
        let now = state.ops.record(self.clock.now());
        self.promote(&mut state, now);
        state.pop_ready()
    }

    /// Returns the message [`retrieve`](Self::retrieve) would return, without
    /// removing it. Not logged as an operation.
    pub fn peek(&self) -> Option<Message> {
        let mut state = self.lock();
        let now = state.observe(self.clock.now());
        self.promote(&mut state, now);
        state.ready.peek().map(|Reverse(entry)| entry.message.clone())
    }

    /// Retrieves every currently eligible message, in delivery order.
    ///
    /// Each returned message counts as one logged retrieve.
    pub fn retrieve_all(&self) -> Vec<Message> {
        let mut state = self.lock();
        let mut delivered = Vec::new();
        loop {
            let now = state.observe(self.clock.now());
            self.promote(&mut state, now);
            if state.ready.is_empty() {
                break;
            }
            state.ops.record(now);
            if let Some(message) = state.pop_ready() {
                delivered.push(message);
            }
        }
        delivered
    }

    /// Whether a message with `id` is pending or ready.
    ///
    /// Does not promote, so a message that became eligible since the last
    /// retrieve/peek is still reported as held.
    pub fn contains(&self, id: MessageId) -> bool {
        self.lock().held.contains(&id)
    }

    /// Number of successful submits since construction.
    pub fn total_processed(&self) -> u64 {
        self.lock().processed
    }

    /// Largest number of submit/retrieve calls that fell inside any window of
    /// length `window` starting at a logged call.
    ///
    /// Returns 1 when fewer than two calls have been logged.
    pub fn peak_load(&self, window: Duration) -> usize {
        self.lock().ops.peak(window)
    }

    pub fn stats(&self) -> QueueStats {
        let state = self.lock();
        QueueStats {
            delay: self.delay,
            pending: state.pending.len(),
            ready: state.ready.len(),
            processed: state.processed,
            discarded: state.discarded,
            operations: state.ops.len(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // Every mutation completes before anything that could panic, so a
        // poisoned lock still guards consistent state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves eligible pending entries into the ready area, dropping expired
    /// transient messages on the way.
    ///
    /// Eligibility is `arrival + delay`. With one delay for the whole queue
    /// that is monotonic in arrival order, so the scan stops at the first
    /// entry that is not yet eligible. Per-message delays would break this:
    /// pending would then have to be a min-heap keyed by eligibility time.
    fn promote(&self, state: &mut QueueState, now_ns: u64) {
        while let Some(front) = state.pending.front() {
            if now_ns < front.arrival_ns.saturating_add(self.delay_ns) {
                break;
            }
            let Some(entry) = state.pending.pop_front() else {
                break;
            };
            let id = entry.message.id();
            if entry.expired(now_ns) {
                debug!("discarding expired transient message {id}");
                state.held.remove(&id);
                state.discarded += 1;
                continue;
            }
            trace!("promoting message {id}");
            let seq = state.next_seq;
            state.next_seq += 1;
            state.ready.push(Reverse(ReadyEntry {
                message: entry.message,
                seq,
            }));
        }
    }
}

fn duration_ns(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}
