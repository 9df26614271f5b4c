//! Fan-out of messages to per-recipient delay queues.
//!
//! A [`Hub`] owns one [`DelayQueue`] per registered recipient, all built with
//! the same delay and clock. Sending a message submits it to the queue of
//! every registered recipient it names; each recipient then consumes its own
//! queue independently.
//!
//! ```text
//!               ┌──────────────┐
//!   send(msg) ─►│     Hub      │
//!               └──┬───────┬───┘
//!                  │       │   one submit per named, registered recipient
//!                  ▼       ▼
//!            ┌────────┐ ┌────────┐
//!            │ queue A│ │ queue B│   independent locks, no shared state
//!            └────────┘ └────────┘
//!                  │       │
//!              next(A)   drain(B)
//! ```
//!
//! Identity issuance, credentials and external feeds belong to the caller;
//! the hub only knows recipient ids.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use timedelay::core::{ActorId, ManualClock, Message};
//! use timedelay::hub::Hub;
//!
//! let clock = ManualClock::new(0);
//! let hub = Hub::with_clock(Duration::from_millis(10), clock.clone());
//! let (alice, bob) = (ActorId::random(), ActorId::random());
//! hub.register(alice);
//! hub.register(bob);
//!
//! let msg = Message::to_many(ActorId::random(), [alice, bob], "hi both")?;
//! let delivery = hub.send(&msg);
//! assert_eq!(delivery.accepted.len(), 2);
//!
//! clock.advance(Duration::from_millis(10));
//! assert_eq!(hub.next(alice), Some(msg.clone()));
//! assert_eq!(hub.drain(bob), vec![msg]);
//! # Ok::<(), timedelay::core::Error>(())
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use log::{debug, info};

use crate::core::{
    ActorId, Clock, ConfiguredClock, DelayQueue, Message, MessageId, QueueConfig, Result,
    SubmitOutcome, SystemClock,
};

/// Per-recipient outcome of [`Hub::send`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Recipients whose queue accepted the message.
    pub accepted: Vec<ActorId>,
    /// Recipients whose queue already held a message with the same id.
    pub duplicate: Vec<ActorId>,
    /// Recipients named by the message but not registered with the hub.
    pub unknown: Vec<ActorId>,
}

impl Delivery {
    /// True when every named recipient accepted the message.
    pub fn is_complete(&self) -> bool {
        self.duplicate.is_empty() && self.unknown.is_empty()
    }
}

/// Registry of per-recipient delay queues.
pub struct Hub<C: Clock + Clone = SystemClock> {
    delay: Duration,
    clock: C,
    queues: RwLock<HashMap<ActorId, Arc<DelayQueue<C>>>>,
}

impl Hub<SystemClock> {
    pub fn new(delay: Duration) -> Self {
        Self::with_clock(delay, SystemClock)
    }
}

impl Hub<ConfiguredClock> {
    /// Creates a hub whose queues all use `config`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDelay` if the configured delay is negative.
    pub fn from_config(config: &QueueConfig) -> Result<Self> {
        Ok(Self::with_clock(config.delay()?, config.clock.build()))
    }
}

impl<C: Clock + Clone> Hub<C> {
    pub fn with_clock(delay: Duration, clock: C) -> Self {
        Self {
            delay,
            clock,
            queues: RwLock::new(HashMap::new()),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Creates an empty queue for `recipient`. Returns false if one exists.
    pub fn register(&self, recipient: ActorId) -> bool {
        let mut queues = self.write();
        if queues.contains_key(&recipient) {
            return false;
        }
        let queue = DelayQueue::with_clock(self.delay, self.clock.clone());
        queues.insert(recipient, Arc::new(queue));
        info!("registered recipient {recipient}");
        true
    }

    /// Drops `recipient` and everything still queued for it.
    pub fn unregister(&self, recipient: ActorId) -> bool {
        let removed = self.write().remove(&recipient).is_some();
        if removed {
            info!("unregistered recipient {recipient}");
        }
        removed
    }

    pub fn is_registered(&self, recipient: ActorId) -> bool {
        self.read().contains_key(&recipient)
    }

    /// Registered recipients, sorted.
    pub fn recipients(&self) -> Vec<ActorId> {
        let mut recipients: Vec<ActorId> = self.read().keys().copied().collect();
        recipients.sort();
        recipients
    }

    /// Direct handle to a recipient's queue.
    pub fn queue(&self, recipient: ActorId) -> Option<Arc<DelayQueue<C>>> {
        self.read().get(&recipient).cloned()
    }

    /// Submits `message` to the queue of every registered recipient it names.
    ///
    /// A recipient listed more than once is only submitted to once. The
    /// registry lock is released before any queue is touched.
    pub fn send(&self, message: &Message) -> Delivery {
        let mut seen = HashSet::new();
        let targets: Vec<(ActorId, Option<Arc<DelayQueue<C>>>)> = {
            let queues = self.read();
            message
                .recipients()
                .iter()
                .filter(|recipient| seen.insert(**recipient))
                .map(|recipient| (*recipient, queues.get(recipient).cloned()))
                .collect()
        };

        let mut delivery = Delivery::default();
        for (recipient, queue) in targets {
            match queue {
                None => {
                    debug!("message {} names unknown recipient {recipient}", message.id());
                    delivery.unknown.push(recipient);
                }
                Some(queue) => match queue.submit(message.clone()) {
                    SubmitOutcome::Accepted => delivery.accepted.push(recipient),
                    SubmitOutcome::Duplicate => delivery.duplicate.push(recipient),
                },
            }
        }
        delivery
    }

    /// Retrieves the next eligible message for `recipient`. `None` if nothing
    /// is eligible or the recipient is unknown.
    pub fn next(&self, recipient: ActorId) -> Option<Message> {
        self.queue(recipient)?.retrieve()
    }

    /// Retrieves every eligible message for `recipient`, in delivery order.
    pub fn drain(&self, recipient: ActorId) -> Vec<Message> {
        self.queue(recipient)
            .map(|queue| queue.retrieve_all())
            .unwrap_or_default()
    }

    /// Whether `id` is still waiting in `recipient`'s queue, pending or ready.
    /// `None` if the recipient is unknown.
    pub fn is_enqueued(&self, id: MessageId, recipient: ActorId) -> Option<bool> {
        self.queue(recipient).map(|queue| queue.contains(id))
    }

    /// [`is_enqueued`](Self::is_enqueued) for each recipient, in order.
    pub fn is_enqueued_for(&self, id: MessageId, recipients: &[ActorId]) -> Vec<Option<bool>> {
        recipients
            .iter()
            .map(|recipient| self.is_enqueued(id, *recipient))
            .collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<ActorId, Arc<DelayQueue<C>>>> {
        self.queues.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ActorId, Arc<DelayQueue<C>>>> {
        self.queues.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ManualClock;

    const DELAY: Duration = Duration::from_millis(20);

    fn hub() -> (Hub<ManualClock>, ManualClock) {
        let clock = ManualClock::new(0);
        (Hub::with_clock(DELAY, clock.clone()), clock)
    }

    #[test]
    fn register_is_idempotent() {
        let (hub, _clock) = hub();
        let alice = ActorId::random();
        assert!(hub.register(alice));
        assert!(!hub.register(alice));
        assert_eq!(hub.recipients(), vec![alice]);
        assert!(hub.unregister(alice));
        assert!(!hub.unregister(alice));
        assert!(!hub.is_registered(alice));
    }

    #[test]
    fn send_reports_unknown_and_duplicate_recipients() {
        let (hub, _clock) = hub();
        let alice = ActorId::random();
        let stranger = ActorId::random();
        hub.register(alice);

        let msg = Message::to_many(ActorId::random(), [alice, stranger, alice], "x")
            .expect("message");
        let first = hub.send(&msg);
        assert_eq!(first.accepted, vec![alice]);
        assert_eq!(first.unknown, vec![stranger]);
        assert!(first.duplicate.is_empty());
        assert!(!first.is_complete());

        let second = hub.send(&msg);
        assert_eq!(second.duplicate, vec![alice]);
        assert!(second.accepted.is_empty());
    }

    #[test]
    fn recipients_consume_independently() {
        let (hub, clock) = hub();
        let alice = ActorId::random();
        let bob = ActorId::random();
        hub.register(alice);
        hub.register(bob);

        let msg = Message::to_many(ActorId::random(), [alice, bob], "both").expect("message");
        assert!(hub.send(&msg).is_complete());
        assert_eq!(hub.next(alice), None);

        clock.advance(DELAY);
        assert_eq!(hub.next(alice), Some(msg.clone()));
        assert_eq!(hub.is_enqueued(msg.id(), alice), Some(false));
        assert_eq!(hub.is_enqueued(msg.id(), bob), Some(true));
        assert_eq!(hub.drain(bob), vec![msg]);
    }

    #[test]
    fn unknown_recipient_reads_are_empty() {
        let (hub, _clock) = hub();
        let ghost = ActorId::random();
        assert_eq!(hub.next(ghost), None);
        assert!(hub.drain(ghost).is_empty());
        assert_eq!(hub.is_enqueued(MessageId::random(), ghost), None);
        assert!(hub.queue(ghost).is_none());
    }

    #[test]
    fn is_enqueued_for_preserves_order() {
        let (hub, _clock) = hub();
        let alice = ActorId::random();
        let bob = ActorId::random();
        let ghost = ActorId::random();
        hub.register(alice);
        hub.register(bob);
        let msg = Message::new(ActorId::random(), alice, "just alice");
        hub.send(&msg);
        assert_eq!(
            hub.is_enqueued_for(msg.id(), &[alice, bob, ghost]),
            vec![Some(true), Some(false), None]
        );
    }
}
