//! Time-delayed, deduplicating in-memory message queue.
//!
//! Messages submitted to a [`DelayQueue`] stay invisible for a fixed delay,
//! are then delivered in timestamp order, and transient messages that outlive
//! their lifetime before delivery are dropped. Every queue also keeps a log
//! of its submit/retrieve calls for peak-load queries.
//!
//! [`hub::Hub`] fans messages out to one queue per recipient.

pub mod core;
pub mod hub;

pub use crate::core::{
    ActorId, Clock, DelayQueue, Error, Kind, Message, MessageId, QueueConfig, Result,
    SubmitOutcome,
};
pub use hub::{Delivery, Hub};
