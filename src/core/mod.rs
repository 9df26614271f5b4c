//! The delay-queue engine and the message model it carries.

pub mod clock;
pub mod config;
pub mod error;
pub mod kind;
pub mod message;
pub mod oplog;
pub mod queue;
pub mod stats;

pub use clock::{Clock, ConfiguredClock, ManualClock, QuantaClock, SystemClock};
pub use config::{ClockSource, QueueConfig};
pub use error::{Error, Result};
pub use kind::{BasicKind, Kind, KindRegistry, MessageKind};
pub use message::{ActorId, Message, MessageBuilder, MessageId, Timestamped};
pub use oplog::OperationLog;
pub use queue::{DelayQueue, SubmitOutcome};
pub use stats::QueueStats;
