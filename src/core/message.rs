//! Immutable message values.
//!
//! A [`Message`] is built once, by a producer, and never changes afterwards.
//! Identity is the [`MessageId`]: two messages with the same id are the same
//! message regardless of content, which is what the queue deduplicates on.
//!
//! A message whose `lifetime` is set is *transient*: it expires `lifetime`
//! after it arrives at a queue (not after its creation timestamp) and is
//! silently dropped if it has not been promoted by then.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use uuid::Uuid;

use super::clock::wall_clock_ns;
use super::error::{Error, Result};
use super::kind::Kind;

/// Unique message identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(Uuid);

impl MessageId {
    /// A fresh random (v4) identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The all-zero id. Never produced by [`MessageId::random`].
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identity of a sender or recipient. Issued by the surrounding system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(Uuid);

impl ActorId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Anything with an identity, a creation time and a kind.
pub trait Timestamped {
    fn id(&self) -> MessageId;

    /// Creation time in nanoseconds since the UNIX epoch.
    fn timestamp_ns(&self) -> u64;

    fn kind(&self) -> &Kind;
}

#[derive(Clone)]
pub struct Message {
    id: MessageId,
    timestamp_ns: u64,
    sender: ActorId,
    recipients: Vec<ActorId>,
    content: Vec<u8>,
    kind: Kind,
    lifetime: Option<Duration>,
}

impl Message {
    /// A simple, non-transient message to one recipient, stamped now.
    pub fn new(sender: ActorId, recipient: ActorId, content: impl Into<Vec<u8>>) -> Self {
        Self {
            id: MessageId::random(),
            timestamp_ns: wall_clock_ns(),
            sender,
            recipients: vec![recipient],
            content: content.into(),
            kind: Kind::simple(),
            lifetime: None,
        }
    }

    /// A simple, non-transient message to several recipients, stamped now.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoRecipients` if `recipients` is empty.
    pub fn to_many(
        sender: ActorId,
        recipients: impl IntoIterator<Item = ActorId>,
        content: impl Into<Vec<u8>>,
    ) -> Result<Self> {
        Self::builder(sender)
            .recipients(recipients)
            .content(content)
            .build()
    }

    /// A transient message to one recipient that expires `lifetime` after
    /// arriving at a queue.
    pub fn transient(
        sender: ActorId,
        recipient: ActorId,
        content: impl Into<Vec<u8>>,
        lifetime: Duration,
    ) -> Self {
        Self {
            lifetime: Some(lifetime),
            ..Self::new(sender, recipient, content)
        }
    }

    /// Starts an explicit construction; unset fields default to a random id,
    /// the current time and [`Kind::simple`].
    pub fn builder(sender: ActorId) -> MessageBuilder {
        MessageBuilder::new(sender)
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    /// Creation time in nanoseconds since the UNIX epoch.
    pub fn timestamp_ns(&self) -> u64 {
        self.timestamp_ns
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn sender(&self) -> ActorId {
        self.sender
    }

    /// Recipients in the order they were given. Never empty.
    pub fn recipients(&self) -> &[ActorId] {
        &self.recipients
    }

    pub fn is_addressed_to(&self, actor: ActorId) -> bool {
        self.recipients.contains(&actor)
    }

    /// Opaque payload.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// The payload as UTF-8, if it is.
    pub fn content_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }

    pub fn is_transient(&self) -> bool {
        self.lifetime.is_some()
    }

    /// How long a transient message survives after arrival. `None` for
    /// non-transient messages.
    pub fn lifetime(&self) -> Option<Duration> {
        self.lifetime
    }
}

impl Timestamped for Message {
    fn id(&self) -> MessageId {
        Message::id(self)
    }

    fn timestamp_ns(&self) -> u64 {
        Message::timestamp_ns(self)
    }

    fn kind(&self) -> &Kind {
        Message::kind(self)
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Message {}

impl Hash for Message {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("id", &self.id)
            .field("timestamp_ns", &self.timestamp_ns)
            .field("sender", &self.sender)
            .field("recipients", &self.recipients)
            .field("content_len", &self.content.len())
            .field("kind", &self.kind)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.content_str() {
            Some(text) => write!(f, "{}: ({}) {}", self.id, self.timestamp_ns, text),
            None => write!(
                f,
                "{}: ({}) <{} bytes>",
                self.id,
                self.timestamp_ns,
                self.content.len()
            ),
        }
    }
}

/// Explicit construction of a [`Message`].
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    id: Option<MessageId>,
    timestamp_ns: Option<u64>,
    sender: ActorId,
    recipients: Vec<ActorId>,
    content: Vec<u8>,
    kind: Kind,
    lifetime: Option<Duration>,
}

impl MessageBuilder {
    fn new(sender: ActorId) -> Self {
        Self {
            id: None,
            timestamp_ns: None,
            sender,
            recipients: Vec::new(),
            content: Vec::new(),
            kind: Kind::simple(),
            lifetime: None,
        }
    }

    pub fn id(mut self, id: MessageId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn timestamp_ns(mut self, timestamp_ns: u64) -> Self {
        self.timestamp_ns = Some(timestamp_ns);
        self
    }

    pub fn recipient(mut self, recipient: ActorId) -> Self {
        self.recipients.push(recipient);
        self
    }

    pub fn recipients(mut self, recipients: impl IntoIterator<Item = ActorId>) -> Self {
        self.recipients.extend(recipients);
        self
    }

    pub fn content(mut self, content: impl Into<Vec<u8>>) -> Self {
        self.content = content.into();
        self
    }

    pub fn kind(mut self, kind: impl Into<Kind>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Makes the message transient.
    pub fn lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = Some(lifetime);
        self
    }

    /// # Errors
    ///
    /// Returns `Error::NoRecipients` if no recipient was added.
    pub fn build(self) -> Result<Message> {
        if self.recipients.is_empty() {
            return Err(Error::NoRecipients);
        }
        Ok(Message {
            id: self.id.unwrap_or_else(MessageId::random),
            timestamp_ns: self.timestamp_ns.unwrap_or_else(wall_clock_ns),
            sender: self.sender,
            recipients: self.recipients,
            content: self.content,
            kind: self.kind,
            lifetime: self.lifetime,
        })
    }
}
