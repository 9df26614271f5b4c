//! Open, capability-based message type tags.
//!
//! A message's kind says where it came from (a direct message, an imported
//! social post, ...). Kinds are trait objects rather than a closed enum so a
//! new origin can be added by implementing [`MessageKind`] and registering it,
//! without touching the queue or any existing consumer.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::error::{Error, Result};

/// A message type tag: a stable machine name plus a human-readable description.
pub trait MessageKind: fmt::Debug + Send + Sync {
    /// Stable identifier, unique within a [`KindRegistry`].
    fn name(&self) -> &str;

    /// Human-readable description of the kind.
    fn description(&self) -> &str;
}

/// Kinds shipped with the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    /// A direct message from a sender to one or more recipients.
    SimpleMessage,
    /// A post imported from an external social feed.
    SocialPost,
}

impl BasicKind {
    pub const ALL: [BasicKind; 2] = [BasicKind::SimpleMessage, BasicKind::SocialPost];
}

impl MessageKind for BasicKind {
    fn name(&self) -> &str {
        match self {
            BasicKind::SimpleMessage => "simple_message",
            BasicKind::SocialPost => "social_post",
        }
    }

    fn description(&self) -> &str {
        match self {
            BasicKind::SimpleMessage => "A simple message from a sender to one or more recipients",
            BasicKind::SocialPost => "A post imported from an external social feed with its metadata",
        }
    }
}

/// Cheap, cloneable handle to a [`MessageKind`].
///
/// Two handles are equal when their kinds share a name.
#[derive(Clone)]
pub struct Kind(Arc<dyn MessageKind>);

impl Kind {
    pub fn new(kind: impl MessageKind + 'static) -> Self {
        Self(Arc::new(kind))
    }

    pub fn simple() -> Self {
        Self::new(BasicKind::SimpleMessage)
    }

    pub fn social_post() -> Self {
        Self::new(BasicKind::SocialPost)
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn description(&self) -> &str {
        self.0.description()
    }
}

impl Default for Kind {
    fn default() -> Self {
        Self::simple()
    }
}

impl PartialEq for Kind {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for Kind {}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Kind").field(&self.name()).finish()
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<BasicKind> for Kind {
    fn from(kind: BasicKind) -> Self {
        Self::new(kind)
    }
}

/// Name-indexed set of known kinds.
///
/// Starts out holding every [`BasicKind`]. Collaborators that ingest new
/// origins register their kinds here and look them up by name when turning
/// external records into messages.
#[derive(Debug, Clone)]
pub struct KindRegistry {
    kinds: BTreeMap<String, Kind>,
}

impl Default for KindRegistry {
    fn default() -> Self {
        let kinds = BasicKind::ALL
            .iter()
            .map(|kind| (kind.name().to_string(), Kind::from(*kind)))
            .collect();
        Self { kinds }
    }
}

impl KindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a kind.
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateKind` if a kind with the same name exists.
    pub fn register(&mut self, kind: impl Into<Kind>) -> Result<Kind> {
        let kind = kind.into();
        if self.kinds.contains_key(kind.name()) {
            return Err(Error::DuplicateKind(kind.name().to_string()));
        }
        self.kinds.insert(kind.name().to_string(), kind.clone());
        Ok(kind)
    }

    pub fn get(&self, name: &str) -> Option<Kind> {
        self.kinds.get(name).cloned()
    }

    /// Like [`get`](Self::get) but fails with `Error::UnknownKind`.
    pub fn resolve(&self, name: &str) -> Result<Kind> {
        self.get(name)
            .ok_or_else(|| Error::UnknownKind(name.to_string()))
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Digest;

    impl MessageKind for Digest {
        fn name(&self) -> &str {
            "digest"
        }

        fn description(&self) -> &str {
            "A daily digest"
        }
    }

    #[test]
    fn registry_starts_with_builtins() {
        let registry = KindRegistry::new();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["simple_message", "social_post"]);
        assert_eq!(registry.get("social_post"), Some(Kind::social_post()));
    }

    #[test]
    fn registry_accepts_new_kinds_once() {
        let mut registry = KindRegistry::new();
        let digest = registry.register(Kind::new(Digest)).expect("register");
        assert_eq!(digest.description(), "A daily digest");
        assert!(matches!(
            registry.register(Kind::new(Digest)),
            Err(Error::DuplicateKind(name)) if name == "digest"
        ));
    }

    #[test]
    fn resolve_unknown_kind_fails() {
        let registry = KindRegistry::new();
        assert!(matches!(
            registry.resolve("fax"),
            Err(Error::UnknownKind(name)) if name == "fax"
        ));
    }

    #[test]
    fn kinds_compare_by_name() {
        assert_eq!(Kind::simple(), Kind::from(BasicKind::SimpleMessage));
        assert_ne!(Kind::simple(), Kind::social_post());
        assert_eq!(Kind::default().to_string(), "simple_message");
    }
}
