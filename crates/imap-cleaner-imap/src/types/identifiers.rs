//! Tags, sequence numbers and UIDs.

use std::num::NonZeroU32;

/// Command tag correlating a request with its completion line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag(pub String);

impl Tag {
    /// Creates a tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Returns the tag text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Message sequence number, 1-based.
///
/// Only meaningful inside the selection that produced it: an EXPUNGE or a
/// new SELECT renumbers the mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeqNum(pub NonZeroU32);

impl SeqNum {
    /// Returns `None` for 0.
    #[must_use]
    pub fn new(n: u32) -> Option<Self> {
        NonZeroU32::new(n).map(Self)
    }

    /// Returns the underlying value.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl std::fmt::Display for SeqNum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message UID as reported by `UIDNEXT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uid(pub NonZeroU32);

impl Uid {
    /// Returns `None` for 0.
    #[must_use]
    pub fn new(n: u32) -> Option<Self> {
        NonZeroU32::new(n).map(Self)
    }

    /// Returns the underlying value.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

/// `UIDVALIDITY` of a mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UidValidity(pub NonZeroU32);

impl UidValidity {
    /// Returns `None` for 0.
    #[must_use]
    pub fn new(n: u32) -> Option<Self> {
        NonZeroU32::new(n).map(Self)
    }

    /// Returns the underlying value.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn tag_display() {
        assert_eq!(Tag::new("A0007").to_string(), "A0007");
    }

    #[test]
    fn zero_is_not_a_sequence_number() {
        assert!(SeqNum::new(0).is_none());
        assert_eq!(SeqNum::new(u32::MAX).unwrap().get(), u32::MAX);
    }

    #[test]
    fn sequence_numbers_order_numerically() {
        let mut seqs = vec![SeqNum::new(10).unwrap(), SeqNum::new(2).unwrap()];
        seqs.sort();
        assert_eq!(seqs[0].get(), 2);
    }

    #[test]
    fn uid_and_validity_reject_zero() {
        assert!(Uid::new(0).is_none());
        assert!(UidValidity::new(0).is_none());
        assert_eq!(UidValidity::new(1234567890).unwrap().get(), 1234567890);
    }
}
