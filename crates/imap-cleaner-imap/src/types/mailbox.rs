//! Mailbox names, LIST entries and SELECT results.

use super::{Flags, SeqNum, Uid, UidValidity};

/// Mailbox name exactly as the server reported it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mailbox(pub String);

impl Mailbox {
    /// Creates a mailbox name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Data gathered from the untagged responses to SELECT.
#[derive(Debug, Clone, Default)]
pub struct MailboxStatus {
    /// Number of messages in the mailbox.
    pub exists: u32,
    /// Number of recent messages.
    pub recent: u32,
    /// First unseen message.
    pub unseen: Option<SeqNum>,
    /// Next UID to be assigned.
    pub uid_next: Option<Uid>,
    /// UIDVALIDITY value.
    pub uid_validity: Option<UidValidity>,
    /// Flags defined for this mailbox.
    pub flags: Flags,
    /// Flags the client may change permanently.
    pub permanent_flags: Flags,
    /// Set when the server selected the mailbox read-only.
    pub read_only: bool,
}

/// One `* LIST` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListResponse {
    /// Name attributes.
    pub attributes: Vec<MailboxAttribute>,
    /// Hierarchy delimiter, `None` for a flat namespace.
    pub delimiter: Option<char>,
    /// Mailbox name.
    pub mailbox: Mailbox,
}

/// Name attribute from a LIST response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MailboxAttribute {
    /// `\Noselect`
    NoSelect,
    /// `\NonExistent`
    NonExistent,
    /// `\HasChildren`
    HasChildren,
    /// `\HasNoChildren`
    HasNoChildren,
    /// `\Marked`
    Marked,
    /// `\Unmarked`
    Unmarked,
    /// Special-use or unrecognised attribute.
    Unknown(String),
}

impl MailboxAttribute {
    /// Parses an attribute case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "\\NOSELECT" => Self::NoSelect,
            "\\NONEXISTENT" => Self::NonExistent,
            "\\HASCHILDREN" => Self::HasChildren,
            "\\HASNOCHILDREN" => Self::HasNoChildren,
            "\\MARKED" => Self::Marked,
            "\\UNMARKED" => Self::Unmarked,
            _ => Self::Unknown(s.to_string()),
        }
    }

    /// True for `\Noselect` and `\NonExistent`: the name is a hierarchy
    /// node and SELECT on it always fails.
    #[must_use]
    pub const fn forbids_select(&self) -> bool {
        matches!(self, Self::NoSelect | Self::NonExistent)
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
    fn mailbox_name_is_kept_verbatim() {
        let mb = Mailbox::new("Archive/2023 Q1");
        assert_eq!(mb.as_str(), "Archive/2023 Q1");
        assert_eq!(mb.to_string(), "Archive/2023 Q1");
        assert_eq!(mb.into_string(), "Archive/2023 Q1");
    }

    #[test]
    fn attribute_parse() {
        assert_eq!(MailboxAttribute::parse("\\Noselect"), MailboxAttribute::NoSelect);
        assert_eq!(MailboxAttribute::parse("\\NOSELECT"), MailboxAttribute::NoSelect);
        assert_eq!(
            MailboxAttribute::parse("\\HasNoChildren"),
            MailboxAttribute::HasNoChildren
        );
        assert_eq!(
            MailboxAttribute::parse("\\Trash"),
            MailboxAttribute::Unknown("\\Trash".to_string())
        );
    }

    #[test]
    fn only_noselect_and_nonexistent_forbid_select() {
        assert!(MailboxAttribute::parse("\\Noselect").forbids_select());
        assert!(MailboxAttribute::parse("\\NonExistent").forbids_select());
        assert!(!MailboxAttribute::HasChildren.forbids_select());
        assert!(!MailboxAttribute::parse("\\Trash").forbids_select());
    }

    #[test]
    fn status_default_is_empty() {
        let status = MailboxStatus::default();
        assert_eq!(status.exists, 0);
        assert!(status.uid_validity.is_none());
        assert!(status.flags.is_empty());
        assert!(!status.read_only);
    }
}
