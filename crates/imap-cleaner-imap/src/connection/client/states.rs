//! Connection state markers.

use crate::types::{Mailbox, MailboxStatus};

/// Greeting received, not logged in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotAuthenticated;

/// Logged in, no mailbox selected.
#[derive(Debug, Clone, Copy, Default)]
pub struct Authenticated;

/// A mailbox is selected read-write.
#[derive(Debug, Clone)]
pub struct Selected {
    pub(crate) mailbox: Mailbox,
    pub(crate) status: MailboxStatus,
}

impl Selected {
    /// Name of the selected mailbox.
    #[must_use]
    pub const fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// What the server reported when the mailbox was selected.
    #[must_use]
    pub const fn status(&self) -> &MailboxStatus {
        &self.status
    }
}
