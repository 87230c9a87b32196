//! Error types for the cleanup engine.
//!
//! Each variant names the step that failed and keeps the protocol error as
//! its source, so the printed chain reads "failed to select Archive: server
//! said NO: ...". Every error aborts the run.

use thiserror::Error;

/// Errors that abort a cleanup run.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport, DNS or TLS failure, or the server hung up.
    #[error("failed to connect to {host}:{port}")]
    Connection {
        /// Server host.
        host: String,
        /// Server port.
        port: u16,
        /// Underlying failure.
        #[source]
        source: imap_cleaner_imap::Error,
    },

    /// The server refused the credentials.
    #[error("failed to log in as {user}")]
    Authentication {
        /// Login name.
        user: String,
        /// Underlying failure.
        #[source]
        source: imap_cleaner_imap::Error,
    },

    /// LIST failed.
    #[error("failed to list mailboxes")]
    List(#[source] imap_cleaner_imap::Error),

    /// SELECT failed, e.g. the mailbox was deleted or renamed meanwhile.
    #[error("failed to select {mailbox}")]
    Select {
        /// Mailbox name.
        mailbox: String,
        /// Underlying failure.
        #[source]
        source: imap_cleaner_imap::Error,
    },

    /// SEARCH failed.
    #[error("failed to search {mailbox}")]
    Search {
        /// Mailbox name.
        mailbox: String,
        /// Underlying failure.
        #[source]
        source: imap_cleaner_imap::Error,
    },

    /// STORE failed.
    #[error("failed to update flags in {mailbox}")]
    Store {
        /// Mailbox name.
        mailbox: String,
        /// Underlying failure.
        #[source]
        source: imap_cleaner_imap::Error,
    },

    /// EXPUNGE failed, e.g. the mailbox is read-only.
    #[error("failed to expunge {mailbox}")]
    Expunge {
        /// Mailbox name.
        mailbox: String,
        /// Underlying failure.
        #[source]
        source: imap_cleaner_imap::Error,
    },

    /// A message set was used after its mailbox selection was replaced.
    #[error("message set from {mailbox} is stale: the mailbox was reselected")]
    StaleSelection {
        /// Mailbox the set was produced in.
        mailbox: String,
    },
}

impl Error {
    /// The protocol error underneath, if any.
    #[must_use]
    pub const fn imap(&self) -> Option<&imap_cleaner_imap::Error> {
        match self {
            Self::Connection { source, .. }
            | Self::Authentication { source, .. }
            | Self::List(source)
            | Self::Select { source, .. }
            | Self::Search { source, .. }
            | Self::Store { source, .. }
            | Self::Expunge { source, .. } => Some(source),
            Self::StaleSelection { .. } => None,
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn display_names_the_step_and_chains_the_cause() {
        let err = Error::Select {
            mailbox: "Archive".to_string(),
            source: imap_cleaner_imap::Error::No("Mailbox doesn't exist".to_string()),
        };
        assert_eq!(err.to_string(), "failed to select Archive");
        let cause = err.source().unwrap().to_string();
        assert!(cause.contains("Mailbox doesn't exist"));
    }

    #[test]
    fn stale_selection_has_no_protocol_cause() {
        let err = Error::StaleSelection {
            mailbox: "INBOX".to_string(),
        };
        assert!(err.imap().is_none());
        assert!(err.source().is_none());
    }
}
