//! Command encoding.

mod serialize;
mod tag_generator;
mod types;

use crate::types::{Mailbox, SequenceSet};

pub use serialize::Encoded;
pub use tag_generator::TagGenerator;
pub use types::{SearchCriteria, StoreAction};

use serialize::{
    write_astring, write_mailbox, write_quoted, write_search_criteria, write_store_action,
};

/// A client command.
#[derive(Clone, PartialEq, Eq)]
pub enum Command {
    /// LOGOUT
    Logout,
    /// LOGIN with cleartext credentials.
    Login {
        /// User name.
        username: String,
        /// Password.
        password: String,
    },
    /// LIST
    List {
        /// Reference name.
        reference: String,
        /// Mailbox pattern.
        pattern: String,
    },
    /// SELECT, read-write.
    Select {
        /// Mailbox to select.
        mailbox: Mailbox,
    },
    /// SEARCH with sequence-number results.
    Search {
        /// Search keys.
        criteria: SearchCriteria,
    },
    /// STORE
    Store {
        /// Target messages.
        sequence: SequenceSet,
        /// Flag change.
        action: StoreAction,
        /// Suppress the untagged FETCH echo.
        silent: bool,
    },
    /// EXPUNGE
    Expunge,
}

impl Command {
    /// Encodes the command line, CRLF included.
    #[must_use]
    pub fn serialize(&self, tag: &str) -> Encoded {
        let mut buf = Encoded::default();
        buf.extend_from_slice(tag.as_bytes());
        buf.push(b' ');

        match self {
            Self::Logout => buf.extend_from_slice(b"LOGOUT"),
            Self::Expunge => buf.extend_from_slice(b"EXPUNGE"),

            Self::Login { username, password } => {
                buf.extend_from_slice(b"LOGIN ");
                write_astring(&mut buf, username);
                buf.push(b' ');
                write_astring(&mut buf, password);
            }

            Self::List { reference, pattern } => {
                buf.extend_from_slice(b"LIST ");
                // Always quoted: "" and "*" are not valid bare atoms.
                write_quoted(&mut buf, reference);
                buf.push(b' ');
                write_quoted(&mut buf, pattern);
            }

            Self::Select { mailbox } => {
                buf.extend_from_slice(b"SELECT ");
                write_mailbox(&mut buf, mailbox);
            }

            Self::Search { criteria } => {
                buf.extend_from_slice(b"SEARCH ");
                write_search_criteria(&mut buf, criteria);
            }

            Self::Store {
                sequence,
                action,
                silent,
            } => {
                buf.extend_from_slice(b"STORE ");
                buf.extend_from_slice(sequence.to_string().as_bytes());
                buf.push(b' ');
                write_store_action(&mut buf, action, *silent);
            }
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }

    /// Command name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Logout => "LOGOUT",
            Self::Login { .. } => "LOGIN",
            Self::List { .. } => "LIST",
            Self::Select { .. } => "SELECT",
            Self::Search { .. } => "SEARCH",
            Self::Store { .. } => "STORE",
            Self::Expunge => "EXPUNGE",
        }
    }
}

// Keeps the password out of logs and panic messages.
impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Login { username, .. } => f
                .debug_struct("Login")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::List { reference, pattern } => f
                .debug_struct("List")
                .field("reference", reference)
                .field("pattern", pattern)
                .finish(),
            Self::Select { mailbox } => f.debug_struct("Select").field("mailbox", mailbox).finish(),
            Self::Search { criteria } => {
                f.debug_struct("Search").field("criteria", criteria).finish()
            }
            Self::Store {
                sequence,
                action,
                silent,
            } => f
                .debug_struct("Store")
                .field("sequence", sequence)
                .field("action", action)
                .field("silent", silent)
                .finish(),
            other => f.write_str(other.name()),
        }
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
    use chrono::NaiveDate;

    use super::*;
    use crate::types::Flag;

    fn line(cmd: &Command) -> String {
        String::from_utf8(cmd.serialize("A0001").as_bytes().to_vec()).unwrap()
    }

    #[test]
    fn simple_commands() {
        assert_eq!(line(&Command::Logout), "A0001 LOGOUT\r\n");
        assert_eq!(line(&Command::Expunge), "A0001 EXPUNGE\r\n");
    }

    #[test]
    fn login_quotes_when_needed() {
        let cmd = Command::Login {
            username: "alice@example.com".into(),
            password: "pass word".into(),
        };
        assert_eq!(line(&cmd), "A0001 LOGIN alice@example.com \"pass word\"\r\n");
    }

    #[test]
    fn login_sends_eight_bit_password_as_literal() {
        let cmd = Command::Login {
            username: "alice".into(),
            password: "grüße".into(),
        };
        let encoded = cmd.serialize("A0001");
        let parts: Vec<&[u8]> = encoded.parts().collect();
        assert_eq!(
            parts,
            [&b"A0001 LOGIN alice {7}\r\n"[..], "grüße\r\n".as_bytes()]
        );
    }

    #[test]
    fn login_debug_hides_password() {
        let cmd = Command::Login {
            username: "alice".into(),
            password: "hunter2".into(),
        };
        let debug = format!("{cmd:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn list_everything() {
        let cmd = Command::List {
            reference: String::new(),
            pattern: "*".into(),
        };
        assert_eq!(line(&cmd), "A0001 LIST \"\" \"*\"\r\n");
    }

    #[test]
    fn select_mailbox_with_space() {
        let cmd = Command::Select {
            mailbox: Mailbox::new("Sent Items"),
        };
        assert_eq!(line(&cmd), "A0001 SELECT \"Sent Items\"\r\n");
    }

    #[test]
    fn search_date_window() {
        let cmd = Command::Search {
            criteria: SearchCriteria::And(vec![
                SearchCriteria::Since(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
                SearchCriteria::Before(NaiveDate::from_ymd_opt(2024, 2, 15).unwrap()),
            ]),
        };
        assert_eq!(
            line(&cmd),
            "A0001 SEARCH SINCE 1-Jan-2024 BEFORE 15-Feb-2024\r\n"
        );
    }

    #[test]
    fn search_and_flattens_trivial_cases() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(SearchCriteria::and(vec![]), None);
        assert_eq!(
            SearchCriteria::and(vec![SearchCriteria::Since(day)]),
            Some(SearchCriteria::Since(day))
        );
    }

    #[test]
    fn store_add_deleted_silently() {
        let cmd = Command::Store {
            sequence: SequenceSet::range(1, 3).unwrap(),
            action: StoreAction::Add(vec![Flag::Deleted]),
            silent: true,
        };
        assert_eq!(line(&cmd), "A0001 STORE 1:3 +FLAGS.SILENT (\\Deleted)\r\n");
    }

    #[test]
    fn store_remove_deleted() {
        let cmd = Command::Store {
            sequence: SequenceSet::single(7).unwrap(),
            action: StoreAction::Remove(vec![Flag::Deleted]),
            silent: false,
        };
        assert_eq!(line(&cmd), "A0001 STORE 7 -FLAGS (\\Deleted)\r\n");
    }
}
