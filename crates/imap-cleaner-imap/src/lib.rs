//! # imap-cleaner-imap
//!
//! A small async IMAP4rev1 client covering what a mailbox cleanup tool needs:
//! implicit-TLS connect, LOGIN, LIST, SELECT, SEARCH by date, silent STORE of
//! the `\Deleted` flag, EXPUNGE and LOGOUT.
//!
//! The connection is a type-state [`Client`], so SEARCH or EXPUNGE without a
//! selected mailbox does not compile:
//!
//! ```ignore
//! use chrono::NaiveDate;
//! use imap_cleaner_imap::{Client, Flag, SearchCriteria, SequenceSet, StoreAction};
//!
//! let stream = imap_cleaner_imap::connect_tls("imap.example.com", 993).await?;
//! let client = Client::from_stream(stream).await?;
//! let client = client.login("user", "secret").await.map_err(|r| r.error)?;
//! let mut inbox = client.select("INBOX").await.map_err(|r| r.error)?;
//!
//! let cutoff = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
//! let ids = inbox.search(&SearchCriteria::Before(cutoff)).await?;
//! if let Some(set) = SequenceSet::compact(ids) {
//!     inbox.store_silent(&set, StoreAction::Add(vec![Flag::Deleted])).await?;
//! }
//! inbox.logout().await?;
//! ```
//!
//! Parsing is sans-I/O: [`ResponseParser`] works on byte slices and never
//! touches the network.

#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use command::{Command, SearchCriteria, StoreAction, TagGenerator};
pub use connection::{
    Authenticated, Client, FramedStream, ImapStream, NotAuthenticated, Rejected,
    ResponseAccumulator, Selected, connect_tls,
};
pub use error::{Error, Result};
pub use parser::{Response, ResponseParser, UntaggedResponse};
pub use types::{
    Capability, Flag, Flags, ListResponse, Mailbox, MailboxAttribute, MailboxStatus, ResponseCode,
    SeqNum, SequenceSet, Status, Tag, Uid, UidValidity,
};

/// Default port for IMAP over implicit TLS.
pub const DEFAULT_TLS_PORT: u16 = 993;
