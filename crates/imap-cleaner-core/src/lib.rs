//! # imap-cleaner-core
//!
//! The engine behind `imap-cleaner`: decides which mailboxes and messages a
//! run touches and in what order the side effects happen.
//!
//! - [`session`] - one authenticated session and its teardown
//! - [`enumerator`] - LIST and the mailbox allow-list
//! - [`selector`] - SELECT and date SEARCH
//! - [`mutator`] - setting or clearing `\Deleted`
//! - [`expunge`] - EXPUNGE
//! - [`orchestrator`] - the per-mode step sequence
//!
//! ```ignore
//! use imap_cleaner_core::{OperationMode, RunConfig, SelectionCriteria};
//!
//! let config = RunConfig::builder("imap.example.com", "alice")
//!     .password("secret")
//!     .mode(OperationMode::Cleanup)
//!     .mailboxes(["Archive"])
//!     .criteria(SelectionCriteria::new(None, Some(cutoff)))
//!     .build();
//! let report = imap_cleaner_core::run(&config).await?;
//! println!("removed {} messages", report.total_expunged());
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod criteria;
pub mod enumerator;
mod error;
pub mod expunge;
pub mod mutator;
pub mod orchestrator;
pub mod selector;
pub mod session;

#[cfg(test)]
mod testing;

pub use config::{OperationMode, RunConfig, RunConfigBuilder};
pub use criteria::SelectionCriteria;
pub use enumerator::{MailboxDescriptor, Mailboxes};
pub use error::{Error, Result};
pub use mutator::FlagDirection;
pub use orchestrator::{MailboxOutcome, RunReport, run, run_session};
pub use selector::MessageIdSet;
pub use session::{ImapSession, MailSession, Session};
