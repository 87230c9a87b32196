//! Flag mutator.

use imap_cleaner_imap::{Flag, StoreAction};
use tracing::{debug, info};

use crate::selector::MessageIdSet;
use crate::session::{MailSession, Session};
use crate::{Error, Result};

/// Which way to move the `\Deleted` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagDirection {
    /// `+FLAGS (\Deleted)`
    AddDeleted,
    /// `-FLAGS (\Deleted)`
    RemoveDeleted,
}

impl FlagDirection {
    fn action(self) -> StoreAction {
        match self {
            Self::AddDeleted => StoreAction::Add(vec![Flag::Deleted]),
            Self::RemoveDeleted => StoreAction::Remove(vec![Flag::Deleted]),
        }
    }

    const fn verb(self) -> &'static str {
        match self {
            Self::AddDeleted => "marking messages deleted",
            Self::RemoveDeleted => "restoring messages",
        }
    }
}

/// Sets or clears `\Deleted` on exactly the messages in `ids`.
///
/// Other flags are left alone. An empty set sends nothing. Returns how many
/// messages the STORE covered.
///
/// # Errors
///
/// [`Error::StaleSelection`] if `ids` came from an earlier selection, and
/// [`Error::Store`] if the server refuses or the connection fails.
pub async fn mutate<M: MailSession>(
    session: &mut Session<M>,
    ids: &MessageIdSet,
    direction: FlagDirection,
) -> Result<usize> {
    if ids.generation() != session.generation() || session.selected() != Some(ids.mailbox()) {
        return Err(Error::StaleSelection {
            mailbox: ids.mailbox().to_string(),
        });
    }
    let Some(set) = ids.to_sequence_set() else {
        debug!(mailbox = ids.mailbox(), "no matching messages, store skipped");
        return Ok(0);
    };

    info!(mailbox = ids.mailbox(), count = ids.len(), "{}", direction.verb());
    session
        .transport()
        .store(&set, direction.action())
        .await
        .map_err(|source| Error::Store {
            mailbox: ids.mailbox().to_string(),
            source,
        })?;
    Ok(ids.len())
}
