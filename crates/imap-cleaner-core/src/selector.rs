//! Message selector: SELECT a mailbox, then SEARCH it by date.

use imap_cleaner_imap::{SeqNum, SequenceSet};
use tracing::{debug, info};

use crate::criteria::SelectionCriteria;
use crate::session::{MailSession, Session};
use crate::{Error, Result};

/// Sequence numbers matched in one mailbox selection.
///
/// Sorted and free of duplicates. The set is tied to the selection that
/// produced it: after the next SELECT the server may renumber, and
/// [`crate::mutator::mutate`] refuses the set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageIdSet {
    mailbox: String,
    generation: u64,
    ids: Vec<SeqNum>,
}

impl MessageIdSet {
    /// Mailbox the set was found in.
    #[must_use]
    pub fn mailbox(&self) -> &str {
        &self.mailbox
    }

    /// Selection generation the set belongs to.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// The sequence numbers, ascending.
    #[must_use]
    pub fn ids(&self) -> &[SeqNum] {
        &self.ids
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True when nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Compact wire form, `None` when empty.
    #[must_use]
    pub fn to_sequence_set(&self) -> Option<SequenceSet> {
        SequenceSet::compact(self.ids.iter().copied())
    }
}

/// Selects `mailbox` read-write.
///
/// Any previous selection is invalidated before the command is sent, so a
/// refused SELECT leaves nothing selected.
///
/// # Errors
///
/// [`Error::Select`] if the server refuses or the connection fails.
pub async fn select<M: MailSession>(session: &mut Session<M>, mailbox: &str) -> Result<()> {
    session.begin_selection();
    session
        .transport()
        .select(mailbox)
        .await
        .map_err(|source| Error::Select {
            mailbox: mailbox.to_string(),
            source,
        })?;
    session.finish_selection(mailbox);
    debug!(mailbox, generation = session.generation(), "selected");
    Ok(())
}

/// Searches the selected mailbox for messages inside `criteria`.
///
/// Returns `Ok(None)` without contacting the server when the window has no
/// bounds. An empty match is `Some` of an empty set.
///
/// # Errors
///
/// [`Error::Search`] if no mailbox is selected, the server refuses, or the
/// connection fails.
pub async fn search<M: MailSession>(
    session: &mut Session<M>,
    criteria: &SelectionCriteria,
) -> Result<Option<MessageIdSet>> {
    let Some(query) = criteria.to_search() else {
        debug!("no date bounds, search skipped");
        return Ok(None);
    };
    let Some(mailbox) = session.selected().map(str::to_string) else {
        return Err(Error::Search {
            mailbox: String::new(),
            source: imap_cleaner_imap::Error::InvalidState("no mailbox selected".to_string()),
        });
    };

    info!(
        mailbox = %mailbox,
        from = ?criteria.from(),
        to = ?criteria.to(),
        "searching messages in date window"
    );
    let mut ids = session
        .transport()
        .search(&query)
        .await
        .map_err(|source| Error::Search {
            mailbox: mailbox.clone(),
            source,
        })?;
    ids.sort_unstable();
    ids.dedup();
    debug!(mailbox = %mailbox, matched = ids.len(), "search done");

    Ok(Some(MessageIdSet {
        mailbox,
        generation: session.generation(),
        ids,
    }))
}
