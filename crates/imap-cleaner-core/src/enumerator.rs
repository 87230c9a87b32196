//! Mailbox enumerator.

use std::iter::FusedIterator;

use imap_cleaner_imap::{ListResponse, MailboxAttribute};
use tracing::debug;

use crate::session::{MailSession, Session};
use crate::{Error, Result};

/// One mailbox as the server listed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxDescriptor {
    name: String,
    delimiter: Option<char>,
    attributes: Vec<MailboxAttribute>,
}

impl MailboxDescriptor {
    /// Full mailbox name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hierarchy delimiter.
    #[must_use]
    pub const fn delimiter(&self) -> Option<char> {
        self.delimiter
    }

    /// Name attributes.
    #[must_use]
    pub fn attributes(&self) -> &[MailboxAttribute] {
        &self.attributes
    }

    /// False for `\Noselect` and `\NonExistent` entries, which exist only
    /// as hierarchy nodes.
    #[must_use]
    pub fn is_selectable(&self) -> bool {
        !self.attributes.iter().any(MailboxAttribute::forbids_select)
    }
}

impl From<ListResponse> for MailboxDescriptor {
    fn from(entry: ListResponse) -> Self {
        Self {
            name: entry.mailbox.into_string(),
            delimiter: entry.delimiter,
            attributes: entry.attributes,
        }
    }
}

/// Mailboxes in server order, consumed once.
///
/// The LIST reply has been read in full before the first item is yielded,
/// so the session is free for the next command while this is drained.
#[derive(Debug)]
pub struct Mailboxes {
    inner: std::vec::IntoIter<ListResponse>,
}

impl Iterator for Mailboxes {
    type Item = MailboxDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(MailboxDescriptor::from)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Mailboxes {}

impl FusedIterator for Mailboxes {}

/// Lists every mailbox visible to the account.
///
/// # Errors
///
/// [`Error::List`] if the server rejects LIST or the connection fails.
pub async fn list_mailboxes<M: MailSession>(session: &mut Session<M>) -> Result<Mailboxes> {
    let entries = session.transport().list().await.map_err(Error::List)?;
    debug!(count = entries.len(), "mailboxes listed");
    Ok(Mailboxes {
        inner: entries.into_iter(),
    })
}

/// Keeps the mailboxes named in `requested`, in the order of `all`.
///
/// An empty `requested` keeps everything. Requested names the server did
/// not list are skipped without error.
pub fn filter<I>(all: I, requested: &[String]) -> Vec<MailboxDescriptor>
where
    I: IntoIterator<Item = MailboxDescriptor>,
{
    if requested.is_empty() {
        return all.into_iter().collect();
    }
    all.into_iter()
        .filter(|mailbox| requested.iter().any(|name| name == mailbox.name()))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use imap_cleaner_imap::Mailbox;
    use proptest::prelude::*;

    use super::*;
    use crate::testing::{Call, FakeServer, Step, msg};

    fn descriptors(names: &[&str]) -> Vec<MailboxDescriptor> {
        names
            .iter()
            .map(|name| {
                MailboxDescriptor::from(ListResponse {
                    attributes: Vec::new(),
                    delimiter: Some('/'),
                    mailbox: Mailbox::new(*name),
                })
            })
            .collect()
    }

    fn names(mailboxes: &[MailboxDescriptor]) -> Vec<&str> {
        mailboxes.iter().map(MailboxDescriptor::name).collect()
    }

    #[tokio::test]
    async fn lists_in_server_order() {
        let server = FakeServer::new()
            .with_mailbox("INBOX", vec![msg(2020, 1, 1)])
            .with_mailbox("Archive", Vec::new())
            .with_noselect("[Gmail]");
        let mut session = server.session();

        let mailboxes = list_mailboxes(&mut session).await.unwrap();
        assert_eq!(mailboxes.len(), 3);
        let all: Vec<_> = mailboxes.collect();
        assert_eq!(names(&all), ["INBOX", "Archive", "[Gmail]"]);
        assert!(all[0].is_selectable());
        assert!(!all[2].is_selectable());
        assert_eq!(all[0].delimiter(), Some('/'));
        assert_eq!(server.calls(), [Call::List]);
    }

    #[tokio::test]
    async fn list_failure_is_a_list_error() {
        let server = FakeServer::new().fail_on(Step::List);
        let mut session = server.session();

        let err = list_mailboxes(&mut session).await.unwrap_err();
        assert!(matches!(err, Error::List(_)));
    }

    #[test]
    fn empty_request_keeps_everything() {
        let kept = filter(descriptors(&["INBOX", "Archive"]), &[]);
        assert_eq!(names(&kept), ["INBOX", "Archive"]);
    }

    #[test]
    fn filter_keeps_server_order_and_skips_unknown_names() {
        let requested = vec!["Trash".to_string(), "Nope".to_string(), "INBOX".to_string()];
        let kept = filter(descriptors(&["INBOX", "Archive", "Trash"]), &requested);
        assert_eq!(names(&kept), ["INBOX", "Trash"]);
    }

    #[test]
    fn filter_is_case_sensitive() {
        let kept = filter(descriptors(&["Archive"]), &["archive".to_string()]);
        assert!(kept.is_empty());
    }

    proptest! {
        #[test]
        fn filter_is_the_ordered_intersection(
            all in proptest::sample::subsequence(
                vec!["INBOX", "Archive", "Sent", "Drafts", "Trash", "Spam", "Work/2020"],
                0..=7,
            ),
            requested in proptest::collection::vec(
                proptest::sample::select(vec!["INBOX", "Archive", "Trash", "Missing", "Work/2020"]),
                0..6,
            ),
        ) {
            let requested: Vec<String> = requested.into_iter().map(String::from).collect();
            let kept = filter(descriptors(&all), &requested);

            let expected: Vec<&str> = if requested.is_empty() {
                all.clone()
            } else {
                all.iter().copied().filter(|n| requested.iter().any(|r| r == n)).collect()
            };
            prop_assert_eq!(names(&kept), expected);
        }
    }
}
