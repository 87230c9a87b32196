//! SEARCH, STORE and EXPUNGE on the selected mailbox.

use tokio::io::{AsyncRead, AsyncWrite};

use super::authenticated;
use super::states::{Authenticated, Selected};
use super::{Client, Rejected};
use crate::Result;
use crate::command::{Command, SearchCriteria, StoreAction};
use crate::parser::UntaggedResponse;
use crate::types::{ListResponse, Mailbox, MailboxStatus, SeqNum, SequenceSet};

impl<S> Client<S, Selected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// The selected mailbox.
    #[must_use]
    pub const fn mailbox(&self) -> &Mailbox {
        self.state.mailbox()
    }

    /// SELECT-time status of the selected mailbox.
    #[must_use]
    pub const fn status(&self) -> &MailboxStatus {
        self.state.status()
    }

    /// LIST is valid in the selected state too.
    pub async fn list(&mut self, reference: &str, pattern: &str) -> Result<Vec<ListResponse>> {
        authenticated::list(self, reference, pattern).await
    }

    /// Selects another mailbox, implicitly closing this one.
    #[allow(clippy::result_large_err)]
    pub async fn select(
        self,
        mailbox: &str,
    ) -> std::result::Result<Self, Rejected<Client<S, Authenticated>>> {
        authenticated::select(self, mailbox).await
    }

    /// Runs SEARCH and returns matching sequence numbers in server order.
    pub async fn search(&mut self, criteria: &SearchCriteria) -> Result<Vec<SeqNum>> {
        let command = Command::Search {
            criteria: criteria.clone(),
        };
        let (tag, responses) = self.execute(&command).await?;
        Self::check_tagged_ok(&responses, &tag)?;

        let batches = Self::collect_untagged(&responses, "SEARCH", |untagged| match untagged {
            UntaggedResponse::Search(ids) => Some(ids),
            _ => None,
        })?;
        Ok(batches.into_iter().flatten().collect())
    }

    /// Changes flags with `.SILENT`, so no per-message echo is expected.
    pub async fn store_silent(&mut self, sequence: &SequenceSet, action: StoreAction) -> Result<()> {
        let command = Command::Store {
            sequence: sequence.clone(),
            action,
            silent: true,
        };
        let (tag, responses) = self.execute(&command).await?;
        Self::check_tagged_ok(&responses, &tag)
    }

    /// Removes every `\Deleted` message and returns the EXPUNGE notices in
    /// the order the server sent them.
    pub async fn expunge(&mut self) -> Result<Vec<SeqNum>> {
        let (tag, responses) = self.execute(&Command::Expunge).await?;
        Self::check_tagged_ok(&responses, &tag)?;

        Self::collect_untagged(&responses, "EXPUNGE", |untagged| match untagged {
            UntaggedResponse::Expunge(seq) => Some(seq),
            _ => None,
        })
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
    use tokio_test::io::{Builder, Mock};

    use super::*;
    use crate::Error;
    use crate::types::Flag;

    fn script() -> Builder {
        let mut builder = Builder::new();
        builder
            .read(b"* OK ready\r\n")
            .write(b"A0000 LOGIN u p\r\n")
            .read(b"A0000 OK\r\n")
            .write(b"A0001 SELECT INBOX\r\n")
            .read(b"* 5 EXISTS\r\nA0001 OK [READ-WRITE] done\r\n");
        builder
    }

    async fn selected(mock: Mock) -> Client<Mock, Selected> {
        Client::from_stream(mock)
            .await
            .unwrap()
            .login("u", "p")
            .await
            .unwrap()
            .select("INBOX")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn search_by_date_window() {
        let mock = script()
            .write(b"A0002 SEARCH SINCE 1-Jan-2024 BEFORE 1-Feb-2024\r\n")
            .read(b"* SEARCH 2 4 5\r\nA0002 OK SEARCH completed\r\n")
            .build();
        let mut client = selected(mock).await;
        assert_eq!(client.status().exists, 5);

        let criteria = SearchCriteria::And(vec![
            SearchCriteria::Since(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            SearchCriteria::Before(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()),
        ]);
        let ids: Vec<u32> = client
            .search(&criteria)
            .await
            .unwrap()
            .into_iter()
            .map(SeqNum::get)
            .collect();
        assert_eq!(ids, [2, 4, 5]);
    }

    #[tokio::test]
    async fn empty_search() {
        let mock = script()
            .write(b"A0002 SEARCH BEFORE 1-Jan-1990\r\n")
            .read(b"* SEARCH\r\nA0002 OK\r\n")
            .build();
        let mut client = selected(mock).await;
        let criteria = SearchCriteria::Before(NaiveDate::from_ymd_opt(1990, 1, 1).unwrap());
        assert!(client.search(&criteria).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unparseable_search_line_is_not_an_empty_result() {
        let mock = script()
            .write(b"A0002 SEARCH SINCE 1-Jan-2024\r\n")
            .read(b"* SEARCH 2 x7\r\nA0002 OK SEARCH completed\r\n")
            .build();
        let mut client = selected(mock).await;
        let criteria = SearchCriteria::Since(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert!(matches!(
            client.search(&criteria).await,
            Err(Error::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn store_silent_add_deleted() {
        let mock = script()
            .write(b"A0002 STORE 1:2,5 +FLAGS.SILENT (\\Deleted)\r\n")
            .read(b"A0002 OK STORE completed\r\n")
            .build();
        let mut client = selected(mock).await;
        let set = SequenceSet::compact([1, 2, 5].map(|n| SeqNum::new(n).unwrap())).unwrap();
        client
            .store_silent(&set, StoreAction::Add(vec![Flag::Deleted]))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn store_refused() {
        let mock = script()
            .write(b"A0002 STORE 3 -FLAGS.SILENT (\\Deleted)\r\n")
            .read(b"A0002 NO [READ-ONLY] mailbox is read-only\r\n")
            .build();
        let mut client = selected(mock).await;
        let err = client
            .store_silent(
                &SequenceSet::single(3).unwrap(),
                StoreAction::Remove(vec![Flag::Deleted]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::No(ref text) if text == "mailbox is read-only"));
    }

    #[tokio::test]
    async fn expunge_reports_each_removal() {
        let mock = script()
            .write(b"A0002 EXPUNGE\r\n")
            .read(b"* 3 EXPUNGE\r\n* 3 EXPUNGE\r\n* 1 EXPUNGE\r\n")
            .read(b"A0002 OK EXPUNGE completed\r\n")
            .build();
        let mut client = selected(mock).await;
        let gone: Vec<u32> = client
            .expunge()
            .await
            .unwrap()
            .into_iter()
            .map(SeqNum::get)
            .collect();
        assert_eq!(gone, [3, 3, 1]);
    }

    #[tokio::test]
    async fn unparseable_expunge_notice_fails_the_count() {
        let mock = script()
            .write(b"A0002 EXPUNGE\r\n")
            .read(b"* 3 EXPUNGE\r\n* 0 EXPUNGE\r\nA0002 OK EXPUNGE completed\r\n")
            .build();
        let mut client = selected(mock).await;
        assert!(matches!(client.expunge().await, Err(Error::Parse { .. })));
    }

    #[tokio::test]
    async fn reselect_moves_to_new_mailbox() {
        let mock = script()
            .write(b"A0002 SELECT Archive\r\n")
            .read(b"* 0 EXISTS\r\nA0002 OK\r\n")
            .build();
        let client = selected(mock).await;
        let client = client.select("Archive").await.unwrap();
        assert_eq!(client.mailbox().as_str(), "Archive");
        assert_eq!(client.status().exists, 0);
    }
}
