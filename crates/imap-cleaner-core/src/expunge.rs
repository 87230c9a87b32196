//! Expunge operator.

use tracing::info;

use crate::session::{MailSession, Session};
use crate::{Error, Result};

/// Permanently removes every `\Deleted` message in the selected mailbox,
/// whoever set the flag. Returns the number of messages removed.
///
/// There is no confirmation here; that belongs to the caller.
///
/// # Errors
///
/// [`Error::Expunge`] if no mailbox is selected, the server refuses (a
/// read-only mailbox, say), or the connection fails.
pub async fn expunge<M: MailSession>(session: &mut Session<M>) -> Result<usize> {
    let mailbox = session.selected().unwrap_or_default().to_string();
    info!(mailbox = %mailbox, "expunging deleted messages");

    let removed = session
        .transport()
        .expunge()
        .await
        .map_err(|source| Error::Expunge {
            mailbox: mailbox.clone(),
            source,
        })?;
    info!(mailbox = %mailbox, removed = removed.len(), "expunge done");
    Ok(removed.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::selector::select;
    use crate::testing::{Call, FakeServer, Step, deleted, msg};

    #[tokio::test]
    async fn removes_every_deleted_message() {
        let server = FakeServer::new().with_mailbox(
            "INBOX",
            vec![
                deleted(2020, 1, 1),
                msg(2020, 1, 2),
                deleted(2020, 1, 3),
                deleted(2020, 1, 4),
            ],
        );
        let mut session = server.session();
        select(&mut session, "INBOX").await.unwrap();

        assert_eq!(expunge(&mut session).await.unwrap(), 3);
        assert_eq!(server.messages("INBOX"), [msg(2020, 1, 2)]);
    }

    #[tokio::test]
    async fn nothing_flagged_is_a_no_op() {
        let server = FakeServer::new().with_mailbox("INBOX", vec![msg(2020, 1, 1)]);
        let mut session = server.session();
        select(&mut session, "INBOX").await.unwrap();

        assert_eq!(expunge(&mut session).await.unwrap(), 0);
        assert_eq!(server.messages("INBOX").len(), 1);
        assert_eq!(
            server.calls(),
            [Call::Select("INBOX".to_string()), Call::Expunge]
        );
    }

    #[tokio::test]
    async fn refusal_is_an_expunge_error() {
        let server = FakeServer::new()
            .with_mailbox("INBOX", vec![deleted(2020, 1, 1)])
            .fail_on(Step::Expunge);
        let mut session = server.session();
        select(&mut session, "INBOX").await.unwrap();

        let err = expunge(&mut session).await.unwrap_err();
        assert!(matches!(err, Error::Expunge { ref mailbox, .. } if mailbox == "INBOX"));
        assert_eq!(server.messages("INBOX").len(), 1);
    }

    #[tokio::test]
    async fn without_selection_the_server_refuses() {
        let server = FakeServer::new().with_mailbox("INBOX", vec![deleted(2020, 1, 1)]);
        let mut session = server.session();

        let err = expunge(&mut session).await.unwrap_err();
        assert!(matches!(err, Error::Expunge { .. }));
    }
}
