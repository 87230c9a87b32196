//! LIST and SELECT.

use tokio::io::{AsyncRead, AsyncWrite};

use super::states::{Authenticated, Selected};
use super::{Client, Rejected};
use crate::Result;
use crate::command::Command;
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::{ListResponse, Mailbox, MailboxStatus, ResponseCode};

impl<S> Client<S, Authenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Lists mailboxes matching `pattern` under `reference`, in server order.
    pub async fn list(&mut self, reference: &str, pattern: &str) -> Result<Vec<ListResponse>> {
        list(self, reference, pattern).await
    }

    /// Selects `mailbox` read-write.
    ///
    /// On refusal the client stays authenticated and comes back in
    /// [`Rejected`].
    #[allow(clippy::result_large_err)]
    pub async fn select(
        self,
        mailbox: &str,
    ) -> std::result::Result<Client<S, Selected>, Rejected<Self>> {
        select(self, mailbox).await
    }
}

pub(super) async fn list<S, State>(
    client: &mut Client<S, State>,
    reference: &str,
    pattern: &str,
) -> Result<Vec<ListResponse>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let command = Command::List {
        reference: reference.to_string(),
        pattern: pattern.to_string(),
    };
    let (tag, responses) = client.execute(&command).await?;
    Client::<S, State>::check_tagged_ok(&responses, &tag)?;

    Client::<S, State>::collect_untagged(&responses, "LIST", |untagged| match untagged {
        UntaggedResponse::List(entry) => Some(entry),
        _ => None,
    })
}

/// SELECT from any authenticated state; a refusal leaves the connection
/// authenticated with no mailbox selected.
#[allow(clippy::result_large_err)]
pub(super) async fn select<S, State>(
    mut client: Client<S, State>,
    mailbox: &str,
) -> std::result::Result<Client<S, Selected>, Rejected<Client<S, Authenticated>>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mailbox = Mailbox::new(mailbox);
    let command = Command::Select {
        mailbox: mailbox.clone(),
    };

    let result = match client.execute(&command).await {
        Ok((tag, responses)) => Client::<S, State>::check_tagged_ok(&responses, &tag)
            .map(|()| parse_mailbox_status(&responses)),
        Err(e) => Err(e),
    };

    match result {
        Ok(status) => Ok(client.into_state(Selected { mailbox, status })),
        Err(error) => Err(Rejected {
            client: client.into_state(Authenticated),
            error,
        }),
    }
}

fn parse_mailbox_status(responses: &[Vec<u8>]) -> MailboxStatus {
    let mut status = MailboxStatus::default();

    for bytes in responses {
        let code = match ResponseParser::parse(bytes) {
            Ok(Response::Untagged(UntaggedResponse::Exists(n))) => {
                status.exists = n;
                continue;
            }
            Ok(Response::Untagged(UntaggedResponse::Recent(n))) => {
                status.recent = n;
                continue;
            }
            Ok(Response::Untagged(UntaggedResponse::Flags(flags))) => {
                status.flags = flags;
                continue;
            }
            Ok(
                Response::Untagged(UntaggedResponse::Ok { code: Some(code), .. })
                | Response::Tagged { code: Some(code), .. },
            ) => code,
            _ => continue,
        };

        match code {
            ResponseCode::UidValidity(v) => status.uid_validity = Some(v),
            ResponseCode::UidNext(v) => status.uid_next = Some(v),
            ResponseCode::Unseen(v) => status.unseen = Some(v),
            ResponseCode::PermanentFlags(flags) => {
                status.permanent_flags = flags.into_iter().collect();
            }
            ResponseCode::ReadOnly => status.read_only = true,
            ResponseCode::ReadWrite => status.read_only = false,
            _ => {}
        }
    }

    status
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
    use tokio_test::io::Builder;

    use super::*;
    use crate::types::MailboxAttribute;

    async fn logged_in(mock: tokio_test::io::Mock) -> Client<tokio_test::io::Mock, Authenticated> {
        Client::from_stream(mock)
            .await
            .unwrap()
            .login("u", "p")
            .await
            .unwrap()
    }

    fn script() -> Builder {
        let mut builder = Builder::new();
        builder
            .read(b"* OK ready\r\n")
            .write(b"A0000 LOGIN u p\r\n")
            .read(b"A0000 OK\r\n");
        builder
    }

    #[tokio::test]
    async fn list_keeps_server_order() {
        let mock = script()
            .write(b"A0001 LIST \"\" \"*\"\r\n")
            .read(b"* LIST (\\HasNoChildren) \"/\" INBOX\r\n")
            .read(b"* LIST (\\Noselect \\HasChildren) \"/\" \"[Gmail]\"\r\n")
            .read(b"* LIST (\\HasNoChildren) \"/\" \"[Gmail]/Sent Mail\"\r\n")
            .read(b"A0001 OK LIST completed\r\n")
            .build();
        let mut client = logged_in(mock).await;

        let entries = client.list("", "*").await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.mailbox.as_str()).collect();
        assert_eq!(names, ["INBOX", "[Gmail]", "[Gmail]/Sent Mail"]);
        assert!(entries[1].attributes.contains(&MailboxAttribute::NoSelect));
    }

    #[tokio::test]
    async fn list_bare_bracketed_name() {
        let mock = script()
            .write(b"A0001 LIST \"\" \"*\"\r\n")
            .read(b"* LIST (\\HasNoChildren) \"/\" INBOX\r\n")
            .read(b"* LIST (\\HasNoChildren) \"/\" [Gmail]/Trash\r\n")
            .read(b"A0001 OK LIST completed\r\n")
            .build();
        let mut client = logged_in(mock).await;

        let entries = client.list("", "*").await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.mailbox.as_str()).collect();
        assert_eq!(names, ["INBOX", "[Gmail]/Trash"]);
    }

    #[tokio::test]
    async fn unparseable_list_line_fails_the_list() {
        let mock = script()
            .write(b"A0001 LIST \"\" \"*\"\r\n")
            .read(b"* LIST (\\HasNoChildren) \"/\" INBOX\r\n")
            .read(b"* LIST (\\HasNoChildren \"/\" Broken\r\n")
            .read(b"A0001 OK LIST completed\r\n")
            .build();
        let mut client = logged_in(mock).await;
        assert!(matches!(
            client.list("", "*").await,
            Err(crate::Error::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn list_failure() {
        let mock = script()
            .write(b"A0001 LIST \"\" \"*\"\r\n")
            .read(b"A0001 BAD command unknown\r\n")
            .build();
        let mut client = logged_in(mock).await;
        assert!(matches!(
            client.list("", "*").await,
            Err(crate::Error::Bad(_))
        ));
    }

    #[tokio::test]
    async fn select_collects_status() {
        let mock = script()
            .write(b"A0001 SELECT INBOX\r\n")
            .read(b"* FLAGS (\\Answered \\Flagged \\Deleted \\Seen \\Draft)\r\n")
            .read(b"* OK [PERMANENTFLAGS (\\Deleted \\Seen \\*)] Flags permitted.\r\n")
            .read(b"* 172 EXISTS\r\n* 1 RECENT\r\n")
            .read(b"* OK [UNSEEN 12] Message 12 is first unseen\r\n")
            .read(b"* OK [UIDVALIDITY 3857529045] UIDs valid\r\n")
            .read(b"* OK [UIDNEXT 4392] Predicted next UID\r\n")
            .read(b"A0001 OK [READ-WRITE] SELECT completed\r\n")
            .build();
        let client = logged_in(mock).await;

        let selected = client.select("INBOX").await.unwrap();
        let status = selected.state.status();
        assert_eq!(selected.state.mailbox().as_str(), "INBOX");
        assert_eq!(status.exists, 172);
        assert_eq!(status.recent, 1);
        assert_eq!(status.unseen.unwrap().get(), 12);
        assert_eq!(status.uid_validity.unwrap().get(), 3857529045);
        assert_eq!(status.uid_next.unwrap().get(), 4392);
        assert!(status.flags.is_deleted());
        assert!(status.permanent_flags.is_deleted());
        assert!(!status.read_only);
    }

    #[tokio::test]
    async fn select_refusal_stays_authenticated() {
        let mock = script()
            .write(b"A0001 SELECT Nope\r\n")
            .read(b"A0001 NO [NONEXISTENT] Mailbox doesn't exist: Nope\r\n")
            .write(b"A0002 LIST \"\" \"*\"\r\n")
            .read(b"A0002 OK\r\n")
            .build();
        let client = logged_in(mock).await;

        let Rejected { mut client, error } = client.select("Nope").await.unwrap_err();
        assert!(error.is_no());
        assert!(client.list("", "*").await.unwrap().is_empty());
    }
}
