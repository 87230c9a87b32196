//! Type-state IMAP client.
//!
//! ```text
//! NotAuthenticated ── login() ──▶ Authenticated ── select() ──▶ Selected
//!                                       ▲                          │
//!                                       └──── failed select() ─────┘
//! ```
//!
//! Transitions consume the client. When the server refuses a transition the
//! client comes back inside [`Rejected`], in whatever state the server is now
//! in, so the caller can still log out cleanly.

#![allow(clippy::missing_errors_doc)]

mod authenticated;
mod not_authenticated;
mod selected;
mod states;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

pub use self::states::{Authenticated, NotAuthenticated, Selected};
use super::framed::{FramedStream, ResponseAccumulator};
use crate::command::{Command, TagGenerator};
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::{Capability, Status};
use crate::{Error, Result};

/// A refused state transition.
pub struct Rejected<C> {
    /// The client, in the state the server fell back to.
    pub client: C,
    /// Why the transition failed.
    pub error: Error,
}

impl<C> std::fmt::Debug for Rejected<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rejected")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

/// IMAP client in connection state `State`.
pub struct Client<S, State> {
    pub(crate) stream: FramedStream<S>,
    pub(crate) tag_gen: TagGenerator,
    pub(crate) capabilities: Vec<Capability>,
    pub(crate) state: State,
}

impl<S, State: std::fmt::Debug> std::fmt::Debug for Client<S, State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("state", &self.state)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Returns true if the server advertised `cap`.
    #[must_use]
    pub fn has_capability(&self, cap: &Capability) -> bool {
        self.capabilities.contains(cap)
    }

    /// Sends LOGOUT and closes the stream.
    ///
    /// The server's reply is read but not checked: once LOGOUT is on the
    /// wire there is nothing useful to do with a failure.
    pub async fn logout(mut self) -> Result<()> {
        let tag = self.tag_gen.next();
        debug!(%tag, command = "LOGOUT", "sending command");
        self.send(&Command::Logout, &tag).await?;
        let _ = self.read_until_tagged(&tag).await;
        let _ = self.stream.shutdown().await;
        Ok(())
    }

    /// Sends a command and reads everything up to its completion.
    pub(crate) async fn execute(&mut self, command: &Command) -> Result<(String, Vec<Vec<u8>>)> {
        let tag = self.tag_gen.next();
        debug!(%tag, command = command.name(), "sending command");
        self.send(command, &tag).await?;
        let responses = self.read_until_tagged(&tag).await?;
        Ok((tag, responses))
    }

    /// Writes `command`, waiting for a continuation before each literal.
    async fn send(&mut self, command: &Command, tag: &str) -> Result<()> {
        let encoded = command.serialize(tag);
        let mut parts = encoded.parts().peekable();
        while let Some(part) = parts.next() {
            self.stream.write_command(part).await?;
            if parts.peek().is_some() {
                self.await_continuation(tag).await?;
            }
        }
        Ok(())
    }

    /// Reads until the server invites the next literal. A completion for
    /// `tag` instead means the server refused the command.
    async fn await_continuation(&mut self, tag: &str) -> Result<()> {
        loop {
            let response = self.stream.read_response().await?;
            match ResponseParser::parse(&response) {
                Ok(Response::Continuation { .. }) => return Ok(()),
                Ok(Response::Tagged { .. }) => {
                    Self::check_tagged_ok(std::slice::from_ref(&response), tag)?;
                    return Err(Error::Protocol(
                        "command completed before its literal was sent".to_string(),
                    ));
                }
                Ok(Response::Untagged(UntaggedResponse::Bye { text, .. })) => {
                    return Err(Error::Bye(text));
                }
                _ => {}
            }
        }
    }

    pub(crate) async fn read_until_tagged(&mut self, tag: &str) -> Result<Vec<Vec<u8>>> {
        ResponseAccumulator::new(tag)
            .read_until_tagged(&mut self.stream)
            .await
    }

    pub(crate) fn absorb_capabilities(&mut self, responses: &[Vec<u8>]) {
        for bytes in responses {
            match ResponseParser::parse(bytes) {
                Ok(Response::Untagged(UntaggedResponse::Capability(caps))) => {
                    self.capabilities = caps;
                }
                Ok(Response::Tagged {
                    code: Some(crate::types::ResponseCode::Capability(caps)),
                    ..
                }) => self.capabilities = caps,
                _ => {}
            }
        }
    }

    /// Parses every untagged `keyword` line with `pick`.
    ///
    /// A line carrying `keyword` that does not parse is an error rather than
    /// a gap in the result. Lines with other keywords are ignored.
    pub(crate) fn collect_untagged<T>(
        responses: &[Vec<u8>],
        keyword: &str,
        pick: impl Fn(UntaggedResponse) -> Option<T>,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        for bytes in responses {
            if !untagged_keyword(bytes).is_some_and(|k| k.eq_ignore_ascii_case(keyword.as_bytes())) {
                continue;
            }
            let item = match ResponseParser::parse(bytes)? {
                Response::Untagged(untagged) => pick(untagged),
                _ => None,
            };
            items.push(item.ok_or_else(|| {
                Error::Protocol(format!("malformed {keyword} response"))
            })?);
        }
        Ok(items)
    }

    /// Maps the completion line for `tag` to a result.
    pub(crate) fn check_tagged_ok(responses: &[Vec<u8>], tag: &str) -> Result<()> {
        for bytes in responses.iter().rev() {
            if let Ok(Response::Tagged {
                tag: resp_tag,
                status,
                text,
                ..
            }) = ResponseParser::parse(bytes)
                && resp_tag.as_str() == tag
            {
                return match status {
                    Status::Ok | Status::PreAuth => Ok(()),
                    Status::No => Err(Error::No(text)),
                    Status::Bad => Err(Error::Bad(text)),
                    Status::Bye => Err(Error::Bye(text)),
                };
            }
        }

        Err(Error::Protocol("missing tagged response".to_string()))
    }

    pub(crate) fn into_state<T>(self, state: T) -> Client<S, T> {
        Client {
            stream: self.stream,
            tag_gen: self.tag_gen,
            capabilities: self.capabilities,
            state,
        }
    }
}

/// The keyword of an untagged line: `LIST` in `* LIST ...`, `EXPUNGE` in
/// `* 3 EXPUNGE`.
fn untagged_keyword(line: &[u8]) -> Option<&[u8]> {
    let mut words = line
        .strip_prefix(b"* ")?
        .split(|&b| b == b' ' || b == b'\r');
    let first = words.next()?;
    if !first.is_empty() && first.iter().all(u8::is_ascii_digit) {
        words.next()
    } else {
        Some(first)
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
    use tokio_test::io::Builder;

    use super::*;

    type Mock = tokio_test::io::Mock;

    fn lines(raw: &[&[u8]]) -> Vec<Vec<u8>> {
        raw.iter().map(|l| l.to_vec()).collect()
    }

    #[test]
    fn check_tagged_ok_maps_status() {
        let ok = lines(&[b"* SEARCH\r\n", b"A0001 OK done\r\n"]);
        assert!(Client::<Mock, NotAuthenticated>::check_tagged_ok(&ok, "A0001").is_ok());

        let no = lines(&[b"A0001 NO [NONEXISTENT] Unknown Mailbox\r\n"]);
        assert!(matches!(
            Client::<Mock, NotAuthenticated>::check_tagged_ok(&no, "A0001"),
            Err(Error::No(ref text)) if text == "Unknown Mailbox"
        ));

        let bad = lines(&[b"A0001 BAD parse error\r\n"]);
        assert!(matches!(
            Client::<Mock, NotAuthenticated>::check_tagged_ok(&bad, "A0001"),
            Err(Error::Bad(_))
        ));
    }

    #[test]
    fn check_tagged_ok_requires_matching_tag() {
        let other = lines(&[b"A0002 OK done\r\n"]);
        assert!(matches!(
            Client::<Mock, NotAuthenticated>::check_tagged_ok(&other, "A0001"),
            Err(Error::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn logout_ignores_server_reply() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"A0000 LOGOUT\r\n")
            .build();

        let client = Client::from_stream(mock).await.unwrap();
        client.logout().await.unwrap();
    }
}
