//! Greeting and LOGIN.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use super::states::{Authenticated, NotAuthenticated};
use super::{Client, Rejected};
use crate::command::{Command, TagGenerator};
use crate::connection::framed::FramedStream;
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::{Capability, ResponseCode};
use crate::{Error, Result};

impl<S> Client<S, NotAuthenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Reads the server greeting from a freshly connected stream.
    ///
    /// A `BYE` greeting is an error. A `PREAUTH` greeting is accepted but
    /// the client still expects to LOGIN.
    pub async fn from_stream(stream: S) -> Result<Self> {
        let mut framed = FramedStream::new(stream);

        let greeting = framed.read_response().await?;
        let mut capabilities = Vec::new();
        match ResponseParser::parse(&greeting)? {
            Response::Untagged(
                UntaggedResponse::Ok { code, .. } | UntaggedResponse::PreAuth { code, .. },
            ) => {
                if let Some(ResponseCode::Capability(caps)) = code {
                    capabilities = caps;
                }
            }
            Response::Untagged(UntaggedResponse::Bye { text, .. }) => {
                return Err(Error::Bye(text));
            }
            other => {
                return Err(Error::Protocol(format!("unexpected greeting: {other:?}")));
            }
        }
        debug!(?capabilities, "server greeting received");

        Ok(Self {
            stream: framed,
            tag_gen: TagGenerator::default(),
            capabilities,
            state: NotAuthenticated,
        })
    }

    /// Authenticates with LOGIN.
    ///
    /// On refusal the unauthenticated client is handed back inside
    /// [`Rejected`].
    #[allow(clippy::result_large_err)]
    pub async fn login(
        mut self,
        username: &str,
        password: &str,
    ) -> std::result::Result<Client<S, Authenticated>, Rejected<Self>> {
        if self.has_capability(&Capability::LoginDisabled) {
            return Err(Rejected {
                client: self,
                error: Error::InvalidState("server advertises LOGINDISABLED".to_string()),
            });
        }
        if [username, password]
            .iter()
            .any(|s| s.bytes().any(|b| b == b'\r' || b == b'\n' || b == 0))
        {
            return Err(Rejected {
                client: self,
                error: Error::Protocol("credentials contain line breaks or NUL".to_string()),
            });
        }

        let command = Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        };
        let result = match self.execute(&command).await {
            Ok((tag, responses)) => {
                self.absorb_capabilities(&responses);
                Self::check_tagged_ok(&responses, &tag)
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => Ok(self.into_state(Authenticated)),
            Err(error) => Err(Rejected {
                client: self,
                error,
            }),
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
    use tokio_test::io::Builder;

    use super::*;

    #[tokio::test]
    async fn greeting_capabilities_are_kept() {
        let mock = Builder::new()
            .read(b"* OK [CAPABILITY IMAP4rev1 AUTH=PLAIN] ready\r\n")
            .build();
        let client = Client::from_stream(mock).await.unwrap();
        assert!(client.has_capability(&Capability::Imap4Rev1));
    }

    #[tokio::test]
    async fn bye_greeting_is_an_error() {
        let mock = Builder::new().read(b"* BYE too many connections\r\n").build();
        let err = Client::from_stream(mock).await.unwrap_err();
        assert!(matches!(err, Error::Bye(ref text) if text == "too many connections"));
    }

    #[tokio::test]
    async fn login_success_updates_capabilities() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"A0000 LOGIN alice \"s3cr et\"\r\n")
            .read(b"A0000 OK [CAPABILITY IMAP4rev1 MOVE] Logged in\r\n")
            .build();
        let client = Client::from_stream(mock).await.unwrap();
        let client = client.login("alice", "s3cr et").await.unwrap();
        assert!(client.has_capability(&Capability::Imap4Rev1));
        assert!(client.has_capability(&Capability::Unknown("MOVE".to_string())));
    }

    #[tokio::test]
    async fn eight_bit_password_waits_for_continuation() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"A0000 LOGIN alice {7}\r\n")
            .read(b"+ Ready for literal data\r\n")
            .write("grüße\r\n".as_bytes())
            .read(b"A0000 OK Logged in\r\n")
            .build();
        let client = Client::from_stream(mock).await.unwrap();
        client.login("alice", "grüße").await.unwrap();
    }

    #[tokio::test]
    async fn refused_literal_is_a_rejected_login() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"A0000 LOGIN alice {7}\r\n")
            .read(b"A0000 NO [AUTHENTICATIONFAILED] no 8-bit here\r\n")
            .build();
        let client = Client::from_stream(mock).await.unwrap();
        let rejected = client.login("alice", "grüße").await.unwrap_err();
        assert!(matches!(rejected.error, Error::No(ref text) if text == "no 8-bit here"));
    }

    #[tokio::test]
    async fn login_refusal_returns_client() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"A0000 LOGIN alice wrong\r\n")
            .read(b"A0000 NO [AUTHENTICATIONFAILED] Authentication failed.\r\n")
            .write(b"A0001 LOGOUT\r\n")
            .read(b"* BYE\r\nA0001 OK\r\n")
            .build();
        let client = Client::from_stream(mock).await.unwrap();
        let rejected = client.login("alice", "wrong").await.unwrap_err();
        assert!(rejected.error.is_no());
        rejected.client.logout().await.unwrap();
    }

    #[tokio::test]
    async fn login_disabled_is_refused_locally() {
        let mock = Builder::new()
            .read(b"* OK [CAPABILITY IMAP4rev1 LOGINDISABLED] ready\r\n")
            .build();
        let client = Client::from_stream(mock).await.unwrap();
        let rejected = client.login("alice", "pw").await.unwrap_err();
        assert!(matches!(rejected.error, Error::InvalidState(_)));
    }

    #[tokio::test]
    async fn line_breaks_in_password_are_refused_locally() {
        let mock = Builder::new().read(b"* OK ready\r\n").build();
        let client = Client::from_stream(mock).await.unwrap();
        let rejected = client.login("alice", "pw\r\nA1 LOGOUT").await.unwrap_err();
        assert!(matches!(rejected.error, Error::Protocol(_)));
    }
}
