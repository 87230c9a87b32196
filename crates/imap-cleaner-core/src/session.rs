//! Session manager.
//!
//! [`MailSession`] is the seam between the engine and the wire: the handful
//! of protocol commands a run issues, with nothing cleanup-specific in it.
//! [`ImapSession`] implements it over the type-state client. [`Session`]
//! wraps any implementation and tracks which mailbox is selected, so
//! message sets from an earlier selection can be refused.

#![allow(clippy::missing_errors_doc)]

use imap_cleaner_imap::{
    Authenticated, Client, ImapStream, ListResponse, Rejected, SearchCriteria, Selected, SeqNum,
    SequenceSet, StoreAction,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use crate::{Error, Result};

/// Protocol commands a cleanup run needs from one mail server session.
///
/// Calls are strictly sequential: each returns only once the server has
/// completed the command, so nothing overlaps on the connection.
#[allow(async_fn_in_trait)]
pub trait MailSession: Sized {
    /// `LIST "" "*"`, in server order.
    async fn list(&mut self) -> imap_cleaner_imap::Result<Vec<ListResponse>>;

    /// Read-write SELECT. On failure no mailbox is selected.
    async fn select(&mut self, mailbox: &str) -> imap_cleaner_imap::Result<()>;

    /// SEARCH in the selected mailbox.
    async fn search(&mut self, criteria: &SearchCriteria)
    -> imap_cleaner_imap::Result<Vec<SeqNum>>;

    /// Silent STORE in the selected mailbox.
    async fn store(
        &mut self,
        set: &SequenceSet,
        action: StoreAction,
    ) -> imap_cleaner_imap::Result<()>;

    /// EXPUNGE in the selected mailbox; returns the expunge notices.
    async fn expunge(&mut self) -> imap_cleaner_imap::Result<Vec<SeqNum>>;

    /// LOGOUT and drop the connection.
    async fn logout(self) -> imap_cleaner_imap::Result<()>;
}

enum Connection<S> {
    Authenticated(Client<S, Authenticated>),
    Selected(Client<S, Selected>),
}

/// [`MailSession`] over a logged-in IMAP client.
pub struct ImapSession<S = ImapStream> {
    // Empty only while a transition is in flight.
    conn: Option<Connection<S>>,
}

impl<S> std::fmt::Debug for ImapSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.conn {
            Some(Connection::Authenticated(_)) => "authenticated",
            Some(Connection::Selected(_)) => "selected",
            None => "lost",
        };
        f.debug_struct("ImapSession").field("state", &state).finish()
    }
}

impl ImapSession {
    /// Connects over implicit TLS and logs in.
    pub async fn connect(host: &str, port: u16, user: &str, password: &str) -> Result<Self> {
        let stream = imap_cleaner_imap::connect_tls(host, port)
            .await
            .map_err(|source| Error::Connection {
                host: host.to_string(),
                port,
                source,
            })?;
        Self::login(stream, host, port, user, password).await
    }
}

impl<S> ImapSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Reads the greeting from an already connected stream and logs in.
    ///
    /// `host` and `port` only label errors. A refused login still sends
    /// LOGOUT before returning.
    pub async fn login(
        stream: S,
        host: &str,
        port: u16,
        user: &str,
        password: &str,
    ) -> Result<Self> {
        let client = Client::from_stream(stream)
            .await
            .map_err(|source| Error::Connection {
                host: host.to_string(),
                port,
                source,
            })?;

        info!(user, "logging in");
        match client.login(user, password).await {
            Ok(client) => Ok(Self {
                conn: Some(Connection::Authenticated(client)),
            }),
            Err(Rejected { client, error }) => {
                if let Err(e) = client.logout().await {
                    warn!(error = %e, "logout after failed login failed");
                }
                if error.is_fatal() {
                    Err(Error::Connection {
                        host: host.to_string(),
                        port,
                        source: error,
                    })
                } else {
                    Err(Error::Authentication {
                        user: user.to_string(),
                        source: error,
                    })
                }
            }
        }
    }

    fn selected(&mut self) -> imap_cleaner_imap::Result<&mut Client<S, Selected>> {
        match &mut self.conn {
            Some(Connection::Selected(client)) => Ok(client),
            Some(Connection::Authenticated(_)) => Err(imap_cleaner_imap::Error::InvalidState(
                "no mailbox selected".to_string(),
            )),
            None => Err(lost()),
        }
    }
}

fn lost() -> imap_cleaner_imap::Error {
    imap_cleaner_imap::Error::InvalidState("connection lost during a state change".to_string())
}

impl<S> MailSession for ImapSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    async fn list(&mut self) -> imap_cleaner_imap::Result<Vec<ListResponse>> {
        match &mut self.conn {
            Some(Connection::Authenticated(client)) => client.list("", "*").await,
            Some(Connection::Selected(client)) => client.list("", "*").await,
            None => Err(lost()),
        }
    }

    async fn select(&mut self, mailbox: &str) -> imap_cleaner_imap::Result<()> {
        let result = match self.conn.take() {
            Some(Connection::Authenticated(client)) => client.select(mailbox).await,
            Some(Connection::Selected(client)) => client.select(mailbox).await,
            None => return Err(lost()),
        };
        match result {
            Ok(client) => {
                debug!(mailbox, exists = client.status().exists, "mailbox selected");
                self.conn = Some(Connection::Selected(client));
                Ok(())
            }
            Err(Rejected { client, error }) => {
                self.conn = Some(Connection::Authenticated(client));
                Err(error)
            }
        }
    }

    async fn search(
        &mut self,
        criteria: &SearchCriteria,
    ) -> imap_cleaner_imap::Result<Vec<SeqNum>> {
        self.selected()?.search(criteria).await
    }

    async fn store(
        &mut self,
        set: &SequenceSet,
        action: StoreAction,
    ) -> imap_cleaner_imap::Result<()> {
        self.selected()?.store_silent(set, action).await
    }

    async fn expunge(&mut self) -> imap_cleaner_imap::Result<Vec<SeqNum>> {
        self.selected()?.expunge().await
    }

    async fn logout(self) -> imap_cleaner_imap::Result<()> {
        match self.conn {
            Some(Connection::Authenticated(client)) => client.logout().await,
            Some(Connection::Selected(client)) => client.logout().await,
            None => Ok(()),
        }
    }
}

/// One authenticated session, owned by a single run.
///
/// Every SELECT starts a new selection generation. Message sets carry the
/// generation they were found in; see [`crate::MessageIdSet`].
#[derive(Debug)]
pub struct Session<M> {
    transport: M,
    generation: u64,
    selected: Option<String>,
}

impl Session<ImapSession> {
    /// Connects to `host:port` over TLS and logs in.
    ///
    /// # Errors
    ///
    /// [`Error::Connection`] for transport, DNS or TLS failures and
    /// [`Error::Authentication`] when the server refuses the login.
    pub async fn open(host: &str, port: u16, user: &str, password: &str) -> Result<Self> {
        info!(host, port, "connecting");
        ImapSession::connect(host, port, user, password)
            .await
            .map(Self::new)
    }
}

impl<M: MailSession> Session<M> {
    /// Wraps an already authenticated transport.
    #[must_use]
    pub const fn new(transport: M) -> Self {
        Self {
            transport,
            generation: 0,
            selected: None,
        }
    }

    /// The selected mailbox, if any.
    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Current selection generation.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) const fn transport(&mut self) -> &mut M {
        &mut self.transport
    }

    /// Starts a new selection. Whatever was selected is gone from here on,
    /// even if the server refuses the new one.
    pub(crate) fn begin_selection(&mut self) -> u64 {
        self.selected = None;
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    pub(crate) fn finish_selection(&mut self, mailbox: &str) {
        self.selected = Some(mailbox.to_string());
    }

    /// Logs out. Never fails: a dead transport or a refused LOGOUT is
    /// logged and dropped.
    pub async fn close(self) {
        debug!("closing session");
        if let Err(e) = self.transport.logout().await {
            warn!(error = %e, "logout failed");
        }
    }
}
