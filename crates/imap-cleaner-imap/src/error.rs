//! Error types for the IMAP client.

use thiserror::Error;

/// Errors produced while talking to an IMAP server.
#[derive(Debug, Error)]
pub enum Error {
    /// Socket read or write failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS configuration or handshake failed.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Host name is not usable as a TLS server name.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// A server line could not be parsed.
    #[error("Protocol error at position {position}: {message}")]
    Parse {
        /// Byte offset into the line.
        position: usize,
        /// What the parser expected.
        message: String,
    },

    /// Tagged `NO` completion.
    #[error("Server returned NO: {0}")]
    No(String),

    /// Tagged `BAD` completion.
    #[error("Server returned BAD: {0}")]
    Bad(String),

    /// The server closed the session with `BYE`.
    #[error("Server sent BYE: {0}")]
    Bye(String),

    /// Command is not valid in the current connection state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The server broke the protocol in a way the parser cannot describe.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns true if the server answered with a tagged `NO`.
    #[must_use]
    pub const fn is_no(&self) -> bool {
        matches!(self, Self::No(_))
    }

    /// Returns true if the connection can no longer be used.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Tls(_) | Self::Bye(_))
    }
}
