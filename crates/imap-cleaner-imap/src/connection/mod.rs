//! Connection handling: TLS transport, line framing and the type-state client.

mod client;
mod framed;
mod stream;

pub use client::{Authenticated, Client, NotAuthenticated, Rejected, Selected};
pub use framed::{FramedStream, ResponseAccumulator};
pub use stream::{ImapStream, connect_tls, create_tls_connector};
