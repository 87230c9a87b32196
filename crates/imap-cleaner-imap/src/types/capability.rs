//! Server capabilities and completion status.

/// Status word of a tagged or untagged condition response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command completed.
    Ok,
    /// Command refused by the server.
    No,
    /// Command rejected as malformed.
    Bad,
    /// Greeting for an already authenticated connection.
    PreAuth,
    /// Server is closing the connection.
    Bye,
}

/// A capability advertised by the server.
///
/// Only the capabilities that change how this client talks to a server get
/// their own variant; everything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `IMAP4rev1` (RFC 3501)
    Imap4Rev1,
    /// `IMAP4rev2` (RFC 9051)
    Imap4Rev2,
    /// LOGIN is refused until TLS is negotiated.
    LoginDisabled,
    /// SASL mechanism, e.g. `AUTH=PLAIN`.
    Auth(String),
    /// Anything else.
    Unknown(String),
}

impl Capability {
    /// Parses a capability atom, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let upper = s.to_ascii_uppercase();
        match upper.as_str() {
            "IMAP4REV1" => Self::Imap4Rev1,
            "IMAP4REV2" => Self::Imap4Rev2,
            "LOGINDISABLED" => Self::LoginDisabled,
            _ if upper.starts_with("AUTH=") => Self::Auth(s[5..].to_string()),
            _ => Self::Unknown(s.to_string()),
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Imap4Rev1 => write!(f, "IMAP4rev1"),
            Self::Imap4Rev2 => write!(f, "IMAP4rev2"),
            Self::LoginDisabled => write!(f, "LOGINDISABLED"),
            Self::Auth(mech) => write!(f, "AUTH={mech}"),
            Self::Unknown(s) => write!(f, "{s}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_capabilities() {
        assert_eq!(Capability::parse("IMAP4rev1"), Capability::Imap4Rev1);
        assert_eq!(Capability::parse("imap4REV2"), Capability::Imap4Rev2);
        assert_eq!(Capability::parse("LOGINDISABLED"), Capability::LoginDisabled);
    }

    #[test]
    fn parse_auth_keeps_mechanism_case() {
        assert_eq!(
            Capability::parse("auth=xoauth2"),
            Capability::Auth("xoauth2".to_string())
        );
    }

    #[test]
    fn unknown_round_trips_through_display() {
        let cap = Capability::parse("X-GM-EXT-1");
        assert_eq!(cap, Capability::Unknown("X-GM-EXT-1".to_string()));
        assert_eq!(cap.to_string(), "X-GM-EXT-1");
    }
}
