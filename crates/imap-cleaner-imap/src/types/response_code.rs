//! Bracketed response codes.

use super::{Capability, Flag, SeqNum, Uid, UidValidity};

/// Response code carried in `[...]` after a status word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    /// `ALERT`: text the user should see.
    Alert,
    /// `CAPABILITY` list, usually in the greeting or LOGIN completion.
    Capability(Vec<Capability>),
    /// `PERMANENTFLAGS`
    PermanentFlags(Vec<Flag>),
    /// `READ-ONLY`
    ReadOnly,
    /// `READ-WRITE`
    ReadWrite,
    /// `TRYCREATE`
    TryCreate,
    /// `NONEXISTENT`
    NonExistent,
    /// `AUTHENTICATIONFAILED`
    AuthenticationFailed,
    /// `UIDNEXT`
    UidNext(Uid),
    /// `UIDVALIDITY`
    UidValidity(UidValidity),
    /// `UNSEEN`
    Unseen(SeqNum),
    /// Any other code, with its atom.
    Unknown(String),
}
