//! Untagged response data.

use crate::types::{Capability, Flags, ListResponse, ResponseCode, SeqNum};

/// A `*` line from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UntaggedResponse {
    /// `* OK`
    Ok {
        /// Response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* NO`: a warning.
    No {
        /// Response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* BAD`
    Bad {
        /// Response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* PREAUTH` greeting.
    PreAuth {
        /// Response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* BYE`
    Bye {
        /// Response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* CAPABILITY`
    Capability(Vec<Capability>),
    /// `* FLAGS`
    Flags(Flags),
    /// `* LIST`
    List(ListResponse),
    /// `* SEARCH`, possibly empty.
    Search(Vec<SeqNum>),
    /// `* n EXISTS`
    Exists(u32),
    /// `* n RECENT`
    Recent(u32),
    /// `* n EXPUNGE`
    Expunge(SeqNum),
}
