//! Response parser.

#![allow(clippy::missing_errors_doc)]

mod helpers;
mod types;

pub use types::UntaggedResponse;

use crate::parser::lexer::{Lexer, Token};
use crate::types::{ResponseCode, SeqNum, Status, Tag};
use crate::{Error, Result};

use helpers::{
    parse_capability_data, parse_flag_list, parse_list_response, parse_response_code,
    parse_search_response, read_text_until_crlf,
};

/// A parsed response line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Command completion.
    Tagged {
        /// Tag of the completed command.
        tag: Tag,
        /// Completion status.
        status: Status,
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// Server data.
    Untagged(UntaggedResponse),
    /// `+` continuation request.
    Continuation {
        /// Text after the `+`, if any.
        text: Option<String>,
    },
}

/// Stateless response parser.
pub struct ResponseParser;

impl ResponseParser {
    /// Parses one complete response line.
    pub fn parse(input: &[u8]) -> Result<Response> {
        let mut lexer = Lexer::new(input);

        match lexer.next_token()? {
            Token::Asterisk => Self::parse_untagged(&mut lexer),
            Token::Plus => {
                if lexer.peek() == Some(b' ') {
                    lexer.advance();
                }
                let text = read_text_until_crlf(&mut lexer);
                Ok(Response::Continuation {
                    text: (!text.is_empty()).then_some(text),
                })
            }
            Token::Atom(tag) => {
                lexer.expect_space()?;
                let status = Self::parse_status(&mut lexer)?;
                let (code, text) = Self::parse_resp_text(&mut lexer)?;
                Ok(Response::Tagged {
                    tag: Tag::new(tag),
                    status,
                    code,
                    text,
                })
            }
            token => Err(Error::Parse {
                position: 0,
                message: format!("Expected *, +, or tag, got {token:?}"),
            }),
        }
    }

    fn parse_untagged(lexer: &mut Lexer<'_>) -> Result<Response> {
        lexer.expect_space()?;

        let untagged = match lexer.next_token()? {
            Token::Atom(keyword) => match keyword.to_ascii_uppercase().as_str() {
                "OK" | "NO" | "BAD" | "PREAUTH" | "BYE" => {
                    let (code, text) = Self::parse_resp_text(lexer)?;
                    match keyword.to_ascii_uppercase().as_str() {
                        "OK" => UntaggedResponse::Ok { code, text },
                        "NO" => UntaggedResponse::No { code, text },
                        "BAD" => UntaggedResponse::Bad { code, text },
                        "PREAUTH" => UntaggedResponse::PreAuth { code, text },
                        _ => UntaggedResponse::Bye { code, text },
                    }
                }
                "CAPABILITY" => UntaggedResponse::Capability(parse_capability_data(lexer)?),
                "FLAGS" => {
                    lexer.expect_space()?;
                    UntaggedResponse::Flags(parse_flag_list(lexer)?)
                }
                "LIST" => {
                    lexer.expect_space()?;
                    UntaggedResponse::List(parse_list_response(lexer)?)
                }
                "SEARCH" => UntaggedResponse::Search(parse_search_response(lexer)?),
                _ => {
                    return Err(Error::Parse {
                        position: lexer.position(),
                        message: format!("Unknown untagged response: {keyword}"),
                    });
                }
            },
            Token::Number(n) => {
                lexer.expect_space()?;
                let keyword = lexer.read_atom_string()?;
                match keyword.to_ascii_uppercase().as_str() {
                    "EXISTS" => UntaggedResponse::Exists(n),
                    "RECENT" => UntaggedResponse::Recent(n),
                    "EXPUNGE" => {
                        UntaggedResponse::Expunge(SeqNum::new(n).ok_or_else(|| Error::Parse {
                            position: lexer.position(),
                            message: "Invalid sequence number 0".to_string(),
                        })?)
                    }
                    _ => {
                        return Err(Error::Parse {
                            position: lexer.position(),
                            message: format!("Unknown message data: {keyword}"),
                        });
                    }
                }
            }
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("Unexpected token in untagged response: {token:?}"),
                });
            }
        };

        Ok(Response::Untagged(untagged))
    }

    fn parse_status(lexer: &mut Lexer<'_>) -> Result<Status> {
        let s = lexer.read_atom_string()?;
        match s.to_ascii_uppercase().as_str() {
            "OK" => Ok(Status::Ok),
            "NO" => Ok(Status::No),
            "BAD" => Ok(Status::Bad),
            "PREAUTH" => Ok(Status::PreAuth),
            "BYE" => Ok(Status::Bye),
            _ => Err(Error::Parse {
                position: lexer.position(),
                message: format!("Invalid status: {s}"),
            }),
        }
    }

    /// Parses ` [CODE] text`; both parts may be missing.
    fn parse_resp_text(lexer: &mut Lexer<'_>) -> Result<(Option<ResponseCode>, String)> {
        if lexer.peek() == Some(b' ') {
            lexer.advance();
        }
        let code = if lexer.peek() == Some(b'[') {
            Some(parse_response_code(lexer)?)
        } else {
            None
        };
        if lexer.peek() == Some(b' ') {
            lexer.advance();
        }
        Ok((code, read_text_until_crlf(lexer)))
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
    use super::*;
    use crate::types::{Capability, Flag, MailboxAttribute};

    fn untagged(input: &[u8]) -> UntaggedResponse {
        match ResponseParser::parse(input).unwrap() {
            Response::Untagged(u) => u,
            other => panic!("expected untagged, got {other:?}"),
        }
    }

    #[test]
    fn greeting_with_capabilities() {
        let u = untagged(b"* OK [CAPABILITY IMAP4rev1 AUTH=PLAIN] Dovecot ready.\r\n");
        let UntaggedResponse::Ok { code, text } = u else {
            panic!("expected OK");
        };
        assert_eq!(text, "Dovecot ready.");
        assert_eq!(
            code,
            Some(ResponseCode::Capability(vec![
                Capability::Imap4Rev1,
                Capability::Auth("PLAIN".into())
            ]))
        );
    }

    #[test]
    fn tagged_no_with_code() {
        let response =
            ResponseParser::parse(b"A0001 NO [AUTHENTICATIONFAILED] Invalid credentials\r\n")
                .unwrap();
        assert_eq!(
            response,
            Response::Tagged {
                tag: Tag::new("A0001"),
                status: Status::No,
                code: Some(ResponseCode::AuthenticationFailed),
                text: "Invalid credentials".into(),
            }
        );
    }

    #[test]
    fn tagged_ok_without_text() {
        let response = ResponseParser::parse(b"A0002 OK\r\n").unwrap();
        assert!(matches!(
            response,
            Response::Tagged { status: Status::Ok, ref text, .. } if text.is_empty()
        ));
    }

    #[test]
    fn bye() {
        assert!(matches!(
            untagged(b"* BYE Logging out\r\n"),
            UntaggedResponse::Bye { ref text, .. } if text == "Logging out"
        ));
    }

    #[test]
    fn list_quoted_name() {
        let UntaggedResponse::List(list) =
            untagged(b"* LIST (\\HasNoChildren) \"/\" \"Sent Items\"\r\n")
        else {
            panic!("expected LIST");
        };
        assert_eq!(list.mailbox.as_str(), "Sent Items");
        assert_eq!(list.delimiter, Some('/'));
        assert_eq!(list.attributes, vec![MailboxAttribute::HasNoChildren]);
    }

    #[test]
    fn list_nil_delimiter_and_atom_name() {
        let UntaggedResponse::List(list) = untagged(b"* LIST (\\Noselect) NIL Archive\r\n") else {
            panic!("expected LIST");
        };
        assert_eq!(list.delimiter, None);
        assert_eq!(list.attributes, vec![MailboxAttribute::NoSelect]);
    }

    #[test]
    fn list_bare_name_with_brackets() {
        let UntaggedResponse::List(list) =
            untagged(b"* LIST (\\HasNoChildren) \"/\" [Gmail]/Trash\r\n")
        else {
            panic!("expected LIST");
        };
        assert_eq!(list.mailbox.as_str(), "[Gmail]/Trash");
    }

    #[test]
    fn list_literal_name() {
        let UntaggedResponse::List(list) = untagged(b"* LIST () \".\" {10}\r\nWeird \"Box\r\n")
        else {
            panic!("expected LIST");
        };
        assert_eq!(list.mailbox.as_str(), "Weird \"Box");
    }

    #[test]
    fn search_results() {
        assert_eq!(
            untagged(b"* SEARCH 2 3 7\r\n"),
            UntaggedResponse::Search(vec![
                SeqNum::new(2).unwrap(),
                SeqNum::new(3).unwrap(),
                SeqNum::new(7).unwrap()
            ])
        );
        assert_eq!(untagged(b"* SEARCH\r\n"), UntaggedResponse::Search(vec![]));
        assert_eq!(untagged(b"* SEARCH \r\n"), UntaggedResponse::Search(vec![]));
    }

    #[test]
    fn message_data() {
        assert_eq!(untagged(b"* 172 EXISTS\r\n"), UntaggedResponse::Exists(172));
        assert_eq!(untagged(b"* 1 RECENT\r\n"), UntaggedResponse::Recent(1));
        assert_eq!(
            untagged(b"* 4 EXPUNGE\r\n"),
            UntaggedResponse::Expunge(SeqNum::new(4).unwrap())
        );
        assert!(ResponseParser::parse(b"* 0 EXPUNGE\r\n").is_err());
    }

    #[test]
    fn select_codes() {
        assert!(matches!(
            untagged(b"* OK [UIDVALIDITY 3857529045] UIDs valid\r\n"),
            UntaggedResponse::Ok { code: Some(ResponseCode::UidValidity(v)), .. } if v.get() == 3857529045
        ));
        let UntaggedResponse::Ok { code, .. } =
            untagged(b"* OK [PERMANENTFLAGS (\\Deleted \\Seen \\*)] Limited\r\n")
        else {
            panic!("expected OK");
        };
        assert_eq!(
            code,
            Some(ResponseCode::PermanentFlags(vec![
                Flag::Deleted,
                Flag::Seen,
                Flag::Wildcard
            ]))
        );
    }

    #[test]
    fn flags_response() {
        let UntaggedResponse::Flags(flags) = untagged(b"* FLAGS (\\Answered \\Deleted)\r\n") else {
            panic!("expected FLAGS");
        };
        assert!(flags.is_deleted());
    }

    #[test]
    fn unknown_code_is_kept() {
        assert!(matches!(
            untagged(b"* OK [HIGHESTMODSEQ 715194045007] Highest\r\n"),
            UntaggedResponse::Ok { code: Some(ResponseCode::Unknown(ref c)), .. } if c == "HIGHESTMODSEQ"
        ));
    }

    #[test]
    fn unsupported_data_is_an_error() {
        assert!(ResponseParser::parse(b"* 3 FETCH (FLAGS (\\Seen))\r\n").is_err());
        assert!(ResponseParser::parse(b"* NAMESPACE NIL NIL NIL\r\n").is_err());
    }

    #[test]
    fn continuation() {
        assert_eq!(
            ResponseParser::parse(b"+ go ahead\r\n").unwrap(),
            Response::Continuation {
                text: Some("go ahead".into())
            }
        );
    }
}
