//! Parsers for the pieces shared by several responses.

use crate::parser::lexer::{Lexer, Token};
use crate::types::{
    Capability, Flag, Flags, ListResponse, Mailbox, MailboxAttribute, ResponseCode, SeqNum, Uid,
    UidValidity,
};
use crate::{Error, Result};

fn nonzero<T>(lexer: &mut Lexer<'_>, make: fn(u32) -> Option<T>, what: &str) -> Result<T> {
    lexer.expect_space()?;
    let n = lexer.read_number()?;
    make(n).ok_or_else(|| Error::Parse {
        position: lexer.position(),
        message: format!("Invalid {what} 0"),
    })
}

/// Parses `[CODE args]`.
pub fn parse_response_code(lexer: &mut Lexer<'_>) -> Result<ResponseCode> {
    lexer.expect(Token::LBracket)?;

    let atom = lexer.read_atom_string()?;
    let code = match atom.to_ascii_uppercase().as_str() {
        "ALERT" => ResponseCode::Alert,
        "READ-ONLY" => ResponseCode::ReadOnly,
        "READ-WRITE" => ResponseCode::ReadWrite,
        "TRYCREATE" => ResponseCode::TryCreate,
        "NONEXISTENT" => ResponseCode::NonExistent,
        "AUTHENTICATIONFAILED" => ResponseCode::AuthenticationFailed,
        "UIDNEXT" => ResponseCode::UidNext(nonzero(lexer, Uid::new, "UID")?),
        "UIDVALIDITY" => ResponseCode::UidValidity(nonzero(lexer, UidValidity::new, "UIDVALIDITY")?),
        "UNSEEN" => ResponseCode::Unseen(nonzero(lexer, SeqNum::new, "sequence number")?),
        "CAPABILITY" => ResponseCode::Capability(parse_capability_data(lexer)?),
        "PERMANENTFLAGS" => {
            lexer.expect_space()?;
            ResponseCode::PermanentFlags(parse_flag_list(lexer)?.iter().cloned().collect())
        }
        _ => ResponseCode::Unknown(atom.to_string()),
    };

    // Arguments of unknown codes are skipped.
    while lexer.peek().is_some_and(|b| b != b']' && b != b'\r') {
        lexer.advance();
    }
    lexer.expect(Token::RBracket)?;

    Ok(code)
}

/// Parses the space-separated atoms after `CAPABILITY`.
pub fn parse_capability_data(lexer: &mut Lexer<'_>) -> Result<Vec<Capability>> {
    let mut caps = Vec::new();
    while lexer.peek() == Some(b' ') {
        lexer.advance();
        if let Token::Atom(s) = lexer.next_token()? {
            caps.push(Capability::parse(s));
        }
    }
    Ok(caps)
}

/// Parses `(\Flag ...)`.
pub fn parse_flag_list(lexer: &mut Lexer<'_>) -> Result<Flags> {
    lexer.expect(Token::LParen)?;
    let mut flags = Flags::new();
    loop {
        match lexer.next_token()? {
            Token::RParen => return Ok(flags),
            Token::Space => {}
            Token::Atom(s) => flags.insert(Flag::parse(s)),
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("Unexpected token in flag list: {token:?}"),
                });
            }
        }
    }
}

/// Parses `(attrs) delimiter name` after `LIST `.
pub fn parse_list_response(lexer: &mut Lexer<'_>) -> Result<ListResponse> {
    lexer.expect(Token::LParen)?;
    let mut attributes = Vec::new();
    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => {}
            Token::Atom(s) => attributes.push(MailboxAttribute::parse(s)),
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("Unexpected token in LIST attributes: {token:?}"),
                });
            }
        }
    }

    lexer.expect_space()?;
    let delimiter = match lexer.next_token()? {
        Token::Nil => None,
        Token::QuotedString(s) => s.chars().next(),
        token => {
            return Err(Error::Parse {
                position: lexer.position(),
                message: format!("Expected delimiter, got {token:?}"),
            });
        }
    };

    lexer.expect_space()?;
    let name = lexer.read_astring()?;

    Ok(ListResponse {
        attributes,
        delimiter,
        mailbox: Mailbox::new(name),
    })
}

/// Parses the numbers after `SEARCH`; zero is dropped.
pub fn parse_search_response(lexer: &mut Lexer<'_>) -> Result<Vec<SeqNum>> {
    let mut nums = Vec::new();
    while lexer.peek() == Some(b' ') {
        lexer.advance();
        match lexer.next_token()? {
            Token::Number(n) => nums.extend(SeqNum::new(n)),
            // Trailing space before CRLF, seen on some servers.
            Token::Crlf | Token::Eof => break,
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("Expected number in SEARCH, got {token:?}"),
                });
            }
        }
    }
    Ok(nums)
}

/// Consumes the rest of the line and returns it without CRLF.
pub fn read_text_until_crlf(lexer: &mut Lexer<'_>) -> String {
    let remaining = lexer.remaining();
    let end = remaining
        .windows(2)
        .position(|w| w == b"\r\n")
        .unwrap_or(remaining.len());
    lexer.skip(end + 2);
    String::from_utf8_lossy(&remaining[..end]).into_owned()
}
