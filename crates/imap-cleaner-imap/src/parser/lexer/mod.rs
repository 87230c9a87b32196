//! Tokenizer for server response lines.

#![allow(clippy::missing_errors_doc)]

mod token;

pub use token::Token;

use crate::{Error, Result};

/// Cursor over one response line.
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer positioned at the start of `input`.
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Current byte offset.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Unconsumed input.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.input[self.pos..]
    }

    /// Returns true once all input is consumed.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Current byte, not consumed.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    /// Consumes and returns the current byte.
    pub fn advance(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Skips up to `n` bytes.
    pub fn skip(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    /// Reads the next token.
    pub fn next_token(&mut self) -> Result<Token<'a>> {
        let Some(byte) = self.peek() else {
            return Ok(Token::Eof);
        };

        let single = match byte {
            b' ' => Some(Token::Space),
            b'(' => Some(Token::LParen),
            b')' => Some(Token::RParen),
            b'[' => Some(Token::LBracket),
            b']' => Some(Token::RBracket),
            b'*' => Some(Token::Asterisk),
            b'+' => Some(Token::Plus),
            _ => None,
        };
        if let Some(token) = single {
            self.pos += 1;
            return Ok(token);
        }

        match byte {
            b'\r' if self.peek_at(1) == Some(b'\n') => {
                self.skip(2);
                Ok(Token::Crlf)
            }
            b'\r' => Err(self.error("Expected LF after CR")),
            b'"' => self.read_quoted_string(),
            b'{' => self.read_literal(),
            _ if is_atom_char(byte) => self.read_atom(),
            _ => Err(self.error(&format!("Unexpected character: {byte:#04x}"))),
        }
    }

    fn read_quoted_string(&mut self) -> Result<Token<'a>> {
        self.advance();
        let mut bytes = Vec::new();

        loop {
            match self.advance() {
                Some(b'"') => break,
                Some(b'\\') => match self.advance() {
                    Some(c @ (b'"' | b'\\')) => bytes.push(c),
                    Some(c) => return Err(self.error(&format!("Invalid escape: \\{}", c as char))),
                    None => return Err(self.error("Unexpected EOF in quoted string")),
                },
                Some(b'\r' | b'\n') | None => {
                    return Err(self.error("Unterminated quoted string"));
                }
                Some(c) => bytes.push(c),
            }
        }

        String::from_utf8(bytes)
            .map(Token::QuotedString)
            .map_err(|_| self.error("Invalid UTF-8 in quoted string"))
    }

    /// Reads `{n}\r\n` followed by `n` bytes; `{n+}` is accepted too.
    fn read_literal(&mut self) -> Result<Token<'a>> {
        self.advance();
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        let digits = &self.input[start..self.pos];
        if self.peek() == Some(b'+') {
            self.pos += 1;
        }
        if self.advance() != Some(b'}') {
            return Err(self.error("Expected } after literal size"));
        }
        if self.advance() != Some(b'\r') || self.advance() != Some(b'\n') {
            return Err(self.error("Expected CRLF after literal size"));
        }

        let size: usize = std::str::from_utf8(digits)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| self.error("Invalid literal size"))?;
        let end = self
            .pos
            .checked_add(size)
            .filter(|&end| end <= self.input.len())
            .ok_or_else(|| self.error("Incomplete literal data"))?;

        let data = self.input[self.pos..end].to_vec();
        self.pos = end;
        Ok(Token::Literal(data))
    }

    fn read_atom(&mut self) -> Result<Token<'a>> {
        let start = self.pos;
        while self.peek().is_some_and(is_atom_char) {
            self.pos += 1;
        }
        // `\*` in PERMANENTFLAGS is a single flag even though `*` is special.
        if &self.input[start..self.pos] == b"\\" && self.peek() == Some(b'*') {
            self.pos += 1;
        }

        let s = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| self.error("Invalid UTF-8 in atom"))?;

        if s.bytes().all(|b| b.is_ascii_digit()) {
            s.parse()
                .map(Token::Number)
                .map_err(|_| self.error("Number too large"))
        } else if s.eq_ignore_ascii_case("NIL") {
            Ok(Token::Nil)
        } else {
            Ok(Token::Atom(s))
        }
    }

    fn error(&self, message: &str) -> Error {
        Error::Parse {
            position: self.pos,
            message: message.to_string(),
        }
    }

    /// Consumes a token of the same kind as `expected`.
    #[allow(clippy::needless_pass_by_value)]
    pub fn expect(&mut self, expected: Token<'_>) -> Result<()> {
        let token = self.next_token()?;
        if std::mem::discriminant(&token) == std::mem::discriminant(&expected) {
            Ok(())
        } else {
            Err(self.error(&format!("Expected {expected:?}, got {token:?}")))
        }
    }

    /// Consumes a single space.
    pub fn expect_space(&mut self) -> Result<()> {
        self.expect(Token::Space)
    }

    /// Reads an astring: a quoted string, a literal, or a run of
    /// ASTRING-CHARs taken as text.
    ///
    /// The bare form is read byte by byte rather than as a token, so digit
    /// runs and `NIL` stay text and brackets belong to the name, as in
    /// `[Gmail]/Trash`.
    pub fn read_astring(&mut self) -> Result<String> {
        match self.peek() {
            Some(b'"' | b'{') => match self.next_token()? {
                Token::QuotedString(s) => Ok(s),
                Token::Literal(data) => {
                    String::from_utf8(data).map_err(|_| self.error("Invalid UTF-8 in literal"))
                }
                token => Err(self.error(&format!("Expected astring, got {token:?}"))),
            },
            _ => {
                let start = self.pos;
                while self.peek().is_some_and(is_astring_char) {
                    self.pos += 1;
                }
                if start == self.pos {
                    return Err(self.error("Expected astring"));
                }
                std::str::from_utf8(&self.input[start..self.pos])
                    .map(str::to_string)
                    .map_err(|_| self.error("Invalid UTF-8 in astring"))
            }
        }
    }

    /// Reads a number.
    pub fn read_number(&mut self) -> Result<u32> {
        match self.next_token()? {
            Token::Number(n) => Ok(n),
            token => Err(self.error(&format!("Expected number, got {token:?}"))),
        }
    }

    /// Reads an atom.
    pub fn read_atom_string(&mut self) -> Result<&'a str> {
        match self.next_token()? {
            Token::Atom(s) => Ok(s),
            token => Err(self.error(&format!("Expected atom, got {token:?}"))),
        }
    }
}

/// Returns true for bytes allowed inside an atom.
///
/// `\` is accepted so that flags lex as one token; `]` is not, so response
/// codes close correctly.
#[must_use]
pub const fn is_atom_char(b: u8) -> bool {
    matches!(b,
        0x21 | 0x23..=0x24 | 0x26..=0x27 |
        0x2B..=0x5A |
        0x5C |
        0x5E..=0x7A |
        0x7C | 0x7E
    )
}

/// Returns true for bytes allowed in a bare astring: atom bytes plus the
/// brackets.
#[must_use]
pub const fn is_astring_char(b: u8) -> bool {
    is_atom_char(b) || b == b'[' || b == b']'
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

    fn tokens(input: &[u8]) -> Vec<Token<'_>> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token().unwrap();
            if token == Token::Eof {
                return out;
            }
            out.push(token);
        }
    }

    #[test]
    fn tagged_line() {
        assert_eq!(
            tokens(b"A0001 OK done\r\n"),
            vec![
                Token::Atom("A0001"),
                Token::Space,
                Token::Atom("OK"),
                Token::Space,
                Token::Atom("done"),
                Token::Crlf,
            ]
        );
    }

    #[test]
    fn numbers_and_nil() {
        assert_eq!(
            tokens(b"* 12 nil"),
            vec![
                Token::Asterisk,
                Token::Space,
                Token::Number(12),
                Token::Space,
                Token::Nil
            ]
        );
    }

    #[test]
    fn flags_are_single_atoms() {
        assert_eq!(
            tokens(b"(\\Deleted \\*)"),
            vec![
                Token::LParen,
                Token::Atom("\\Deleted"),
                Token::Space,
                Token::Atom("\\*"),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn quoted_string_escapes() {
        assert_eq!(
            tokens(br#""a \"b\" \\c""#),
            vec![Token::QuotedString("a \"b\" \\c".to_string())]
        );
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        let mut lexer = Lexer::new(b"\"open\r\n");
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn literal_payload() {
        let mut lexer = Lexer::new(b"{5}\r\nhello rest");
        assert_eq!(lexer.next_token().unwrap(), Token::Literal(b"hello".to_vec()));
        assert_eq!(lexer.remaining(), b" rest");
    }

    #[test]
    fn short_literal_is_an_error() {
        let mut lexer = Lexer::new(b"{10}\r\nabc");
        assert!(matches!(
            lexer.next_token(),
            Err(Error::Parse { message, .. }) if message.contains("Incomplete")
        ));
    }

    #[test]
    fn numeric_astring_keeps_text() {
        let mut lexer = Lexer::new(b"007");
        assert_eq!(lexer.read_astring().unwrap(), "007");
    }

    #[test]
    fn bare_astring_keeps_brackets() {
        let mut lexer = Lexer::new(b"[Gmail]/Trash\r\n");
        assert_eq!(lexer.read_astring().unwrap(), "[Gmail]/Trash");
        assert_eq!(lexer.next_token().unwrap(), Token::Crlf);

        let mut lexer = Lexer::new(b"nil");
        assert_eq!(lexer.read_astring().unwrap(), "nil");
    }

    #[test]
    fn missing_astring_is_an_error() {
        let mut lexer = Lexer::new(b"\r\n");
        assert!(lexer.read_astring().is_err());
    }

    #[test]
    fn bracket_closes_atom() {
        assert_eq!(
            tokens(b"[READ-WRITE]"),
            vec![Token::LBracket, Token::Atom("READ-WRITE"), Token::RBracket]
        );
    }
}
