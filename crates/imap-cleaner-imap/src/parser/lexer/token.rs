//! Lexer tokens.

/// One lexical unit of a response line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Bare atom, including flags such as `\Deleted`.
    Atom(&'a str),
    /// Quoted string with escapes resolved.
    QuotedString(String),
    /// `{n}` literal payload.
    Literal(Vec<u8>),
    /// All-digit atom.
    Number(u32),
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// Single space.
    Space,
    /// `*`
    Asterisk,
    /// `+`
    Plus,
    /// `NIL`, case-insensitive.
    Nil,
    /// Line terminator.
    Crlf,
    /// End of input.
    Eof,
}
