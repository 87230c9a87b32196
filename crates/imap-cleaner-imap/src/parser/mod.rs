//! Sans-I/O parser for server responses.
//!
//! [`Lexer`] turns one response line (literals included) into tokens and
//! [`ResponseParser`] builds a [`Response`] from them. Only the responses
//! produced by the commands this crate sends are understood; anything else
//! parses to an error. The client skips lines it did not ask for, but a
//! malformed line of the kind it did ask for fails the command.
//!
//! ```
//! use imap_cleaner_imap::parser::{Response, ResponseParser, UntaggedResponse};
//!
//! let response = ResponseParser::parse(b"* 3 EXPUNGE\r\n").unwrap();
//! assert!(matches!(response, Response::Untagged(UntaggedResponse::Expunge(_))));
//! ```

pub mod lexer;
pub mod response;

pub use lexer::{Lexer, Token};
pub use response::{Response, ResponseParser, UntaggedResponse};
