//! Line framing.
//!
//! Server responses are CRLF-terminated lines that may embed `{n}` literals.
//! [`FramedStream::read_response`] returns one logical response with its
//! literals inlined, ready for the parser.

#![allow(clippy::missing_errors_doc)]

use std::io;

use bytes::BytesMut;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::{Error, Result};

const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Upper bound for a single line.
const MAX_LINE_LENGTH: usize = 1024 * 1024;

/// Upper bound for a single literal.
const MAX_LITERAL_SIZE: usize = 100 * 1024 * 1024;

/// Buffered reader and writer speaking IMAP framing.
pub struct FramedStream<S> {
    reader: BufReader<S>,
    write_buffer: BytesMut,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a connected stream.
    pub fn new(stream: S) -> Self {
        Self {
            reader: BufReader::with_capacity(DEFAULT_BUFFER_SIZE, stream),
            write_buffer: BytesMut::with_capacity(256),
        }
    }

    /// Reads one response, following any literals to the final CRLF.
    pub async fn read_response(&mut self) -> Result<Vec<u8>> {
        let mut response = Vec::new();

        loop {
            let line = self.read_line().await?;
            response.extend_from_slice(&line);

            let Some(len) = literal_length(&line) else {
                return Ok(response);
            };
            if len > MAX_LITERAL_SIZE {
                return Err(Error::Protocol(format!(
                    "literal too large: {len} bytes (max {MAX_LITERAL_SIZE})"
                )));
            }
            let start = response.len();
            response.resize(start + len, 0);
            self.reader.read_exact(&mut response[start..]).await?;
        }
    }

    async fn read_line(&mut self) -> Result<Vec<u8>> {
        let mut line = Vec::new();

        loop {
            let buf = self.reader.fill_buf().await?;
            if buf.is_empty() {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed",
                )));
            }

            // A CR may sit at the end of the previous chunk.
            let search_from = line.len().saturating_sub(1);
            line.extend_from_slice(buf);
            let consumed = buf.len();

            if let Some(pos) = find_crlf(&line[search_from..]) {
                let end = search_from + pos + 2;
                let extra = line.len() - end;
                line.truncate(end);
                self.reader.consume(consumed - extra);
                return Ok(line);
            }

            self.reader.consume(consumed);
            if line.len() > MAX_LINE_LENGTH {
                return Err(Error::Protocol("line too long".to_string()));
            }
        }
    }

    /// Writes and flushes one encoded command.
    pub async fn write_command(&mut self, data: &[u8]) -> Result<()> {
        self.write_buffer.clear();
        self.write_buffer.extend_from_slice(data);

        let stream = self.reader.get_mut();
        stream.write_all(&self.write_buffer).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Shuts down the write half.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.reader.get_mut().shutdown().await?;
        Ok(())
    }
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

/// Returns `n` if the line ends with `{n}` or `{n+}` before its CRLF.
fn literal_length(line: &[u8]) -> Option<usize> {
    let body = line.strip_suffix(b"\r\n")?.strip_suffix(b"}")?;
    let body = body.strip_suffix(b"+").unwrap_or(body);
    let open = body.iter().rposition(|&b| b == b'{')?;
    let digits = &body[open + 1..];
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

/// Collects response lines up to the completion of one command.
pub struct ResponseAccumulator {
    tag: String,
    responses: Vec<Vec<u8>>,
    bye: Option<String>,
}

impl ResponseAccumulator {
    /// Creates an accumulator waiting for `tag`.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            responses: Vec::new(),
            bye: None,
        }
    }

    /// Reads until the tagged completion line, which is included last.
    ///
    /// If the server sends `* BYE` and then closes the connection, the error
    /// is [`Error::Bye`] carrying the server's text instead of a bare EOF.
    pub async fn read_until_tagged<S>(
        &mut self,
        framed: &mut FramedStream<S>,
    ) -> Result<Vec<Vec<u8>>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        loop {
            let response = match framed.read_response().await {
                Ok(response) => response,
                Err(Error::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    return Err(self.bye.take().map_or(Error::Io(e), Error::Bye));
                }
                Err(e) => return Err(e),
            };

            if let Some(text) = bye_text(&response) {
                self.bye = Some(text);
            }

            let is_tagged = response
                .strip_prefix(self.tag.as_bytes())
                .is_some_and(|rest| rest.first() == Some(&b' '));
            self.responses.push(response);

            if is_tagged {
                return Ok(std::mem::take(&mut self.responses));
            }
        }
    }
}

fn bye_text(line: &[u8]) -> Option<String> {
    let rest = line.strip_prefix(b"* ")?;
    if rest.len() < 3 || !rest[..3].eq_ignore_ascii_case(b"BYE") {
        return None;
    }
    let text = rest[3..].strip_suffix(b"\r\n").unwrap_or(&rest[3..]);
    Some(String::from_utf8_lossy(text).trim().to_string())
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
    use tokio_test::io::Builder;

    use super::*;

    #[test]
    fn literal_length_detection() {
        assert_eq!(literal_length(b"* LIST () \"/\" {12}\r\n"), Some(12));
        assert_eq!(literal_length(b"A1 LOGIN {5+}\r\n"), Some(5));
        assert_eq!(literal_length(b"{0}\r\n"), Some(0));
        assert_eq!(literal_length(b"* OK done\r\n"), None);
        assert_eq!(literal_length(b"* OK {}\r\n"), None);
        assert_eq!(literal_length(b"* OK {x1}\r\n"), None);
        assert_eq!(literal_length(b"* OK {12}"), None);
    }

    #[tokio::test]
    async fn reads_line_split_across_chunks() {
        let mock = Builder::new().read(b"* OK rea").read(b"dy\r").read(b"\n").build();
        let mut framed = FramedStream::new(mock);
        assert_eq!(framed.read_response().await.unwrap(), b"* OK ready\r\n");
    }

    #[tokio::test]
    async fn reads_two_lines_from_one_chunk() {
        let mock = Builder::new().read(b"* 2 EXISTS\r\n* 0 RECENT\r\n").build();
        let mut framed = FramedStream::new(mock);
        assert_eq!(framed.read_response().await.unwrap(), b"* 2 EXISTS\r\n");
        assert_eq!(framed.read_response().await.unwrap(), b"* 0 RECENT\r\n");
    }

    #[tokio::test]
    async fn inlines_literals() {
        let mock = Builder::new()
            .read(b"* LIST () \"/\" {5}\r\n")
            .read(b"Inbox\r\n")
            .build();
        let mut framed = FramedStream::new(mock);
        assert_eq!(
            framed.read_response().await.unwrap(),
            b"* LIST () \"/\" {5}\r\nInbox\r\n"
        );
    }

    #[tokio::test]
    async fn rejects_huge_literal() {
        let header = format!("* LIST () \"/\" {{{}}}\r\n", MAX_LITERAL_SIZE + 1);
        let mock = Builder::new().read(header.as_bytes()).build();
        let mut framed = FramedStream::new(mock);
        let err = framed.read_response().await.unwrap_err();
        assert!(err.to_string().contains("literal too large"));
    }

    #[tokio::test]
    async fn rejects_endless_line() {
        let long_line = "A".repeat(MAX_LINE_LENGTH + 100);
        let mock = Builder::new().read(long_line.as_bytes()).build();
        let mut framed = FramedStream::new(mock);
        let err = framed.read_response().await.unwrap_err();
        assert!(err.to_string().contains("line too long"));
    }

    #[tokio::test]
    async fn writes_command() {
        let mock = Builder::new().write(b"A0000 LOGOUT\r\n").build();
        let mut framed = FramedStream::new(mock);
        framed.write_command(b"A0000 LOGOUT\r\n").await.unwrap();
    }

    #[tokio::test]
    async fn accumulates_until_own_tag() {
        let mock = Builder::new()
            .read(b"* SEARCH 1 2\r\n")
            .read(b"A00011 OK not ours\r\n")
            .read(b"A0001 OK SEARCH done\r\n")
            .build();
        let mut framed = FramedStream::new(mock);
        let responses = ResponseAccumulator::new("A0001")
            .read_until_tagged(&mut framed)
            .await
            .unwrap();
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[2], b"A0001 OK SEARCH done\r\n");
    }

    #[tokio::test]
    async fn bye_then_eof_reports_bye() {
        let mock = Builder::new()
            .read(b"* BYE Idle timeout\r\n")
            .build();
        let mut framed = FramedStream::new(mock);
        let err = ResponseAccumulator::new("A0003")
            .read_until_tagged(&mut framed)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Bye(ref text) if text == "Idle timeout"));
    }

    #[tokio::test]
    async fn plain_eof_is_io_error() {
        let mock = Builder::new().read(b"* 1 EXISTS\r\n").build();
        let mut framed = FramedStream::new(mock);
        let err = ResponseAccumulator::new("A0003")
            .read_until_tagged(&mut framed)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
