//! Encoding helpers for command arguments.

use chrono::NaiveDate;

use crate::types::Mailbox;

use super::types::{SearchCriteria, StoreAction};

/// An encoded command.
///
/// Synchronizing literals split the bytes into parts: every part but the
/// last ends with a `{n}` header, and the server must answer it with a
/// continuation before the next part goes out.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct Encoded {
    bytes: Vec<u8>,
    splits: Vec<usize>,
}

// The bytes may hold a password.
impl std::fmt::Debug for Encoded {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encoded")
            .field("len", &self.bytes.len())
            .field("literals", &self.splits.len())
            .finish()
    }
}

impl Encoded {
    /// The whole command as sent, literals inline.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The pieces to send, one continuation apart.
    pub fn parts(&self) -> impl Iterator<Item = &[u8]> {
        let mut start = 0;
        self.splits
            .iter()
            .copied()
            .chain(std::iter::once(self.bytes.len()))
            .map(move |end| {
                let part = &self.bytes[start..end];
                start = end;
                part
            })
    }

    pub(crate) fn push(&mut self, b: u8) {
        self.bytes.push(b);
    }

    pub(crate) fn extend_from_slice(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
    }

    fn literal(&mut self, data: &[u8]) {
        self.extend_from_slice(format!("{{{}}}\r\n", data.len()).as_bytes());
        self.splits.push(self.bytes.len());
        self.extend_from_slice(data);
    }
}

/// Writes an astring: bare when it is a plain atom, quoted when it has
/// specials, and as a literal when it has 8-bit bytes or line breaks, which
/// a quoted string cannot carry.
pub fn write_astring(buf: &mut Encoded, s: &str) {
    if s.bytes().any(needs_literal) {
        buf.literal(s.as_bytes());
    } else if s.is_empty() || s.bytes().any(needs_quoting) {
        write_quoted(buf, s);
    } else {
        buf.extend_from_slice(s.as_bytes());
    }
}

/// Writes a quoted string with `"` and `\` escaped.
pub fn write_quoted(buf: &mut Encoded, s: &str) {
    buf.push(b'"');
    for b in s.bytes() {
        if b == b'"' || b == b'\\' {
            buf.push(b'\\');
        }
        buf.push(b);
    }
    buf.push(b'"');
}

/// Writes a mailbox name.
pub fn write_mailbox(buf: &mut Encoded, mailbox: &Mailbox) {
    write_astring(buf, mailbox.as_str());
}

const fn needs_literal(b: u8) -> bool {
    b >= 0x80 || b == b'\r' || b == b'\n'
}

const fn needs_quoting(b: u8) -> bool {
    matches!(
        b,
        b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*' | b']'
    ) || b < 0x20
        || b == 0x7F
}

/// Writes a date as `d-Mon-yyyy`.
pub fn write_date(buf: &mut Encoded, date: NaiveDate) {
    buf.extend_from_slice(date.format("%-d-%b-%Y").to_string().as_bytes());
}

/// Writes `+FLAGS.SILENT (\Deleted)` and friends.
pub fn write_store_action(buf: &mut Encoded, action: &StoreAction, silent: bool) {
    buf.extend_from_slice(action.item_name().as_bytes());
    if silent {
        buf.extend_from_slice(b".SILENT");
    }
    buf.extend_from_slice(b" (");
    for (i, flag) in action.flags().iter().enumerate() {
        if i > 0 {
            buf.push(b' ');
        }
        buf.extend_from_slice(flag.as_str().as_bytes());
    }
    buf.push(b')');
}

/// Writes SEARCH keys; a top-level AND is a plain space-separated list.
pub fn write_search_criteria(buf: &mut Encoded, criteria: &SearchCriteria) {
    match criteria {
        SearchCriteria::Since(date) => {
            buf.extend_from_slice(b"SINCE ");
            write_date(buf, *date);
        }
        SearchCriteria::Before(date) => {
            buf.extend_from_slice(b"BEFORE ");
            write_date(buf, *date);
        }
        SearchCriteria::And(keys) => {
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    buf.push(b' ');
                }
                if matches!(key, SearchCriteria::And(_)) {
                    buf.push(b'(');
                    write_search_criteria(buf, key);
                    buf.push(b')');
                } else {
                    write_search_criteria(buf, key);
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn astring(s: &str) -> String {
        let mut buf = Encoded::default();
        write_astring(&mut buf, s);
        String::from_utf8(buf.as_bytes().to_vec()).unwrap()
    }

    #[test]
    fn atoms_stay_bare() {
        assert_eq!(astring("INBOX"), "INBOX");
        assert_eq!(astring("user@example.com"), "user@example.com");
    }

    #[test]
    fn specials_are_quoted_and_escaped() {
        assert_eq!(astring(""), "\"\"");
        assert_eq!(astring("Sent Items"), "\"Sent Items\"");
        assert_eq!(astring("a\"b\\c"), "\"a\\\"b\\\\c\"");
        assert_eq!(astring("[Gmail]/All Mail"), "\"[Gmail]/All Mail\"");
    }

    #[test]
    fn eight_bit_goes_out_as_a_literal() {
        let mut buf = Encoded::default();
        buf.extend_from_slice(b"A1 LOGIN bob ");
        write_astring(&mut buf, "grüße");
        buf.extend_from_slice(b"\r\n");

        assert_eq!(buf.as_bytes(), "A1 LOGIN bob {7}\r\ngrüße\r\n".as_bytes());
        let parts: Vec<&[u8]> = buf.parts().collect();
        assert_eq!(parts, [&b"A1 LOGIN bob {7}\r\n"[..], "grüße\r\n".as_bytes()]);
    }

    #[test]
    fn plain_command_is_one_part() {
        let mut buf = Encoded::default();
        buf.extend_from_slice(b"A1 SELECT ");
        write_astring(&mut buf, "Sent Items");
        assert_eq!(buf.parts().count(), 1);
    }

    #[test]
    fn dates_use_imap_layout() {
        let mut buf = Encoded::default();
        write_date(&mut buf, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(buf.as_bytes(), b"5-Mar-2024");
    }

    #[test]
    fn nested_and_is_parenthesised() {
        let date = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let criteria = SearchCriteria::And(vec![
            SearchCriteria::Before(date),
            SearchCriteria::And(vec![SearchCriteria::Since(date), SearchCriteria::Before(date)]),
        ]);
        let mut buf = Encoded::default();
        write_search_criteria(&mut buf, &criteria);
        assert_eq!(
            buf.as_bytes(),
            b"BEFORE 31-Dec-2023 (SINCE 31-Dec-2023 BEFORE 31-Dec-2023)"
        );
    }
}
