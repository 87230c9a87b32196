//! Engine runs over the real IMAP client on a scripted connection.

use std::io;

use chrono::NaiveDateTime;
use tokio_test::io::Builder;

use imap_cleaner_core::{
    Error, ImapSession, OperationMode, RunConfig, SelectionCriteria, Session, run_session,
};

const GREETING: &[u8] = b"* OK [CAPABILITY IMAP4rev1] ready\r\n";

const LIST_REPLY: &[u8] = b"* LIST (\\HasNoChildren) \"/\" INBOX\r\n\
* LIST (\\HasNoChildren) \"/\" Archive\r\n\
* LIST (\\Noselect \\HasChildren) \"/\" \"[Gmail]\"\r\n\
A0001 OK LIST completed\r\n";

fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

fn logged_in() -> Builder {
    let mut builder = Builder::new();
    builder
        .read(GREETING)
        .write(b"A0000 LOGIN alice secret\r\n")
        .read(b"A0000 OK Logged in\r\n");
    builder
}

#[tokio::test]
async fn cleanup_of_one_mailbox() {
    let mock = logged_in()
        .write(b"A0001 LIST \"\" \"*\"\r\n")
        .read(LIST_REPLY)
        .write(b"A0002 SELECT Archive\r\n")
        .read(b"* 5 EXISTS\r\n* 0 RECENT\r\n* OK [UIDVALIDITY 42] ok\r\nA0002 OK [READ-WRITE] SELECT completed\r\n")
        .write(b"A0003 SEARCH SINCE 1-Jan-2020 BEFORE 1-Jun-2020\r\n")
        .read(b"* SEARCH 2 3 5\r\nA0003 OK SEARCH completed\r\n")
        .write(b"A0004 STORE 2:3,5 +FLAGS.SILENT (\\Deleted)\r\n")
        .read(b"A0004 OK STORE completed\r\n")
        .write(b"A0005 EXPUNGE\r\n")
        .read(b"* 5 EXPUNGE\r\n* 3 EXPUNGE\r\n* 2 EXPUNGE\r\nA0005 OK EXPUNGE completed\r\n")
        .write(b"A0006 LOGOUT\r\n")
        .read(b"* BYE logging out\r\nA0006 OK LOGOUT completed\r\n")
        .build();

    let transport = ImapSession::login(mock, "imap.example.com", 993, "alice", "secret")
        .await
        .unwrap();
    let config = RunConfig::builder("imap.example.com", "alice")
        .mode(OperationMode::Cleanup)
        .mailboxes(["Archive"])
        .criteria(SelectionCriteria::new(
            Some(at("2020-01-01 00:00:00")),
            Some(at("2020-06-01 00:00:00")),
        ))
        .build();

    let report = run_session(Session::new(transport), &config).await.unwrap();
    assert_eq!(report.mailboxes.len(), 1);
    assert_eq!(report.mailboxes[0].matched, Some(3));
    assert_eq!(report.mailboxes[0].mutated, 3);
    assert_eq!(report.total_expunged(), 3);
}

#[tokio::test]
async fn list_prints_every_mailbox_and_sends_nothing_else() {
    let mock = logged_in()
        .write(b"A0001 LIST \"\" \"*\"\r\n")
        .read(LIST_REPLY)
        .write(b"A0002 LOGOUT\r\n")
        .read(b"* BYE logging out\r\nA0002 OK LOGOUT completed\r\n")
        .build();

    let transport = ImapSession::login(mock, "imap.example.com", 993, "alice", "secret")
        .await
        .unwrap();
    let config = RunConfig::builder("imap.example.com", "alice")
        .mailboxes(["Archive"])
        .build();

    let report = run_session(Session::new(transport), &config).await.unwrap();
    assert_eq!(report.listed, ["INBOX", "Archive", "[Gmail]"]);
}

#[tokio::test]
async fn read_only_mailbox_aborts_with_expunge_error_and_logs_out() {
    let mock = logged_in()
        .write(b"A0001 LIST \"\" \"*\"\r\n")
        .read(LIST_REPLY)
        .write(b"A0002 SELECT INBOX\r\n")
        .read(b"* 1 EXISTS\r\nA0002 OK [READ-WRITE] SELECT completed\r\n")
        .write(b"A0003 EXPUNGE\r\n")
        .read(b"A0003 NO [READ-ONLY] Mailbox is read-only\r\n")
        .write(b"A0004 LOGOUT\r\n")
        .read(b"A0004 OK LOGOUT completed\r\n")
        .build();

    let transport = ImapSession::login(mock, "imap.example.com", 993, "alice", "secret")
        .await
        .unwrap();
    let config = RunConfig::builder("imap.example.com", "alice")
        .mode(OperationMode::Expunge)
        .build();

    let err = run_session(Session::new(transport), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Expunge { ref mailbox, .. } if mailbox == "INBOX"));
    assert!(err.imap().is_some_and(imap_cleaner_imap::Error::is_no));
}

#[tokio::test]
async fn dropped_connection_is_fatal_and_close_does_not_fail() {
    let mock = logged_in()
        .write(b"A0001 LIST \"\" \"*\"\r\n")
        .read(b"* LIST () \"/\" INBOX\r\n")
        .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer"))
        .write_error(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"))
        .build();

    let transport = ImapSession::login(mock, "imap.example.com", 993, "alice", "secret")
        .await
        .unwrap();
    let config = RunConfig::builder("imap.example.com", "alice")
        .mode(OperationMode::Expunge)
        .build();

    // LOGOUT hits the broken pipe; the run still reports the LIST failure.
    let err = run_session(Session::new(transport), &config)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::List(imap_cleaner_imap::Error::Io(ref e)) if e.kind() == io::ErrorKind::ConnectionReset
    ));
}

#[tokio::test]
async fn bare_bracketed_mailbox_is_listed_and_processed() {
    let mock = logged_in()
        .write(b"A0001 LIST \"\" \"*\"\r\n")
        .read(b"* LIST (\\HasNoChildren) \"/\" INBOX\r\n")
        .read(b"* LIST (\\HasNoChildren) \"/\" [Gmail]/Trash\r\n")
        .read(b"A0001 OK LIST completed\r\n")
        .write(b"A0002 SELECT INBOX\r\n")
        .read(b"* 0 EXISTS\r\nA0002 OK [READ-WRITE] SELECT completed\r\n")
        .write(b"A0003 EXPUNGE\r\n")
        .read(b"A0003 OK EXPUNGE completed\r\n")
        .write(b"A0004 SELECT \"[Gmail]/Trash\"\r\n")
        .read(b"* 2 EXISTS\r\nA0004 OK [READ-WRITE] SELECT completed\r\n")
        .write(b"A0005 EXPUNGE\r\n")
        .read(b"* 1 EXPUNGE\r\nA0005 OK EXPUNGE completed\r\n")
        .write(b"A0006 LOGOUT\r\n")
        .read(b"A0006 OK LOGOUT completed\r\n")
        .build();

    let transport = ImapSession::login(mock, "imap.example.com", 993, "alice", "secret")
        .await
        .unwrap();
    let config = RunConfig::builder("imap.example.com", "alice")
        .mode(OperationMode::Expunge)
        .build();

    let report = run_session(Session::new(transport), &config).await.unwrap();
    let names: Vec<_> = report.mailboxes.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["INBOX", "[Gmail]/Trash"]);
    assert_eq!(report.total_expunged(), 1);
}

#[tokio::test]
async fn garbled_list_line_aborts_the_run() {
    let mock = logged_in()
        .write(b"A0001 LIST \"\" \"*\"\r\n")
        .read(b"* LIST (\\HasNoChildren) \"/\" INBOX\r\n")
        .read(b"* LIST (\\HasNoChildren \"/\" Trash\r\n")
        .read(b"A0001 OK LIST completed\r\n")
        .write(b"A0002 LOGOUT\r\n")
        .read(b"A0002 OK LOGOUT completed\r\n")
        .build();

    let transport = ImapSession::login(mock, "imap.example.com", 993, "alice", "secret")
        .await
        .unwrap();
    let config = RunConfig::builder("imap.example.com", "alice")
        .mode(OperationMode::Expunge)
        .build();

    let err = run_session(Session::new(transport), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::List(imap_cleaner_imap::Error::Parse { .. })));
}
