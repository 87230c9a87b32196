//! In-memory mail server for engine tests.

#![allow(clippy::unwrap_used, clippy::panic, clippy::missing_panics_doc)]

use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use imap_cleaner_imap::{
    Error, ListResponse, Mailbox, MailboxAttribute, Result, SearchCriteria, SeqNum, SequenceSet,
    StoreAction,
};

use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

use crate::session::{MailSession, Session};

/// Log output at `WARN` and above, captured for the current thread while
/// the guard lives.
#[derive(Debug, Clone, Default)]
pub struct Warnings(Arc<Mutex<Vec<u8>>>);

impl Warnings {
    pub fn capture() -> (Self, DefaultGuard) {
        let warnings = Self::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(warnings.clone())
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .without_time()
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (warnings, guard)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Warnings {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Warnings {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// One command as the fake saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List,
    Select(String),
    Search(SearchCriteria),
    Store(String, StoreAction),
    Expunge,
    Logout,
}

/// Which command to sabotage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    List,
    Select(String),
    Search,
    Store,
    Expunge,
    Logout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeMessage {
    pub date: NaiveDate,
    pub deleted: bool,
}

pub fn msg(y: i32, m: u32, d: u32) -> FakeMessage {
    FakeMessage {
        date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
        deleted: false,
    }
}

pub fn deleted(y: i32, m: u32, d: u32) -> FakeMessage {
    FakeMessage {
        deleted: true,
        ..msg(y, m, d)
    }
}

#[derive(Debug)]
struct FakeMailbox {
    name: String,
    attributes: Vec<MailboxAttribute>,
    messages: Vec<FakeMessage>,
}

#[derive(Debug, Default)]
struct State {
    mailboxes: Vec<FakeMailbox>,
    selected: Option<usize>,
    calls: Vec<Call>,
    fail: Vec<Step>,
    panic: Vec<Step>,
    logged_out: bool,
}

impl State {
    fn trip(&self, step: &Step) -> Result<()> {
        if self.panic.contains(step) {
            panic!("injected panic at {step:?}");
        }
        if self.fail.contains(step) {
            return Err(Error::No(format!("injected failure at {step:?}")));
        }
        Ok(())
    }

    fn selected_mut(&mut self) -> Result<&mut FakeMailbox> {
        match self.selected {
            Some(i) => Ok(&mut self.mailboxes[i]),
            None => Err(Error::InvalidState("no mailbox selected".to_string())),
        }
    }
}

/// Shared handle: the session owns one clone, the test keeps another.
#[derive(Debug, Clone, Default)]
pub struct FakeServer(Rc<RefCell<State>>);

impl FakeServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mailbox(self, name: &str, messages: Vec<FakeMessage>) -> Self {
        self.0.borrow_mut().mailboxes.push(FakeMailbox {
            name: name.to_string(),
            attributes: vec![MailboxAttribute::HasNoChildren],
            messages,
        });
        self
    }

    pub fn with_noselect(self, name: &str) -> Self {
        self.0.borrow_mut().mailboxes.push(FakeMailbox {
            name: name.to_string(),
            attributes: vec![MailboxAttribute::NoSelect, MailboxAttribute::HasChildren],
            messages: Vec::new(),
        });
        self
    }

    pub fn fail_on(self, step: Step) -> Self {
        self.0.borrow_mut().fail.push(step);
        self
    }

    pub fn panic_on(self, step: Step) -> Self {
        self.0.borrow_mut().panic.push(step);
        self
    }

    pub fn session(&self) -> Session<Self> {
        Session::new(self.clone())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().calls.clone()
    }

    pub fn messages(&self, mailbox: &str) -> Vec<FakeMessage> {
        self.0
            .borrow()
            .mailboxes
            .iter()
            .find(|m| m.name == mailbox)
            .map(|m| m.messages.clone())
            .unwrap_or_default()
    }

    pub fn logged_out(&self) -> bool {
        self.0.borrow().logged_out
    }
}

fn evaluate(criteria: &SearchCriteria, message: &FakeMessage) -> bool {
    match criteria {
        SearchCriteria::Since(day) => message.date >= *day,
        SearchCriteria::Before(day) => message.date < *day,
        SearchCriteria::And(keys) => keys.iter().all(|k| evaluate(k, message)),
    }
}

fn seq(index: usize) -> SeqNum {
    SeqNum::new(u32::try_from(index + 1).unwrap()).unwrap()
}

impl MailSession for FakeServer {
    async fn list(&mut self) -> Result<Vec<ListResponse>> {
        let mut state = self.0.borrow_mut();
        state.calls.push(Call::List);
        state.trip(&Step::List)?;
        Ok(state
            .mailboxes
            .iter()
            .map(|m| ListResponse {
                attributes: m.attributes.clone(),
                delimiter: Some('/'),
                mailbox: Mailbox::new(m.name.clone()),
            })
            .collect())
    }

    async fn select(&mut self, mailbox: &str) -> Result<()> {
        let mut state = self.0.borrow_mut();
        state.calls.push(Call::Select(mailbox.to_string()));
        state.selected = None;
        state.trip(&Step::Select(mailbox.to_string()))?;
        let index = state
            .mailboxes
            .iter()
            .position(|m| m.name == mailbox && !m.attributes.contains(&MailboxAttribute::NoSelect))
            .ok_or_else(|| Error::No("Mailbox doesn't exist".to_string()))?;
        state.selected = Some(index);
        Ok(())
    }

    async fn search(&mut self, criteria: &SearchCriteria) -> Result<Vec<SeqNum>> {
        let mut state = self.0.borrow_mut();
        state.calls.push(Call::Search(criteria.clone()));
        state.trip(&Step::Search)?;
        let mailbox = state.selected_mut()?;
        Ok(mailbox
            .messages
            .iter()
            .enumerate()
            .filter(|(_, m)| evaluate(criteria, m))
            .map(|(i, _)| seq(i))
            .collect())
    }

    async fn store(&mut self, set: &SequenceSet, action: StoreAction) -> Result<()> {
        let mut state = self.0.borrow_mut();
        state.calls.push(Call::Store(set.to_string(), action.clone()));
        state.trip(&Step::Store)?;
        let mailbox = state.selected_mut()?;
        let deleted = matches!(action, StoreAction::Add(_));
        for (i, message) in mailbox.messages.iter_mut().enumerate() {
            if set.contains(seq(i)) {
                message.deleted = deleted;
            }
        }
        Ok(())
    }

    async fn expunge(&mut self) -> Result<Vec<SeqNum>> {
        let mut state = self.0.borrow_mut();
        state.calls.push(Call::Expunge);
        state.trip(&Step::Expunge)?;
        let mailbox = state.selected_mut()?;
        let mut notices = Vec::new();
        for i in (0..mailbox.messages.len()).rev() {
            if mailbox.messages[i].deleted {
                mailbox.messages.remove(i);
                notices.push(seq(i));
            }
        }
        Ok(notices)
    }

    async fn logout(self) -> Result<()> {
        let mut state = self.0.borrow_mut();
        state.calls.push(Call::Logout);
        state.logged_out = true;
        state.trip(&Step::Logout)
    }
}
