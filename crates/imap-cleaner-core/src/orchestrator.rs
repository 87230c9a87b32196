//! Orchestrator: one session, every mailbox, the steps the mode asks for.
//!
//! ```text
//! CONNECTING → AUTHENTICATED → ENUMERATING
//!     → per mailbox: SELECTING → [SEARCHING] → [MUTATING] → [EXPUNGING]
//!     → CLOSED
//! ```
//!
//! The first error stops everything that is left and goes straight to
//! CLOSED. The session is logged out on every path, panics included.

use std::panic::{self, AssertUnwindSafe};

use futures::FutureExt;
use tracing::{debug, info, warn};

use crate::config::{OperationMode, RunConfig};
use crate::enumerator::{self, MailboxDescriptor};
use crate::session::{MailSession, Session};
use crate::{Result, expunge, mutator, selector};

/// What happened in one mailbox.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailboxOutcome {
    /// Mailbox name.
    pub name: String,
    /// Messages inside the date window; `None` when no search ran.
    pub matched: Option<usize>,
    /// Messages whose `\Deleted` flag was set or cleared.
    pub mutated: usize,
    /// Messages permanently removed; `None` when the mode does not expunge.
    pub expunged: Option<usize>,
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Mode the run used.
    pub mode: OperationMode,
    /// Mailbox names in server order; filled in `list` mode only.
    pub listed: Vec<String>,
    /// One entry per processed mailbox, in processing order.
    pub mailboxes: Vec<MailboxOutcome>,
}

impl RunReport {
    const fn new(mode: OperationMode) -> Self {
        Self {
            mode,
            listed: Vec::new(),
            mailboxes: Vec::new(),
        }
    }

    /// Messages removed across all mailboxes.
    #[must_use]
    pub fn total_expunged(&self) -> usize {
        self.mailboxes.iter().filter_map(|m| m.expunged).sum()
    }

    /// Messages flagged or unflagged across all mailboxes.
    #[must_use]
    pub fn total_mutated(&self) -> usize {
        self.mailboxes.iter().map(|m| m.mutated).sum()
    }
}

/// Connects, runs `config` against the server and logs out.
///
/// # Errors
///
/// The first failure of any step; see [`crate::Error`].
pub async fn run(config: &RunConfig) -> Result<RunReport> {
    let session = Session::open(&config.host, config.port, &config.user, &config.password).await?;
    run_session(session, config).await
}

/// Runs `config` over an already authenticated session, then closes it.
///
/// A panic inside the run still logs the session out before it resumes.
///
/// # Errors
///
/// The first failure of any step; see [`crate::Error`].
pub async fn run_session<M: MailSession>(
    mut session: Session<M>,
    config: &RunConfig,
) -> Result<RunReport> {
    let outcome = AssertUnwindSafe(drive(&mut session, config))
        .catch_unwind()
        .await;
    session.close().await;
    match outcome {
        Ok(result) => result,
        Err(payload) => panic::resume_unwind(payload),
    }
}

async fn drive<M: MailSession>(session: &mut Session<M>, config: &RunConfig) -> Result<RunReport> {
    let mut report = RunReport::new(config.mode);
    let mailboxes = enumerator::list_mailboxes(session).await?;

    if !config.mode.selects() {
        report.listed = mailboxes.map(|m| m.name().to_string()).collect();
        return Ok(report);
    }

    for mailbox in enumerator::filter(mailboxes, &config.mailboxes) {
        if !mailbox.is_selectable() {
            if config.mailboxes.iter().any(|name| name == mailbox.name()) {
                warn!(mailbox = mailbox.name(), "requested mailbox is not selectable, skipped");
            } else {
                debug!(mailbox = mailbox.name(), "not selectable, skipped");
            }
            continue;
        }
        let outcome = process(session, &mailbox, config).await?;
        report.mailboxes.push(outcome);
    }

    info!(
        mode = %config.mode,
        mailboxes = report.mailboxes.len(),
        mutated = report.total_mutated(),
        expunged = report.total_expunged(),
        "run complete"
    );
    Ok(report)
}

async fn process<M: MailSession>(
    session: &mut Session<M>,
    mailbox: &MailboxDescriptor,
    config: &RunConfig,
) -> Result<MailboxOutcome> {
    info!(mailbox = mailbox.name(), "processing");
    selector::select(session, mailbox.name()).await?;

    let mut outcome = MailboxOutcome {
        name: mailbox.name().to_string(),
        ..MailboxOutcome::default()
    };

    if let Some(direction) = config.mode.direction() {
        // Without a window there is no set to act on; the STORE is skipped
        // but an expunge step below still runs.
        if let Some(ids) = selector::search(session, &config.criteria).await? {
            outcome.matched = Some(ids.len());
            outcome.mutated = mutator::mutate(session, &ids, direction).await?;
        }
    }

    if config.mode.expunges() {
        outcome.expunged = Some(expunge::expunge(session).await?);
    }

    Ok(outcome)
}
