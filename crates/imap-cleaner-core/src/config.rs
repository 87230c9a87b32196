//! Run configuration.

use imap_cleaner_imap::DEFAULT_TLS_PORT;

use crate::criteria::SelectionCriteria;
use crate::mutator::FlagDirection;

/// What a run does to each mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationMode {
    /// Print mailbox names; touch nothing.
    List,
    /// Mark matching messages `\Deleted`.
    Delete,
    /// Clear `\Deleted` on matching messages.
    Restore,
    /// Expunge every `\Deleted` message.
    Expunge,
    /// `Delete` followed by `Expunge` in one pass.
    Cleanup,
}

impl OperationMode {
    /// Lower-case name as used on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Delete => "delete",
            Self::Restore => "restore",
            Self::Expunge => "expunge",
            Self::Cleanup => "cleanup",
        }
    }

    /// True for every mode that opens mailboxes.
    #[must_use]
    pub const fn selects(self) -> bool {
        !matches!(self, Self::List)
    }

    /// The flag change applied to matched messages, if any. Modes with a
    /// direction also run SEARCH when the window is bounded.
    #[must_use]
    pub const fn direction(self) -> Option<FlagDirection> {
        match self {
            Self::Delete | Self::Cleanup => Some(FlagDirection::AddDeleted),
            Self::Restore => Some(FlagDirection::RemoveDeleted),
            Self::List | Self::Expunge => None,
        }
    }

    /// True if the mode ends each mailbox with EXPUNGE.
    #[must_use]
    pub const fn expunges(self) -> bool {
        matches!(self, Self::Expunge | Self::Cleanup)
    }
}

impl std::fmt::Display for OperationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything one invocation needs, built once and handed to
/// [`crate::run`].
#[derive(Clone)]
pub struct RunConfig {
    /// Server host, also used as the TLS server name.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Login name.
    pub user: String,
    /// Login password.
    pub password: String,
    /// Mailboxes to work on; empty means all of them.
    pub mailboxes: Vec<String>,
    /// Date window for delete, restore and cleanup.
    pub criteria: SelectionCriteria,
    /// What to do.
    pub mode: OperationMode,
}

impl RunConfig {
    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(host: impl Into<String>, user: impl Into<String>) -> RunConfigBuilder {
        RunConfigBuilder::new(host, user)
    }
}

impl std::fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("mailboxes", &self.mailboxes)
            .field("criteria", &self.criteria)
            .field("mode", &self.mode)
            .finish()
    }
}

/// Builder for [`RunConfig`].
#[derive(Debug, Clone)]
pub struct RunConfigBuilder {
    host: String,
    port: u16,
    user: String,
    password: String,
    mailboxes: Vec<String>,
    criteria: SelectionCriteria,
    mode: OperationMode,
}

impl RunConfigBuilder {
    /// Creates a builder for a `list` run on the implicit-TLS port.
    #[must_use]
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_TLS_PORT,
            user: user.into(),
            password: String::new(),
            mailboxes: Vec::new(),
            criteria: SelectionCriteria::unbounded(),
            mode: OperationMode::List,
        }
    }

    /// Sets the port. 0 means the default.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Restricts the run to the named mailboxes.
    #[must_use]
    pub fn mailboxes<I, T>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.mailboxes = names.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the date window.
    #[must_use]
    pub const fn criteria(mut self, criteria: SelectionCriteria) -> Self {
        self.criteria = criteria;
        self
    }

    /// Sets the mode.
    #[must_use]
    pub const fn mode(mut self, mode: OperationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> RunConfig {
        RunConfig {
            host: self.host,
            port: if self.port == 0 {
                DEFAULT_TLS_PORT
            } else {
                self.port
            },
            user: self.user,
            password: self.password,
            mailboxes: self.mailboxes,
            criteria: self.criteria,
            mode: self.mode,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let config = RunConfig::builder("imap.example.com", "alice").build();
        assert_eq!(config.host, "imap.example.com");
        assert_eq!(config.port, 993);
        assert_eq!(config.user, "alice");
        assert!(config.mailboxes.is_empty());
        assert_eq!(config.mode, OperationMode::List);
        assert!(!config.criteria.is_bounded());
    }

    #[test]
    fn port_zero_means_default() {
        let config = RunConfig::builder("h", "u").port(0).build();
        assert_eq!(config.port, 993);

        let config = RunConfig::builder("h", "u").port(1993).build();
        assert_eq!(config.port, 1993);
    }

    #[test]
    fn debug_redacts_password() {
        let config = RunConfig::builder("h", "u").password("hunter2").build();
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn mode_step_table() {
        use FlagDirection::{AddDeleted, RemoveDeleted};

        let table = [
            (OperationMode::List, false, None, false),
            (OperationMode::Delete, true, Some(AddDeleted), false),
            (OperationMode::Restore, true, Some(RemoveDeleted), false),
            (OperationMode::Expunge, true, None, true),
            (OperationMode::Cleanup, true, Some(AddDeleted), true),
        ];
        for (mode, selects, direction, expunges) in table {
            assert_eq!(mode.selects(), selects, "{mode}");
            assert_eq!(mode.direction(), direction, "{mode}");
            assert_eq!(mode.expunges(), expunges, "{mode}");
        }
    }
}
