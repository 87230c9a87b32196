//! Command-line surface.

use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};
use imap_cleaner_core::{OperationMode, RunConfig, SelectionCriteria};

/// Timestamp layout accepted by `--from` and `--to`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Cleanup and expunge IMAP folders.
#[derive(Debug, Parser)]
#[command(name = "imap-cleaner", version, about)]
pub struct Cli {
    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Delete and expunge messages
    Cleanup(DeleteArgs),
    /// Delete messages
    Delete(DeleteArgs),
    /// Restore deleted messages (not yet expunged)
    Restore(DeleteArgs),
    /// Expunge deleted messages
    Expunge(GlobalArgs),
    /// List available mailboxes
    List(GlobalArgs),
}

/// Flags every subcommand takes.
#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Verbose mode
    #[arg(short, long)]
    pub verbose: bool,

    /// IMAP server host or ip
    #[arg(long)]
    pub host: String,

    /// IMAP server port
    #[arg(long, default_value_t = 993)]
    pub port: u16,

    /// IMAP username
    #[arg(short, long)]
    pub user: String,

    /// IMAP password, if password is not given it's asked from the tty
    #[arg(short, long)]
    pub pass: Option<String>,

    /// Specify a mailbox (defaults to all account mailboxes); repeatable
    #[arg(long)]
    pub mailbox: Vec<String>,
}

/// Flags for the subcommands that pick messages by date.
#[derive(Debug, Clone, Args)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Act on messages starting from this date, "YYYY-MM-DD HH:MM:SS"
    #[arg(long, value_parser = parse_timestamp)]
    pub from: Option<NaiveDateTime>,

    /// Act on messages up to (not including) this date, "YYYY-MM-DD HH:MM:SS"
    #[arg(long, value_parser = parse_timestamp)]
    pub to: Option<NaiveDateTime>,
}

impl DeleteArgs {
    fn criteria(&self) -> SelectionCriteria {
        SelectionCriteria::new(self.from, self.to)
    }
}

impl Command {
    /// Mode the subcommand runs in.
    #[must_use]
    pub const fn mode(&self) -> OperationMode {
        match self {
            Self::Cleanup(_) => OperationMode::Cleanup,
            Self::Delete(_) => OperationMode::Delete,
            Self::Restore(_) => OperationMode::Restore,
            Self::Expunge(_) => OperationMode::Expunge,
            Self::List(_) => OperationMode::List,
        }
    }

    /// The shared flags.
    #[must_use]
    pub const fn global(&self) -> &GlobalArgs {
        match self {
            Self::Cleanup(args) | Self::Delete(args) | Self::Restore(args) => &args.global,
            Self::Expunge(args) | Self::List(args) => args,
        }
    }

    /// Date window; unbounded for subcommands without `--from`/`--to`.
    #[must_use]
    pub fn criteria(&self) -> SelectionCriteria {
        match self {
            Self::Cleanup(args) | Self::Delete(args) | Self::Restore(args) => args.criteria(),
            Self::Expunge(_) | Self::List(_) => SelectionCriteria::unbounded(),
        }
    }

    /// Builds the run configuration with the resolved password.
    #[must_use]
    pub fn into_config(self, password: String) -> RunConfig {
        let mode = self.mode();
        let criteria = self.criteria();
        let global = match self {
            Self::Cleanup(args) | Self::Delete(args) | Self::Restore(args) => args.global,
            Self::Expunge(args) | Self::List(args) => args,
        };
        RunConfig::builder(global.host, global.user)
            .port(global.port)
            .password(password)
            .mailboxes(global.mailbox)
            .criteria(criteria)
            .mode(mode)
            .build()
    }
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .map_err(|e| format!("expected \"YYYY-MM-DD HH:MM:SS\": {e}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("imap-cleaner").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn delete_with_window_and_mailboxes() {
        let cli = parse(&[
            "delete",
            "--host",
            "imap.example.com",
            "-u",
            "alice",
            "-p",
            "secret",
            "--mailbox",
            "INBOX",
            "--mailbox",
            "Archive",
            "--from",
            "2020-01-01 00:00:00",
            "-v",
        ]);
        assert_eq!(cli.command.mode(), OperationMode::Delete);
        assert_eq!(cli.command.global().pass.as_deref(), Some("secret"));
        assert!(cli.command.global().verbose);

        let config = cli.command.into_config("secret".to_string());
        assert_eq!(config.host, "imap.example.com");
        assert_eq!(config.port, 993);
        assert_eq!(config.user, "alice");
        assert_eq!(config.mailboxes, ["INBOX", "Archive"]);
        assert_eq!(
            config.criteria.from(),
            Some(NaiveDateTime::parse_from_str("2020-01-01 00:00:00", TIMESTAMP_FORMAT).unwrap())
        );
        assert_eq!(config.criteria.to(), None);
    }

    #[test]
    fn port_zero_falls_back_to_default() {
        let cli = parse(&["list", "--host", "h", "--user", "u", "--port", "0"]);
        assert_eq!(cli.command.into_config(String::new()).port, 993);
    }

    #[test]
    fn custom_port() {
        let cli = parse(&["expunge", "--host", "h", "-u", "u", "--port", "1993"]);
        let config = cli.command.into_config(String::new());
        assert_eq!(config.port, 1993);
        assert_eq!(config.mode, OperationMode::Expunge);
        assert!(!config.criteria.is_bounded());
    }

    #[test]
    fn password_is_optional() {
        let cli = parse(&["restore", "--host", "h", "-u", "u"]);
        assert!(cli.command.global().pass.is_none());
    }

    #[test]
    fn host_and_user_are_required() {
        assert!(Cli::try_parse_from(["imap-cleaner", "list", "-u", "u"]).is_err());
        assert!(Cli::try_parse_from(["imap-cleaner", "list", "--host", "h"]).is_err());
    }

    #[test]
    fn list_and_expunge_take_no_window() {
        let err = Cli::try_parse_from([
            "imap-cleaner",
            "expunge",
            "--host",
            "h",
            "-u",
            "u",
            "--from",
            "2020-01-01 00:00:00",
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn bad_timestamp_is_rejected() {
        let err = Cli::try_parse_from([
            "imap-cleaner",
            "cleanup",
            "--host",
            "h",
            "-u",
            "u",
            "--to",
            "2020-01-01",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn cleanup_maps_both_bounds() {
        let cli = parse(&[
            "cleanup",
            "--host",
            "h",
            "-u",
            "u",
            "--from",
            "2020-01-01 00:00:00",
            "--to",
            "2021-01-01 12:30:00",
        ]);
        let criteria = cli.command.criteria();
        assert!(criteria.from().is_some());
        assert!(criteria.to().is_some());
        assert_eq!(cli.command.mode(), OperationMode::Cleanup);
    }
}
