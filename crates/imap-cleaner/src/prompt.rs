//! Interactive password entry.

use anyhow::{Context, Result};

/// Asks for the password on the terminal without echoing it.
///
/// `rpassword` switches echo off for the read and restores the previous
/// terminal mode on every return path.
pub fn read_password() -> Result<String> {
    rpassword::prompt_password("Enter Password: ").context("failed to read password from the tty")
}
