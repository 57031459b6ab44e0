//! Service account management
//!
//! The service runs under a dedicated system account with no home directory
//! and no login shell.

use anyhow::{Context, Result};

use crate::cmd::{CommandError, Host, HostCommand};
use crate::paths;

/// useradd exit status for "username already in use"
pub const USERADD_USER_EXISTS: i32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountOutcome {
    Created,
    AlreadyExists,
}

pub fn create_system_account(host: &dyn Host, name: &str) -> Result<AccountOutcome> {
    let cmd = HostCommand::new(
        "useradd",
        [
            "--system",
            "--user-group",
            "--no-create-home",
            "--shell",
            paths::NOLOGIN_SHELL,
            name,
        ],
    );

    match host.run(&cmd) {
        Ok(()) => Ok(AccountOutcome::Created),
        Err(e) if e.exit_code() == Some(USERADD_USER_EXISTS) => {
            println!("  Account {} already exists, keeping it", name);
            Ok(AccountOutcome::AlreadyExists)
        }
        Err(e) => Err(e).with_context(|| format!("Failed to create system account {}", name)),
    }
}

pub fn delete_account(host: &dyn Host, name: &str) -> Result<()> {
    host.run(&HostCommand::new("userdel", [name]))
        .with_context(|| format!("Failed to delete account {}", name))
}

pub fn account_exists(host: &dyn Host, name: &str) -> Result<bool> {
    match host.output(&HostCommand::new("id", ["-u", name])) {
        Ok(_) => Ok(true),
        Err(CommandError::Failed { .. }) => Ok(false),
        Err(e) => Err(e).context("Failed to look up account"),
    }
}
