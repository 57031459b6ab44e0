use anyhow::{bail, Result};

use crate::cli::Mode;

/// External programs each mode shells out to
pub fn required_programs(mode: Mode, python: &str) -> Vec<&str> {
    match mode {
        Mode::Install => vec!["useradd", "chown", "sudo", "systemctl", python],
        Mode::Update => vec!["chown", "sudo", "systemctl"],
        Mode::Uninstall => vec!["systemctl", "userdel"],
        Mode::Status => vec!["systemctl", "id"],
    }
}

/// Fail before touching the host if a collaborator is not installed
pub fn check_programs(mode: Mode, python: &str) -> Result<()> {
    let missing: Vec<&str> = required_programs(mode, python)
        .into_iter()
        .filter(|program| which::which(program).is_err())
        .collect();

    if !missing.is_empty() {
        bail!("Required programs not found in PATH: {}", missing.join(", "));
    }
    Ok(())
}

pub fn is_root() -> bool {
    nix::unistd::Uid::effective().is_root()
}
