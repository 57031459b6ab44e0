//! Command-line parsing

use anyhow::{bail, Result};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Install,
    Update,
    Uninstall,
    Status,
}

impl Mode {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "install" => Some(Mode::Install),
            "update" => Some(Mode::Update),
            "uninstall" => Some(Mode::Uninstall),
            "status" => Some(Mode::Status),
            _ => None,
        }
    }

    /// Modes that change the host
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Mode::Status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub mode: Mode,
    pub source: PathBuf,
    pub settings: Option<String>,
    pub dry_run: bool,
    pub assume_yes: bool,
}

/// Parse arguments (without the program name)
pub fn parse(args: &[String]) -> Result<Invocation> {
    let mut mode = None;
    let mut source = None;
    let mut settings = None;
    let mut dry_run = false;
    let mut assume_yes = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--dry-run" | "-n" => dry_run = true,
            "--yes" | "-y" => assume_yes = true,
            "--source" => match iter.next() {
                Some(dir) => source = Some(PathBuf::from(dir)),
                None => bail!("--source requires a directory"),
            },
            "--settings" => match iter.next() {
                Some(file) => settings = Some(file.clone()),
                None => bail!("--settings requires a file"),
            },
            other if other.starts_with('-') => bail!("Unknown option: {}", other),
            other => {
                if mode.is_some() {
                    bail!("Unexpected argument: {}", other);
                }
                match Mode::from_arg(other) {
                    Some(m) => mode = Some(m),
                    None => bail!("Unknown command: {}", other),
                }
            }
        }
    }

    let Some(mode) = mode else {
        bail!("No command given");
    };

    Ok(Invocation {
        mode,
        source: source.unwrap_or_else(|| PathBuf::from(".")),
        settings,
        dry_run,
        assume_yes,
    })
}

pub fn usage() -> &'static str {
    r#"bratwurstpower-deploy - Manage the bratwurstpower systemd service

Usage:
    bratwurstpower-deploy [OPTIONS] <install|update|uninstall|status>

Commands:
    install      Create account, venv and files; install and start the unit
    update       Refresh unit, files and dependencies; restart the unit
    uninstall    Stop the service and remove everything install created
    status       Show what is currently installed

Options:
    --source <dir>       Source tree to deploy from (default: .)
    --settings <file>    Deployment settings (YAML, JSON or TOML)
    -n, --dry-run        Print actions without executing them
    -y, --yes            Overwrite an existing config on update without asking
"#
}
