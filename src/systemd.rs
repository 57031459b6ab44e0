//! systemctl invocations

use anyhow::{Context, Result};

use crate::cmd::{CommandError, Host, HostCommand};

pub struct Systemd<'a> {
    host: &'a dyn Host,
}

impl<'a> Systemd<'a> {
    pub fn new(host: &'a dyn Host) -> Self {
        Self { host }
    }

    fn systemctl(&self, args: &[&str]) -> Result<()> {
        self.host
            .run(&HostCommand::new("systemctl", args))
            .with_context(|| format!("systemctl {} failed", args.join(" ")))
    }

    /// Whether the unit appears in the full unit list
    pub fn is_registered(&self, unit: &str) -> Result<bool> {
        let listing = self
            .host
            .output(&HostCommand::new(
                "systemctl",
                ["list-units", "--full", "--all", "--no-legend", "--no-pager"],
            ))
            .context("Failed to list systemd units")?;

        let found = parse_unit_names(&listing).any(|name| name == unit);
        Ok(found)
    }

    /// `systemctl is-active` exits non-zero for anything but "active" and
    /// still prints the state, e.g. "failed" or "activating".
    pub fn active_state(&self, unit: &str) -> Result<String> {
        match self
            .host
            .output(&HostCommand::new("systemctl", ["is-active", unit]))
        {
            Ok(state) => Ok(state),
            Err(CommandError::Failed { stdout, .. }) if !stdout.trim().is_empty() => {
                Ok(stdout.trim().to_string())
            }
            Err(CommandError::Failed { .. }) => Ok("inactive".into()),
            Err(e) => Err(e).context("Failed to query unit state"),
        }
    }

    pub fn daemon_reload(&self) -> Result<()> {
        self.systemctl(&["daemon-reload"])
    }

    pub fn enable(&self, unit: &str) -> Result<()> {
        self.systemctl(&["enable", unit])
    }

    pub fn disable(&self, unit: &str) -> Result<()> {
        self.systemctl(&["disable", unit])
    }

    pub fn start(&self, unit: &str) -> Result<()> {
        self.systemctl(&["start", unit])
    }

    pub fn stop(&self, unit: &str) -> Result<()> {
        self.systemctl(&["stop", unit])
    }

    pub fn restart(&self, unit: &str) -> Result<()> {
        self.systemctl(&["restart", unit])
    }

    pub fn reset_failed(&self) -> Result<()> {
        self.systemctl(&["reset-failed"])
    }
}

/// Unit names from `systemctl list-units --no-legend` output.
/// Failed units are prefixed with a status glyph which is skipped.
fn parse_unit_names(listing: &str) -> impl Iterator<Item = &str> {
    listing.lines().filter_map(|line| {
        line.split_whitespace()
            .find(|field| !matches!(*field, "●" | "*" | "×"))
    })
}
