use anyhow::Result;
use std::fmt;

use super::Deployer;
use crate::account;

/// Read-only snapshot of what is installed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub unit: String,
    pub registered: bool,
    pub active_state: Option<String>,
    pub account: bool,
    pub base_dir: bool,
    pub venv: bool,
    pub config: bool,
}

impl Status {
    /// Every piece install creates is present
    pub fn is_complete(&self) -> bool {
        self.registered && self.account && self.base_dir && self.venv && self.config
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let yes_no = |b: bool| if b { "yes" } else { "no" };
        writeln!(f, "  Unit:        {}", self.unit)?;
        writeln!(f, "  Registered:  {}", yes_no(self.registered))?;
        if let Some(state) = &self.active_state {
            writeln!(f, "  State:       {}", state)?;
        }
        writeln!(f, "  Account:     {}", yes_no(self.account))?;
        writeln!(f, "  Install dir: {}", yes_no(self.base_dir))?;
        writeln!(f, "  Venv:        {}", yes_no(self.venv))?;
        write!(f, "  Config:      {}", yes_no(self.config))
    }
}

impl Deployer<'_> {
    pub fn status(&self) -> Result<Status> {
        let layout = &self.layout;
        let systemd = self.systemd();

        let registered = systemd.is_registered(&layout.unit_name)?;
        let active_state = if registered {
            Some(systemd.active_state(&layout.unit_name)?)
        } else {
            None
        };

        Ok(Status {
            unit: layout.unit_name.clone(),
            registered,
            active_state,
            account: account::account_exists(self.host, &layout.service)?,
            base_dir: layout.base_dir.is_dir(),
            venv: layout.venv_python().is_file(),
            config: layout.config_path.is_file(),
        })
    }
}
