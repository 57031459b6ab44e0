use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::path::Path;

use crate::cmd::{Host, HostCommand};
use crate::layout::Layout;

/// Create the virtual environment as the service user
pub fn create(host: &dyn Host, layout: &Layout, python: &str) -> Result<()> {
    let cmd = HostCommand::as_user(
        &layout.service,
        python,
        [OsStr::new("-m"), OsStr::new("venv"), layout.venv_dir.as_os_str()],
    );
    host.run(&cmd)
        .with_context(|| format!("Failed to create venv at {}", layout.venv_dir.display()))
}

/// pip install -r <requirements> into the environment
pub fn install_requirements(
    host: &dyn Host,
    layout: &Layout,
    requirements: &Path,
    upgrade: bool,
) -> Result<()> {
    let pip = layout.pip();
    let pip = pip.to_string_lossy();
    let requirements = requirements.to_string_lossy();

    let mut args = vec!["install"];
    if upgrade {
        args.push("--upgrade");
    }
    args.push("-r");
    args.push(&requirements);

    host.run(&HostCommand::as_user(&layout.service, &pip, args))
        .context("Failed to install Python dependencies")
}
