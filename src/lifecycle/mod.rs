//! Install, update and uninstall sequences.
//!
//! Each sequence is a fixed list of `Step`s run in order. The first failing
//! step aborts the sequence; its error carries a `StepFailure` naming the
//! step and the steps that had already been applied, since nothing is rolled
//! back.

mod install;
mod status;
mod uninstall;
mod update;

pub use status::Status;
pub use update::UpdateOutcome;

use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::fmt;
use std::path::Path;

use crate::cmd::{Host, HostCommand};
use crate::layout::{Layout, SourceTree};
use crate::settings::DeploySettings;
use crate::systemd::Systemd;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    CreateAccount,
    CreateDirectories,
    CreateEnvironment,
    InstallDependencies,
    CopyApplication,
    PlaceConfig,
    InstallUnit,
    StartUnit,
    RestartUnit,
    StopUnit,
    RemoveUnit,
    RemoveFiles,
    RemoveAccount,
    RemoveConfig,
}

impl Step {
    pub fn description(&self) -> &'static str {
        match self {
            Step::CreateAccount => "Creating service account",
            Step::CreateDirectories => "Creating install directories",
            Step::CreateEnvironment => "Creating Python virtual environment",
            Step::InstallDependencies => "Installing Python dependencies",
            Step::CopyApplication => "Copying application files",
            Step::PlaceConfig => "Placing configuration file",
            Step::InstallUnit => "Installing systemd unit",
            Step::StartUnit => "Enabling and starting service",
            Step::RestartUnit => "Restarting service",
            Step::StopUnit => "Stopping and disabling service",
            Step::RemoveUnit => "Removing systemd unit",
            Step::RemoveFiles => "Removing install directory",
            Step::RemoveAccount => "Removing service account",
            Step::RemoveConfig => "Removing configuration file",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Context attached to the error of a failed step
#[derive(Debug, Clone, thiserror::Error)]
#[error("step failed: {step}")]
pub struct StepFailure {
    pub step: Step,
    /// Steps already applied to the host before the failure
    pub completed: Vec<Step>,
}

/// Prints numbered step banners and records progress
struct Sequence {
    total: usize,
    completed: Vec<Step>,
}

impl Sequence {
    fn new(title: &str, total: usize) -> Self {
        println!("\n=== {} ===", title);
        Self {
            total,
            completed: Vec::new(),
        }
    }

    fn step<T>(&mut self, step: Step, f: impl FnOnce() -> Result<T>) -> Result<T> {
        println!("\n[{}/{}] {}...", self.completed.len() + 1, self.total, step);
        tracing::debug!(?step, "starting step");

        match f() {
            Ok(value) => {
                self.completed.push(step);
                Ok(value)
            }
            Err(e) => Err(e.context(StepFailure {
                step,
                completed: self.completed.clone(),
            })),
        }
    }
}

/// Runs lifecycle sequences against a host
pub struct Deployer<'a> {
    host: &'a dyn Host,
    layout: Layout,
    source: SourceTree,
    python: String,
}

impl<'a> Deployer<'a> {
    /// `root` is `/` on a real host; every layout path is resolved beneath it
    pub fn new(host: &'a dyn Host, settings: &DeploySettings, source_dir: &Path, root: &Path) -> Self {
        Self {
            host,
            layout: Layout::resolve(settings, root),
            source: SourceTree::new(source_dir, settings),
            python: settings.python.clone(),
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    fn systemd(&self) -> Systemd<'a> {
        Systemd::new(self.host)
    }

    fn chown_recursive(&self, path: &Path) -> Result<()> {
        let owner = self.layout.owner();
        self.host
            .run(&HostCommand::new(
                "chown",
                [OsStr::new("-R"), OsStr::new(&owner), path.as_os_str()],
            ))
            .with_context(|| format!("Failed to chown {}", path.display()))
    }

    /// Copy the unit file into the unit directory with fixed permissions and
    /// reload systemd's unit cache
    fn install_unit_file(&self) -> Result<()> {
        if !self.source.unit_file.is_file() {
            anyhow::bail!(
                "Unit file not found in source tree: {}",
                self.source.unit_file.display()
            );
        }
        self.host.create_dir_all(&self.layout.unit_dir)?;
        self.host
            .copy_file(&self.source.unit_file, &self.layout.unit_path, Some(0o644))?;
        self.systemd().daemon_reload()
    }

    fn copy_application(&self) -> Result<()> {
        let files = self.source.app_files().with_context(|| {
            format!("Failed to read source tree {}", self.source.dir.display())
        })?;
        if files.is_empty() {
            anyhow::bail!(
                "No application files found in {}",
                self.source.dir.display()
            );
        }

        for file in &files {
            let name = file
                .file_name()
                .with_context(|| format!("Invalid file name: {}", file.display()))?;
            self.host.copy_file(file, &self.layout.app_dir.join(name), None)?;
        }
        println!("  Copied {} file(s) to {}", files.len(), self.layout.app_dir.display());

        self.chown_recursive(&self.layout.app_dir)
    }

    /// Copy the dependency manifest next to the venv and pip install it.
    /// Returns false when the source tree has no manifest.
    fn install_dependencies(&self, upgrade: bool) -> Result<bool> {
        if !self.source.has_requirements() {
            println!(
                "  No {} in source tree, skipping",
                self.source.requirements.display()
            );
            return Ok(false);
        }

        self.host
            .copy_file(&self.source.requirements, &self.layout.requirements, None)?;
        self.chown_recursive(&self.layout.requirements)?;
        crate::venv::install_requirements(
            self.host,
            &self.layout,
            &self.layout.requirements,
            upgrade,
        )?;
        Ok(true)
    }
}
