use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::Command;

const CYAN: &str = "\x1b[36m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// A single invocation of an external collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl HostCommand {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        Self {
            program: program.to_string(),
            args: args
                .into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned())
                .collect(),
        }
    }

    /// Run `program` as `user` through sudo
    pub fn as_user<I, S>(user: &str, program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Self::new("sudo", ["-u", user, program]);
        cmd.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        cmd
    }
}

impl fmt::Display for HostCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("failed to run {program}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` failed with exit code {code:?}")]
    Failed {
        command: String,
        code: Option<i32>,
        /// Whatever the command printed before failing; empty for `run`
        stdout: String,
    },
}

impl CommandError {
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            CommandError::Spawn { .. } => None,
            CommandError::Failed { code, .. } => *code,
        }
    }
}

/// Everything the lifecycle sequences do to the host goes through this trait.
///
/// Commands are always external programs. The filesystem helpers have default
/// implementations that touch the real filesystem; `DryRunHost` overrides them
/// to only print.
pub trait Host {
    /// Run a command to completion, failing on non-zero exit
    fn run(&self, command: &HostCommand) -> Result<(), CommandError>;

    /// Run a read-only query and return its trimmed stdout
    fn output(&self, command: &HostCommand) -> Result<String, CommandError>;

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create {}", path.display()))
    }

    /// Copy a file, optionally forcing its permission bits
    fn copy_file(&self, from: &Path, to: &Path, mode: Option<u32>) -> Result<()> {
        fs::copy(from, to).with_context(|| {
            format!("Failed to copy {} to {}", from.display(), to.display())
        })?;
        if let Some(mode) = mode {
            fs::set_permissions(to, fs::Permissions::from_mode(mode))
                .with_context(|| format!("Failed to set permissions on {}", to.display()))?;
        }
        Ok(())
    }

    /// Copy a file through a temporary sibling so `to` is never left truncated
    fn replace_file(&self, from: &Path, to: &Path) -> Result<()> {
        let dir = to
            .parent()
            .with_context(|| format!("{} has no parent directory", to.display()))?;
        let mut temp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
        let mut src = fs::File::open(from)
            .with_context(|| format!("Failed to open {}", from.display()))?;
        io::copy(&mut src, temp.as_file_mut())
            .with_context(|| format!("Failed to copy {}", from.display()))?;
        temp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))?;
        temp.persist(to)
            .with_context(|| format!("Failed to move config into {}", to.display()))?;
        Ok(())
    }

    /// Remove a file; a file that is already gone is not an error
    fn remove_file(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                Err(e).with_context(|| format!("Failed to remove {}", path.display()))
            }
            _ => Ok(()),
        }
    }

    /// Remove a directory tree; a directory that is already gone is not an error
    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        match fs::remove_dir_all(path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                Err(e).with_context(|| format!("Failed to remove {}", path.display()))
            }
            _ => Ok(()),
        }
    }
}

/// Executes everything for real
#[derive(Debug, Clone, Default)]
pub struct SystemHost;

impl Host for SystemHost {
    fn run(&self, command: &HostCommand) -> Result<(), CommandError> {
        println!("{}> {}{}", CYAN, command, RESET);

        let status = Command::new(&command.program)
            .args(&command.args)
            .status()
            .map_err(|source| CommandError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(CommandError::Failed {
                command: command.to_string(),
                code: status.code(),
                stdout: String::new(),
            });
        }

        Ok(())
    }

    fn output(&self, command: &HostCommand) -> Result<String, CommandError> {
        tracing::debug!("query: {}", command);

        let output = Command::new(&command.program)
            .args(&command.args)
            .output()
            .map_err(|source| CommandError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CommandError::Failed {
                command: command.to_string(),
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Prints every mutating action instead of performing it.
///
/// Queries still run so that registration checks reflect the real host.
#[derive(Debug, Clone, Default)]
pub struct DryRunHost {
    inner: SystemHost,
}

impl DryRunHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn announce(&self, action: fmt::Arguments<'_>) {
        println!("{}[dry-run] {}{}", YELLOW, action, RESET);
    }
}

impl Host for DryRunHost {
    fn run(&self, command: &HostCommand) -> Result<(), CommandError> {
        self.announce(format_args!("> {}", command));
        Ok(())
    }

    fn output(&self, command: &HostCommand) -> Result<String, CommandError> {
        self.inner.output(command)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.announce(format_args!("mkdir -p {}", path.display()));
        Ok(())
    }

    fn copy_file(&self, from: &Path, to: &Path, mode: Option<u32>) -> Result<()> {
        match mode {
            Some(mode) => self.announce(format_args!(
                "install -m {:o} {} {}",
                mode,
                from.display(),
                to.display()
            )),
            None => self.announce(format_args!("cp {} {}", from.display(), to.display())),
        }
        Ok(())
    }

    fn replace_file(&self, from: &Path, to: &Path) -> Result<()> {
        self.announce(format_args!("cp {} {}", from.display(), to.display()));
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.announce(format_args!("rm -f {}", path.display()));
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        self.announce(format_args!("rm -rf {}", path.display()));
        Ok(())
    }
}
