//! In-memory stand-ins for the host's user database and systemd, used by
//! the unit tests. Filesystem work goes to a scratch root on the real disk.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::cmd::{CommandError, Host, HostCommand};
use crate::layout::Layout;
use crate::lifecycle::Deployer;
use crate::settings::DeploySettings;

pub(crate) struct FakeHost {
    unit_dir: PathBuf,
    commands: RefCell<Vec<HostCommand>>,
    users: RefCell<BTreeSet<String>>,
    units: RefCell<BTreeMap<String, String>>,
    enabled: RefCell<BTreeSet<String>>,
    failures: RefCell<Vec<(String, i32)>>,
}

impl FakeHost {
    pub fn new(unit_dir: impl Into<PathBuf>) -> Self {
        Self {
            unit_dir: unit_dir.into(),
            commands: RefCell::default(),
            users: RefCell::default(),
            units: RefCell::default(),
            enabled: RefCell::default(),
            failures: RefCell::default(),
        }
    }

    /// Make any command whose rendering starts with `prefix` exit with `code`
    pub fn fail_when(&self, prefix: &str, code: i32) {
        self.failures.borrow_mut().push((prefix.to_string(), code));
    }

    pub fn add_user(&self, name: &str) {
        self.users.borrow_mut().insert(name.to_string());
    }

    pub fn has_user(&self, name: &str) -> bool {
        self.users.borrow().contains(name)
    }

    pub fn is_registered(&self, unit: &str) -> bool {
        self.units.borrow().contains_key(unit)
    }

    pub fn is_enabled(&self, unit: &str) -> bool {
        self.enabled.borrow().contains(unit)
    }

    pub fn unit_state(&self, unit: &str) -> Option<String> {
        self.units.borrow().get(unit).cloned()
    }

    /// Forces a loaded unit into `state`, as if the daemon had crashed
    pub fn set_unit_state(&self, unit: &str, state: &str) {
        self.units
            .borrow_mut()
            .insert(unit.to_string(), state.to_string());
    }

    /// Mutating commands run so far, rendered as command lines
    pub fn commands(&self) -> Vec<String> {
        self.commands.borrow().iter().map(|c| c.to_string()).collect()
    }

    pub fn clear_commands(&self) {
        self.commands.borrow_mut().clear();
    }

    fn failed(command: &HostCommand, code: i32) -> CommandError {
        Self::failed_with_output(command, code, "")
    }

    fn failed_with_output(command: &HostCommand, code: i32, stdout: &str) -> CommandError {
        CommandError::Failed {
            command: command.to_string(),
            code: Some(code),
            stdout: stdout.to_string(),
        }
    }

    fn unit_file_exists(&self, unit: &str) -> bool {
        self.unit_dir.join(unit).is_file()
    }

    fn systemctl(&self, command: &HostCommand) -> Result<(), CommandError> {
        let args: Vec<&str> = command.args.iter().map(|s| s.as_str()).collect();
        let mut units = self.units.borrow_mut();

        match args.as_slice() {
            ["daemon-reload"] => {
                units.retain(|unit, _| self.unit_file_exists(unit));
            }
            ["reset-failed"] => {}
            ["enable", unit] => {
                if !self.unit_file_exists(unit) {
                    return Err(Self::failed(command, 1));
                }
                self.enabled.borrow_mut().insert(unit.to_string());
                units
                    .entry(unit.to_string())
                    .or_insert_with(|| "inactive".into());
            }
            ["disable", unit] => {
                self.enabled.borrow_mut().remove(*unit);
            }
            ["start", unit] | ["restart", unit] => {
                if !self.unit_file_exists(unit) {
                    return Err(Self::failed(command, 5));
                }
                units.insert(unit.to_string(), "active".into());
            }
            ["stop", unit] => match units.get_mut(*unit) {
                Some(state) => *state = "inactive".into(),
                None => return Err(Self::failed(command, 5)),
            },
            _ => return Err(Self::failed(command, 1)),
        }
        Ok(())
    }

    /// `sudo -u <user> <python> -m venv <dir>` leaves an interpreter behind
    fn simulate_sudo(&self, command: &HostCommand) {
        if let [_, _, _, m, venv, dir] = command.args.as_slice() {
            if m == "-m" && venv == "venv" {
                let bin = Path::new(dir).join("bin");
                let _ = fs::create_dir_all(&bin);
                let _ = fs::write(bin.join("python"), "");
            }
        }
    }
}

impl Host for FakeHost {
    fn run(&self, command: &HostCommand) -> Result<(), CommandError> {
        self.commands.borrow_mut().push(command.clone());

        let rendered = command.to_string();
        if let Some((_, code)) = self
            .failures
            .borrow()
            .iter()
            .find(|(prefix, _)| rendered.starts_with(prefix.as_str()))
        {
            return Err(Self::failed(command, *code));
        }

        let name = command.args.last().cloned().unwrap_or_default();
        match command.program.as_str() {
            "useradd" => {
                if !self.users.borrow_mut().insert(name) {
                    return Err(Self::failed(command, 9));
                }
            }
            "userdel" => {
                if !self.users.borrow_mut().remove(&name) {
                    return Err(Self::failed(command, 6));
                }
            }
            "systemctl" => self.systemctl(command)?,
            "sudo" => self.simulate_sudo(command),
            _ => {}
        }
        Ok(())
    }

    fn output(&self, command: &HostCommand) -> Result<String, CommandError> {
        let args: Vec<&str> = command.args.iter().map(|s| s.as_str()).collect();

        match (command.program.as_str(), args.as_slice()) {
            ("systemctl", ["list-units", ..]) => Ok(self
                .units
                .borrow()
                .iter()
                .map(|(unit, state)| format!("  {} loaded {} running fake unit", unit, state))
                .collect::<Vec<_>>()
                .join("\n")),
            ("systemctl", ["is-active", unit]) => match self.unit_state(unit).as_deref() {
                Some("active") => Ok("active".into()),
                Some(state) => Err(Self::failed_with_output(command, 3, state)),
                None => Err(Self::failed_with_output(command, 4, "inactive")),
            },
            ("id", ["-u", name]) if self.has_user(name) => Ok("999".into()),
            _ => Err(Self::failed(command, 1)),
        }
    }
}

/// A source tree and scratch host root wired to a `FakeHost`
pub(crate) struct Fixture {
    pub root: TempDir,
    pub source: TempDir,
    pub settings: DeploySettings,
    pub host: FakeHost,
}

impl Fixture {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let source = tempfile::tempdir().unwrap();
        let settings = DeploySettings::default();

        let files = [
            ("bratwurstpower.py", "import pca9557\n"),
            ("pca9557.py", "class PCA9557: ...\n"),
            ("README.md", "# Bratwurst Power\n"),
            ("requirements.txt", "smbus3\nina219\npaho-mqtt\n"),
            (
                "bratwurstpower.service",
                "[Unit]\nDescription=Bratwurst Power\n\n[Service]\nUser=bratwurstpower\n\
                 ExecStart=/opt/bratwurstpower/venv/bin/python /opt/bratwurstpower/app/bratwurstpower.py\n\n\
                 [Install]\nWantedBy=multi-user.target\n",
            ),
            (
                "bratwurstpower.ini.example",
                "[general]\nmeasurement_interval = 1\nloglevel = INFO\n\
                 runtime_directory = /run/bratwurstpower\n\n[mqtt]\nenabled = 0\n\
                 server = localhost\nport = 1883\nusername =\npassword =\n\
                 base_topic = bratwurstpower/\nhass_discovery_prefix = homeassistant/\n",
            ),
        ];
        for (name, content) in files {
            fs::write(source.path().join(name), content).unwrap();
        }

        let unit_dir = Layout::resolve(&settings, root.path()).unit_dir;
        Self {
            host: FakeHost::new(unit_dir),
            root,
            source,
            settings,
        }
    }

    /// A fixture that has already been through a successful install
    pub fn installed() -> Self {
        let fx = Self::new();
        fx.deployer().install().unwrap();
        fx.host.clear_commands();
        fx
    }

    pub fn layout(&self) -> Layout {
        Layout::resolve(&self.settings, self.root.path())
    }

    pub fn deployer(&self) -> Deployer<'_> {
        Deployer::new(&self.host, &self.settings, self.source.path(), self.root.path())
    }
}
