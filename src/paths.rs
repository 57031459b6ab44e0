/// Service name every other path and identity is derived from
pub const SERVICE_NAME: &str = "bratwurstpower";

/// Parent directory of the installation base directory
pub const INSTALL_PREFIX: &str = "/opt";

/// Directory holding the service's configuration file
pub const CONFIG_PREFIX: &str = "/etc";

/// systemd directory for administrator-installed units
pub const UNIT_DIR: &str = "/etc/systemd/system";

/// Subdirectory of the base directory holding the virtual environment
pub const VENV_DIR: &str = "venv";

/// Subdirectory of the base directory holding the application files
pub const APP_DIR: &str = "app";

/// Dependency manifest file name, both in the source tree and the base directory
pub const REQUIREMENTS_FILE: &str = "requirements.txt";

/// Login shell given to the service account
pub const NOLOGIN_SHELL: &str = "/usr/sbin/nologin";
