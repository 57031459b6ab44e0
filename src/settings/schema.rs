use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::paths;

/// Deployment settings. Every field is optional in the file; unset path
/// fields are derived from `service` when the layout is resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploySettings {
    /// Name used for the account, unit and install paths
    #[serde(default = "default_service")]
    pub service: String,

    /// Installation base directory (default: /opt/<service>)
    #[serde(default)]
    pub base_dir: Option<PathBuf>,

    /// Directory receiving the unit file
    #[serde(default = "default_unit_dir")]
    pub unit_dir: PathBuf,

    /// Destination of the configuration file (default: /etc/<service>.ini)
    #[serde(default)]
    pub config_path: Option<PathBuf>,

    /// Template name in the source tree (default: <service>.ini.example)
    #[serde(default)]
    pub config_template: Option<String>,

    /// Dependency manifest name in the source tree
    #[serde(default = "default_requirements")]
    pub requirements: String,

    /// Interpreter used to create the virtual environment
    #[serde(default = "default_python")]
    pub python: String,

    /// Extensions of top-level source files copied as application files
    #[serde(default = "default_app_extensions")]
    pub app_extensions: Vec<String>,
}

fn default_service() -> String {
    paths::SERVICE_NAME.into()
}

fn default_unit_dir() -> PathBuf {
    PathBuf::from(paths::UNIT_DIR)
}

fn default_requirements() -> String {
    paths::REQUIREMENTS_FILE.into()
}

fn default_python() -> String {
    "python3".into()
}

fn default_app_extensions() -> Vec<String> {
    vec!["py".into()]
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            service: default_service(),
            base_dir: None,
            unit_dir: default_unit_dir(),
            config_path: None,
            config_template: None,
            requirements: default_requirements(),
            python: default_python(),
            app_extensions: default_app_extensions(),
        }
    }
}

impl DeploySettings {
    pub fn unit_name(&self) -> String {
        format!("{}.service", self.service)
    }

    pub fn base_dir(&self) -> PathBuf {
        self.base_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(paths::INSTALL_PREFIX).join(&self.service))
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_path.clone().unwrap_or_else(|| {
            PathBuf::from(paths::CONFIG_PREFIX).join(format!("{}.ini", self.service))
        })
    }

    pub fn config_template(&self) -> String {
        self.config_template
            .clone()
            .unwrap_or_else(|| format!("{}.ini.example", self.service))
    }
}
