//! Host paths derived from the deployment settings.
//!
//! Every path is resolved beneath a root directory: `/` on a real host, a
//! scratch directory in tests.

use std::path::{Path, PathBuf};

use crate::paths;
use crate::settings::DeploySettings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub service: String,
    pub unit_name: String,
    pub base_dir: PathBuf,
    pub venv_dir: PathBuf,
    pub app_dir: PathBuf,
    pub requirements: PathBuf,
    pub unit_dir: PathBuf,
    pub unit_path: PathBuf,
    pub config_path: PathBuf,
}

impl Layout {
    pub fn resolve(settings: &DeploySettings, root: &Path) -> Self {
        let base_dir = under_root(root, &settings.base_dir());
        let unit_dir = under_root(root, &settings.unit_dir);
        let unit_name = settings.unit_name();

        Self {
            service: settings.service.clone(),
            venv_dir: base_dir.join(paths::VENV_DIR),
            app_dir: base_dir.join(paths::APP_DIR),
            requirements: base_dir.join(&settings.requirements),
            unit_path: unit_dir.join(&unit_name),
            config_path: under_root(root, &settings.config_path()),
            unit_name,
            unit_dir,
            base_dir,
        }
    }

    /// `user:group` handed to chown
    pub fn owner(&self) -> String {
        format!("{0}:{0}", self.service)
    }

    pub fn pip(&self) -> PathBuf {
        self.venv_dir.join("bin/pip")
    }

    pub fn venv_python(&self) -> PathBuf {
        self.venv_dir.join("bin/python")
    }
}

fn under_root(root: &Path, path: &Path) -> PathBuf {
    root.join(path.strip_prefix("/").unwrap_or(path))
}

/// Files read from the source tree being deployed
#[derive(Debug, Clone)]
pub struct SourceTree {
    pub dir: PathBuf,
    pub unit_file: PathBuf,
    pub config_template: PathBuf,
    pub requirements: PathBuf,
    extensions: Vec<String>,
}

impl SourceTree {
    pub fn new(dir: impl Into<PathBuf>, settings: &DeploySettings) -> Self {
        let dir = dir.into();
        Self {
            unit_file: dir.join(settings.unit_name()),
            config_template: dir.join(settings.config_template()),
            requirements: dir.join(&settings.requirements),
            extensions: settings.app_extensions.clone(),
            dir,
        }
    }

    pub fn has_requirements(&self) -> bool {
        self.requirements.is_file()
    }

    /// Top-level application files, sorted by name
    pub fn app_files(&self) -> std::io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let matches = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|ext| self.extensions.iter().any(|want| want == ext))
                .unwrap_or(false);
            if matches {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}
