mod schema;

pub use schema::*;

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Where deployment settings come from
#[derive(Debug, Clone)]
pub enum SettingsSource {
    File(PathBuf),
    Defaults,
}

impl SettingsSource {
    /// Parse from the `--settings` option
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            None => Self::Defaults,
            Some(s) => Self::File(PathBuf::from(s)),
        }
    }
}

/// Load settings from any supported source
pub fn load(source: &SettingsSource) -> Result<DeploySettings> {
    let settings = match source {
        SettingsSource::File(path) => load_from_file(path)?,
        SettingsSource::Defaults => DeploySettings::default(),
    };
    validate(&settings)?;
    Ok(settings)
}

/// Load settings from a file (YAML, JSON or TOML)
fn load_from_file(path: &Path) -> Result<DeploySettings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings: {}", path.display()))?;

    match path.extension().and_then(|e| e.to_str()).unwrap_or("") {
        "yaml" | "yml" => parse_yaml(&content),
        "json" => parse_json(&content),
        "toml" => parse_toml(&content),
        _ => parse_auto(&content),
    }
}

fn parse_yaml(content: &str) -> Result<DeploySettings> {
    serde_yaml::from_str(content).context("Failed to parse YAML settings")
}

fn parse_json(content: &str) -> Result<DeploySettings> {
    serde_json::from_str(content).context("Failed to parse JSON settings")
}

fn parse_toml(content: &str) -> Result<DeploySettings> {
    toml::from_str(content).context("Failed to parse TOML settings")
}

/// Auto-detect format and parse
fn parse_auto(content: &str) -> Result<DeploySettings> {
    let trimmed = content.trim();

    if trimmed.starts_with('{') {
        parse_json(content)
    } else if trimmed.lines().any(|l| {
        let l = l.trim();
        l.starts_with('[') || (l.contains('=') && !l.contains(':'))
    }) {
        parse_toml(content)
    } else {
        parse_yaml(content)
    }
}

/// The service name ends up in a username, a unit name and file paths, so
/// it is held to the rules of the strictest of those.
fn validate(settings: &DeploySettings) -> Result<()> {
    let name = &settings.service;
    if name.is_empty() || name.len() > 32 {
        bail!("Service name must be 1-32 characters, got {:?}", name);
    }
    let first = name.chars().next().unwrap_or('-');
    if !(first.is_ascii_lowercase() || first == '_') {
        bail!("Service name must start with a lowercase letter or '_': {:?}", name);
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    {
        bail!(
            "Service name may only contain lowercase letters, digits, '_' and '-': {:?}",
            name
        );
    }
    if settings.app_extensions.is_empty() {
        bail!("app_extensions must list at least one extension");
    }
    for path in [settings.base_dir(), settings.config_path(), settings.unit_dir.clone()] {
        if !path.is_absolute() {
            bail!("{} must be an absolute path", path.display());
        }
        if path.components().any(|c| c == Component::ParentDir) {
            bail!("{} must not contain '..'", path.display());
        }
    }
    // Uninstall removes base_dir recursively
    let base_dir = settings.base_dir();
    if base_dir.components().count() < 3 {
        bail!(
            "base_dir must be at least two levels below /, got {}",
            base_dir.display()
        );
    }
    for (key, name) in [
        ("requirements", settings.requirements.clone()),
        ("config_template", settings.config_template()),
    ] {
        if !is_plain_file_name(&name) {
            bail!("{} must be a plain file name, got {:?}", key, name);
        }
    }
    Ok(())
}

/// A single path component with no separators, `.` or `..`
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.ends_with('/')
}
