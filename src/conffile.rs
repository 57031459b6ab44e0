//! Placement of the service's INI configuration file.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::cmd::Host;
use crate::prompt::Confirm;

/// Sections and keys the bratwurstpower daemon reads at startup
const REQUIRED_KEYS: &[(&str, &[&str])] = &[
    (
        "mqtt",
        &[
            "enabled",
            "server",
            "port",
            "username",
            "password",
            "base_topic",
            "hass_discovery_prefix",
        ],
    ),
    (
        "general",
        &["measurement_interval", "loglevel", "runtime_directory"],
    ),
];

/// Whether an existing destination may be overwritten
pub enum Overwrite<'c> {
    Always,
    Ask(&'c mut dyn Confirm),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Destination did not exist and was created
    Installed,
    /// Destination existed and was overwritten
    Replaced,
    /// Operator declined the overwrite
    Kept,
    /// Source tree has no template
    NoTemplate,
}

pub fn place_config(
    host: &dyn Host,
    template: &Path,
    dest: &Path,
    overwrite: Overwrite<'_>,
) -> Result<Placement> {
    if !template.is_file() {
        println!(
            "  No config template found at {}, skipping",
            template.display()
        );
        return Ok(Placement::NoTemplate);
    }

    warn_on_missing_keys(template);

    let exists = dest.exists();
    if exists {
        if let Overwrite::Ask(confirm) = overwrite {
            let question = format!(
                "{} already exists. Overwrite it with {}?",
                dest.display(),
                template.display()
            );
            if !confirm.confirm(&question)? {
                println!("  Keeping existing {}", dest.display());
                return Ok(Placement::Kept);
            }
        }
    }

    if let Some(parent) = dest.parent() {
        host.create_dir_all(parent)?;
    }
    host.replace_file(template, dest)?;

    if exists {
        println!("  Replaced {}", dest.display());
        Ok(Placement::Replaced)
    } else {
        println!("  Installed {}", dest.display());
        Ok(Placement::Installed)
    }
}

fn warn_on_missing_keys(template: &Path) {
    let content = match fs::read_to_string(template)
        .with_context(|| format!("Failed to read {}", template.display()))
    {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("{:#}", e);
            return;
        }
    };

    for key in missing_keys(&content) {
        println!("  Warning: config template has no {}", key);
    }
}

/// `section.key` entries the daemon needs but the INI text lacks
pub fn missing_keys(content: &str) -> Vec<String> {
    let mut present: Vec<(String, String)> = Vec::new();
    let mut section = String::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            section = name.trim().to_string();
            continue;
        }
        if let Some(idx) = line.find(['=', ':']) {
            present.push((section.clone(), line[..idx].trim().to_lowercase()));
        }
    }

    let mut missing = Vec::new();
    for (section, keys) in REQUIRED_KEYS {
        for key in *keys {
            if !present.iter().any(|(s, k)| s == section && k == key) {
                missing.push(format!("{}.{}", section, key));
            }
        }
    }
    missing
}
