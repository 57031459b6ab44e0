use anyhow::{bail, Result};

use super::{Deployer, Sequence, Step};
use crate::conffile::{self, Overwrite, Placement};
use crate::prompt::Confirm;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Unit is not registered with systemd; nothing was touched
    NotInstalled,
    Updated { config: Placement },
}

impl Deployer<'_> {
    /// Refresh unit, application files, dependencies and (with consent) the
    /// config of an installed service, then restart it.
    pub fn update(&self, confirm: &mut dyn Confirm) -> Result<UpdateOutcome> {
        let layout = &self.layout;

        if !self.systemd().is_registered(&layout.unit_name)? {
            println!(
                "{} is not installed. Run install first.",
                layout.unit_name
            );
            return Ok(UpdateOutcome::NotInstalled);
        }

        self.check_installed_layout()?;

        let mut seq = Sequence::new(&format!("Updating {}", layout.service), 5);

        seq.step(Step::InstallUnit, || self.install_unit_file())?;

        seq.step(Step::CopyApplication, || self.copy_application())?;

        seq.step(Step::InstallDependencies, || {
            self.install_dependencies(true).map(|_| ())
        })?;

        let config = seq.step(Step::PlaceConfig, || {
            conffile::place_config(
                self.host,
                &self.source.config_template,
                &layout.config_path,
                Overwrite::Ask(confirm),
            )
        })?;

        seq.step(Step::RestartUnit, || {
            self.systemd().restart(&layout.unit_name)
        })?;

        println!("\n✓ {} updated and restarted", layout.unit_name);
        Ok(UpdateOutcome::Updated { config })
    }

    /// A registered unit whose files have gone missing is not patched up
    /// here; the operator is sent back to install.
    fn check_installed_layout(&self) -> Result<()> {
        let layout = &self.layout;
        let venv_python = layout.venv_python();
        let required = [&layout.base_dir, &layout.app_dir, &venv_python];

        let missing: Vec<String> = required
            .iter()
            .filter(|p| !p.exists())
            .map(|p| p.display().to_string())
            .collect();

        if !missing.is_empty() {
            bail!(
                "{} is registered but its installation is incomplete (missing: {}). \
                 Run install again to recreate it.",
                layout.unit_name,
                missing.join(", ")
            );
        }
        Ok(())
    }
}
