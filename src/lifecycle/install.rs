use anyhow::Result;

use super::{Deployer, Sequence, Step};
use crate::account;
use crate::conffile::{self, Overwrite};
use crate::venv;

impl Deployer<'_> {
    /// Fresh installation. Safe to repeat: an existing account is reused and
    /// every file step overwrites.
    pub fn install(&self) -> Result<()> {
        let layout = &self.layout;
        let mut seq = Sequence::new(&format!("Installing {}", layout.service), 8);

        seq.step(Step::CreateAccount, || {
            account::create_system_account(self.host, &layout.service).map(|_| ())
        })?;

        seq.step(Step::CreateDirectories, || {
            self.host.create_dir_all(&layout.base_dir)?;
            self.host.create_dir_all(&layout.app_dir)?;
            self.chown_recursive(&layout.base_dir)
        })?;

        seq.step(Step::CreateEnvironment, || {
            venv::create(self.host, layout, &self.python)
        })?;

        seq.step(Step::InstallDependencies, || {
            self.install_dependencies(false).map(|_| ())
        })?;

        seq.step(Step::CopyApplication, || self.copy_application())?;

        seq.step(Step::PlaceConfig, || {
            conffile::place_config(
                self.host,
                &self.source.config_template,
                &layout.config_path,
                Overwrite::Always,
            )
            .map(|_| ())
        })?;

        seq.step(Step::InstallUnit, || self.install_unit_file())?;

        seq.step(Step::StartUnit, || {
            let systemd = self.systemd();
            systemd.enable(&layout.unit_name)?;
            systemd.start(&layout.unit_name)
        })?;

        println!("\n✓ {} installed and started", layout.unit_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::lifecycle::{Step, StepFailure};
    use crate::testing::Fixture;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn install_on_fresh_host_starts_unit() {
        let fx = Fixture::new();
        let unit_source = fx.source.path().join("bratwurstpower.service");
        fs::set_permissions(&unit_source, fs::Permissions::from_mode(0o600)).unwrap();
        fx.deployer().install().unwrap();
        let layout = fx.layout();

        assert!(fx.host.has_user("bratwurstpower"));
        assert_eq!(
            fx.host.unit_state("bratwurstpower.service").as_deref(),
            Some("active")
        );
        assert!(fx.host.is_enabled("bratwurstpower.service"));

        assert!(layout.app_dir.join("bratwurstpower.py").is_file());
        assert!(layout.app_dir.join("pca9557.py").is_file());
        assert!(!layout.app_dir.join("README.md").exists());
        assert!(layout.requirements.is_file());
        assert!(layout.venv_python().is_file());
        assert_eq!(
            fs::read_to_string(&layout.config_path).unwrap(),
            fs::read_to_string(fx.source.path().join("bratwurstpower.ini.example")).unwrap()
        );
        assert_eq!(
            fs::read(&layout.unit_path).unwrap(),
            fs::read(&unit_source).unwrap()
        );
        let mode = fs::metadata(&layout.unit_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn install_runs_collaborators_in_order() {
        let fx = Fixture::new();
        fx.deployer().install().unwrap();
        let layout = fx.layout();
        let base = layout.base_dir.display().to_string();

        assert_eq!(
            fx.host.commands(),
            vec![
                "useradd --system --user-group --no-create-home --shell /usr/sbin/nologin bratwurstpower".to_string(),
                format!("chown -R bratwurstpower:bratwurstpower {}", base),
                format!("sudo -u bratwurstpower python3 -m venv {}/venv", base),
                format!("chown -R bratwurstpower:bratwurstpower {}/requirements.txt", base),
                format!(
                    "sudo -u bratwurstpower {0}/venv/bin/pip install -r {0}/requirements.txt",
                    base
                ),
                format!("chown -R bratwurstpower:bratwurstpower {}/app", base),
                "systemctl daemon-reload".to_string(),
                "systemctl enable bratwurstpower.service".to_string(),
                "systemctl start bratwurstpower.service".to_string(),
            ]
        );
    }

    #[test]
    fn install_twice_tolerates_existing_account() {
        let fx = Fixture::new();
        fx.deployer().install().unwrap();
        fx.deployer().install().unwrap();
        assert!(fx.host.has_user("bratwurstpower"));
    }

    #[test]
    fn install_without_requirements_skips_pip() {
        let fx = Fixture::new();
        fs::remove_file(fx.source.path().join("requirements.txt")).unwrap();
        fx.deployer().install().unwrap();

        assert!(!fx.host.commands().iter().any(|c| c.contains("pip")));
        assert!(!fx.layout().requirements.exists());
    }

    #[test]
    fn install_without_template_skips_config() {
        let fx = Fixture::new();
        fs::remove_file(fx.source.path().join("bratwurstpower.ini.example")).unwrap();
        fx.deployer().install().unwrap();
        assert!(!fx.layout().config_path.exists());
    }

    #[test]
    fn failure_stops_sequence_and_reports_progress() {
        let fx = Fixture::new();
        fx.host.fail_when("sudo -u bratwurstpower python3 -m venv", 1);

        let err = fx.deployer().install().unwrap_err();
        let failure = err.downcast_ref::<StepFailure>().unwrap();
        assert_eq!(failure.step, Step::CreateEnvironment);
        assert_eq!(
            failure.completed,
            vec![Step::CreateAccount, Step::CreateDirectories]
        );

        assert!(!fx.host.commands().iter().any(|c| c.starts_with("systemctl")));
        assert!(!fx.layout().app_dir.join("bratwurstpower.py").exists());
    }

    #[test]
    fn missing_unit_file_fails_install_unit_step() {
        let fx = Fixture::new();
        fs::remove_file(fx.source.path().join("bratwurstpower.service")).unwrap();

        let err = fx.deployer().install().unwrap_err();
        let failure = err.downcast_ref::<StepFailure>().unwrap();
        assert_eq!(failure.step, Step::InstallUnit);
    }
}
