use anyhow::Result;

use super::{Deployer, Sequence, Step};
use crate::account;

impl Deployer<'_> {
    /// Remove the service and everything install created. No confirmation.
    pub fn uninstall(&self) -> Result<()> {
        let layout = &self.layout;
        let mut seq = Sequence::new(&format!("Uninstalling {}", layout.service), 5);

        seq.step(Step::StopUnit, || {
            let systemd = self.systemd();
            systemd.stop(&layout.unit_name)?;
            systemd.disable(&layout.unit_name)
        })?;

        seq.step(Step::RemoveUnit, || {
            self.host.remove_file(&layout.unit_path)?;
            let systemd = self.systemd();
            systemd.daemon_reload()?;
            systemd.reset_failed()
        })?;

        seq.step(Step::RemoveFiles, || self.host.remove_dir_all(&layout.base_dir))?;

        seq.step(Step::RemoveAccount, || {
            account::delete_account(self.host, &layout.service)
        })?;

        seq.step(Step::RemoveConfig, || self.host.remove_file(&layout.config_path))?;

        println!("\n✓ {} removed", layout.unit_name);
        Ok(())
    }
}
