use crate::context::RunContext;
use crate::error::SetupError;
use crate::setup::utils::{exec, files, pkg};
use crate::setup::{Stage, StageId};
use std::{fs, path::Path};
use tracing::info;

pub struct Containerd;

impl Containerd {
	pub const PACKAGE_NAME: &'static str = "containerd";
	pub const CONFIG_PATH: &'static str = "/etc/containerd/config.toml";
}

/// kubelet drives cgroups through systemd, containerd's default config
/// does not.
fn enable_systemd_cgroup(config: &str) -> String {
	config.replace("SystemdCgroup = false", "SystemdCgroup = true")
}

impl Stage for Containerd {
	fn id(&self) -> StageId {
		StageId::ContainerdInstalled
	}

	fn run(&self, _ctx: &RunContext) -> Result<(), SetupError> {
		if !pkg::is_installed(Containerd::PACKAGE_NAME)? {
			pkg::install(&[Containerd::PACKAGE_NAME])?;
		}
		let config_path = Path::new(Containerd::CONFIG_PATH);
		let current = fs::read_to_string(config_path).unwrap_or_default();
		let config = if current.trim().is_empty() {
			info!("Generating default containerd config.");
			exec::capture(Containerd::PACKAGE_NAME, &["config", "default"])?
		} else {
			current
		};
		if files::write_if_changed(config_path, &enable_systemd_cgroup(&config))? {
			info!("Wrote {}.", Containerd::CONFIG_PATH);
		}
		exec::status("systemctl", &["enable", Containerd::PACKAGE_NAME])?;
		info!("Restarting containerd.");
		exec::status("systemctl", &["restart", Containerd::PACKAGE_NAME])?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn systemd_cgroup_gets_switched_on() {
		let config = "[plugins.\"io.containerd.grpc.v1.cri\"]\n  SystemdCgroup = false\n";
		assert!(enable_systemd_cgroup(config).contains("SystemdCgroup = true"));
	}

	#[test]
	fn already_enabled_config_is_unchanged() {
		let config = "SystemdCgroup = true\n";
		assert_eq!(enable_systemd_cgroup(config), config);
	}
}
