use crate::context::RunContext;
use crate::error::SetupError;
use crate::setup::utils::{exec, files, pkg};
use crate::setup::{Stage, StageId};
use std::path::Path;
use tracing::info;

pub struct SshdConfig;

impl SshdConfig {
	pub const CONFIG_PATH: &'static str = "/etc/ssh/sshd_config.d/kubestrap.conf";

	pub fn render(port: u16) -> String {
		format!(
			"# Managed by kubestrap.\n\
			 Port {port}\n\
			 PasswordAuthentication no\n\
			 PermitRootLogin prohibit-password\n"
		)
	}
}

impl Stage for SshdConfig {
	fn id(&self) -> StageId {
		StageId::SshdConfigured
	}

	fn run(&self, ctx: &RunContext) -> Result<(), SetupError> {
		if !pkg::is_installed("openssh-server")? {
			pkg::install(&["openssh-server"])?;
		}
		let config_txt = SshdConfig::render(ctx.ssh_port);
		if files::write_if_changed(Path::new(SshdConfig::CONFIG_PATH), &config_txt)? {
			info!("Wrote {}.", SshdConfig::CONFIG_PATH);
		}
		Ok(())
	}
}

pub struct SshdRestart;

impl Stage for SshdRestart {
	fn id(&self) -> StageId {
		StageId::SshdRestarted
	}

	fn run(&self, _ctx: &RunContext) -> Result<(), SetupError> {
		// Validate the combined sshd config before cutting over, a broken
		// config would lock the operator out.
		exec::status("sshd", &["-t"])?;
		info!("Restarting the SSH daemon.");
		exec::status("systemctl", &["restart", "ssh"])?;
		Ok(())
	}
}
