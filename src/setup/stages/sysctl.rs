use crate::context::RunContext;
use crate::error::SetupError;
use crate::setup::utils::{exec, files};
use crate::setup::{Stage, StageId};
use std::path::Path;
use tracing::info;

pub struct Sysctl;

impl Sysctl {
	pub const CONFIG_PATH: &'static str = "/etc/sysctl.d/k8s.conf";
}

impl Stage for Sysctl {
	fn id(&self) -> StageId {
		StageId::SysctlConfigured
	}

	fn run(&self, _ctx: &RunContext) -> Result<(), SetupError> {
		let config_txt = [
			"net.bridge.bridge-nf-call-iptables = 1",
			"net.bridge.bridge-nf-call-ip6tables = 1",
			"net.ipv4.ip_forward = 1",
		]
		.join("\n")
			+ "\n";
		if files::write_if_changed(Path::new(Sysctl::CONFIG_PATH), &config_txt)? {
			info!("Wrote {}.", Sysctl::CONFIG_PATH);
		}
		exec::status("sysctl", &["--system"])?;
		info!("Sysctl parameters applied.");
		Ok(())
	}
}
