use crate::context::RunContext;
use crate::error::SetupError;
use crate::setup::utils::{exec, files};
use crate::setup::{Stage, StageId};
use std::path::Path;
use tracing::info;

pub struct KernelModules;

impl KernelModules {
	pub const CONFIG_PATH: &'static str = "/etc/modules-load.d/k8s.conf";
	pub const MODULES: &'static [&'static str] = &["overlay", "br_netfilter"];

	pub fn is_loaded(module_name: &str) -> bool {
		Path::new("/sys/module/").join(module_name).exists()
	}
}

impl Stage for KernelModules {
	fn id(&self) -> StageId {
		StageId::KernelModules
	}

	fn run(&self, _ctx: &RunContext) -> Result<(), SetupError> {
		let config_txt = KernelModules::MODULES.join("\n") + "\n";
		if files::write_if_changed(Path::new(KernelModules::CONFIG_PATH), &config_txt)? {
			info!("Wrote {}.", KernelModules::CONFIG_PATH);
		}
		for module_name in KernelModules::MODULES {
			if KernelModules::is_loaded(module_name) {
				info!("Kernel module {module_name} already loaded.");
				continue;
			}
			info!("Loading kernel module {module_name}.");
			exec::status("modprobe", &[module_name])?;
		}
		Ok(())
	}
}
