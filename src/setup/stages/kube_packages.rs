use crate::context::RunContext;
use crate::error::SetupError;
use crate::setup::utils::{exec, files, pkg};
use crate::setup::{Stage, StageId};
use std::path::Path;
use tracing::info;

pub struct KubePackages;

impl KubePackages {
	pub const PACKAGE_NAMES: &'static [&'static str] = &["kubelet", "kubeadm", "kubectl"];
	pub const APT_CONFIG_PATH: &'static str = "/etc/apt/sources.list.d/kubernetes.list";
	pub const APT_KEY_PATH: &'static str = "/etc/apt/keyrings/kubernetes-apt-keyring.gpg";

	pub fn repository_url(channel: &str) -> String {
		format!("https://pkgs.k8s.io/core:/stable:/{channel}/deb")
	}
}

impl Stage for KubePackages {
	fn id(&self) -> StageId {
		StageId::KubePackages
	}

	fn run(&self, ctx: &RunContext) -> Result<(), SetupError> {
		let base_url = KubePackages::repository_url(&ctx.kubernetes_channel);
		info!(
			"Installing Kubernetes {} tooling from {base_url}.",
			ctx.kubernetes_channel
		);
		exec::shell(&format!(
			"curl -fsSL {base_url}/Release.key | gpg --dearmor --yes -o {}",
			KubePackages::APT_KEY_PATH,
		))?;
		let apt_config_txt = format!(
			"deb [signed-by={}] {base_url} /\n",
			KubePackages::APT_KEY_PATH,
		);
		if files::write_if_changed(Path::new(KubePackages::APT_CONFIG_PATH), &apt_config_txt)? {
			info!("Wrote {}.", KubePackages::APT_CONFIG_PATH);
		}
		pkg::update()?;
		pkg::install(KubePackages::PACKAGE_NAMES)?;
		pkg::hold(KubePackages::PACKAGE_NAMES)?;
		exec::status("systemctl", &["enable", "kubelet"])?;
		info!("Kubernetes tooling installed and held.");
		Ok(())
	}
}
