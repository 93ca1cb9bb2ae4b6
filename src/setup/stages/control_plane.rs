use crate::context::RunContext;
use crate::error::SetupError;
use crate::setup::utils::{exec, files};
use crate::setup::{Stage, StageId};
use tracing::info;

pub const ADMIN_KUBECONFIG: &str = "/etc/kubernetes/admin.conf";

pub struct KubeadmInit;

impl Stage for KubeadmInit {
	fn id(&self) -> StageId {
		StageId::ClusterInitialized
	}

	fn run(&self, ctx: &RunContext) -> Result<(), SetupError> {
		info!("Initializing the control plane with kubeadm.");
		let mut args = vec!["init", "--pod-network-cidr", ctx.pod_cidr.as_str()];
		if let Some(address) = &ctx.advertise_address {
			args.extend_from_slice(&["--apiserver-advertise-address", address]);
		}
		// The preflight gate already let the operator accept a small host.
		args.push("--ignore-preflight-errors=NumCPU,Mem");
		exec::status("kubeadm", &args)?;
		info!("Control plane initialized.");
		Ok(())
	}
}

pub struct AdminKubeconfig;

impl Stage for AdminKubeconfig {
	fn id(&self) -> StageId {
		StageId::AdminKubeconfig
	}

	fn run(&self, ctx: &RunContext) -> Result<(), SetupError> {
		let home = &ctx.home;
		let user = &ctx.user;
		info!("Installing admin kubeconfig for {user}.");
		exec::shell(&format!(
			"mkdir -p {home}/.kube\n\
			 cp -f {ADMIN_KUBECONFIG} {home}/.kube/config\n\
			 chown {user}:{user} {home}/.kube/config\n\
			 chmod 600 {home}/.kube/config",
		))?;
		Ok(())
	}
}

pub struct PodNetwork;

impl PodNetwork {
	pub const FLANNEL_VERSION: &'static str = "v0.25.6";

	pub fn manifest_url() -> String {
		format!(
			"https://github.com/flannel-io/flannel/releases/download/{}/kube-flannel.yml",
			PodNetwork::FLANNEL_VERSION
		)
	}
}

impl Stage for PodNetwork {
	fn id(&self) -> StageId {
		StageId::PodNetwork
	}

	fn run(&self, _ctx: &RunContext) -> Result<(), SetupError> {
		info!("Applying the Flannel CNI manifest.");
		exec::status(
			"kubectl",
			&[
				"--kubeconfig",
				ADMIN_KUBECONFIG,
				"apply",
				"-f",
				&PodNetwork::manifest_url(),
			],
		)?;
		Ok(())
	}
}

pub struct SaveJoinCommand;

impl SaveJoinCommand {
	pub const FILE_NAME: &'static str = "join-command.sh";
}

impl Stage for SaveJoinCommand {
	fn id(&self) -> StageId {
		StageId::JoinCommandSaved
	}

	fn run(&self, ctx: &RunContext) -> Result<(), SetupError> {
		info!("Generating a fresh worker join command.");
		let join_cmd = exec::capture("kubeadm", &["token", "create", "--print-join-command"])?
			.trim()
			.to_owned();
		if !join_cmd.contains("kubeadm join") {
			return Err(SetupError::Config(format!(
				"kubeadm returned an unusable join command: {join_cmd:?}"
			)));
		}
		let path = ctx.state_dir.join(SaveJoinCommand::FILE_NAME);
		files::write_private(&path, &(join_cmd + "\n"))?;
		info!(
			"Join command written to {}; copy it to the worker and pass it via --join-command-file.",
			path.display()
		);
		Ok(())
	}
}
