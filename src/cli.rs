use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_KUBERNETES_CHANNEL: &str = "v1.30";
pub const DEFAULT_POD_CIDR: &str = "10.244.0.0/16";

/// Resumable kubeadm node provisioning for Ubuntu-family hosts.
#[derive(Debug, Parser)]
#[command(name = "kubestrap", version, about)]
pub struct Cli {
	/// Append logs to this file in addition to standard output.
	#[arg(
		long,
		global = true,
		env = "KUBESTRAP_LOG_FILE",
		default_value = "/var/log/kubestrap.log"
	)]
	pub log_file: PathBuf,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Provision this host as the cluster control-plane node.
	Master(MasterArgs),
	/// Provision this host as a worker node and join it to the cluster.
	Worker(WorkerArgs),
	/// Harden and expose SSH access on this host.
	SshAccess(SshAccessArgs),
	/// Emit a kubeconfig usable by a remote administrator.
	RemoteKubeconfig(RemoteKubeconfigArgs),
}

#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
	/// Resume from the last completed stage recorded in the marker file.
	#[arg(long)]
	pub resume: bool,

	/// Answer yes to every confirmation prompt.
	#[arg(long)]
	pub yes: bool,

	/// Directory holding progress markers and the saved join command.
	#[arg(
		long,
		env = "KUBESTRAP_STATE_DIR",
		default_value = "/var/lib/kubestrap"
	)]
	pub state_dir: PathBuf,
}

#[derive(Debug, Args)]
pub struct MasterArgs {
	#[command(flatten)]
	pub common: CommonArgs,

	/// Pod network CIDR handed to kubeadm and expected by the CNI manifest.
	#[arg(long, env = "KUBESTRAP_POD_CIDR", default_value = DEFAULT_POD_CIDR)]
	pub pod_cidr: String,

	/// Kubernetes minor release channel of the pkgs.k8s.io apt repository.
	#[arg(
		long,
		env = "KUBESTRAP_KUBERNETES_VERSION",
		default_value = DEFAULT_KUBERNETES_CHANNEL
	)]
	pub kubernetes_version: String,

	/// Address the API server advertises; defaults to kubeadm's detection.
	#[arg(long)]
	pub advertise_address: Option<String>,
}

#[derive(Debug, Args)]
pub struct WorkerArgs {
	#[command(flatten)]
	pub common: CommonArgs,

	/// Control-plane endpoint as host or host:port.
	#[arg(long)]
	pub control_plane: String,

	/// Kubernetes minor release channel of the pkgs.k8s.io apt repository.
	#[arg(
		long,
		env = "KUBESTRAP_KUBERNETES_VERSION",
		default_value = DEFAULT_KUBERNETES_CHANNEL
	)]
	pub kubernetes_version: String,

	/// Full kubeadm join command as printed on the master.
	#[arg(long, conflicts_with = "join_command_file")]
	pub join_command: Option<String>,

	/// File containing the kubeadm join command copied from the master.
	#[arg(long)]
	pub join_command_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SshAccessArgs {
	#[command(flatten)]
	pub common: CommonArgs,

	/// Port the SSH daemon should listen on.
	#[arg(long, default_value_t = 22)]
	pub port: u16,
}

#[derive(Debug, Args)]
pub struct RemoteKubeconfigArgs {
	/// Address remote administrators reach the API server on, host or host:port.
	#[arg(long)]
	pub server: String,

	/// Where to write the generated kubeconfig.
	#[arg(long, default_value = "/root/kubestrap-admin.conf")]
	pub output: PathBuf,
}
