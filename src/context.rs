use crate::cli;
use crate::error::SetupError;
use crate::setup::utils::exec;
use std::{env, fs, path::PathBuf, str::FromStr};

pub const API_SERVER_PORT: u16 = 6443;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
	Master,
	Worker,
	SshAccess,
}

impl NodeRole {
	/// CLI subcommand name, also the marker-file stem for the role.
	pub fn slug(self) -> &'static str {
		match self {
			NodeRole::Master => "master",
			NodeRole::Worker => "worker",
			NodeRole::SshAccess => "ssh-access",
		}
	}
}

#[derive(Debug, Clone)]
pub struct ControlPlaneEndpoint {
	pub host: String,
	pub port: u16,
}

impl FromStr for ControlPlaneEndpoint {
	type Err = SetupError;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		let value = value.trim();
		if value.is_empty() {
			return Err(SetupError::Config(
				"control-plane endpoint is empty".to_owned(),
			));
		}
		match value.rsplit_once(':') {
			Some((host, port)) => {
				let port = port.parse::<u16>().map_err(|_| {
					SetupError::Config(format!("invalid control-plane port in '{value}'"))
				})?;
				if host.is_empty() {
					return Err(SetupError::Config(format!(
						"missing host in control-plane endpoint '{value}'"
					)));
				}
				Ok(ControlPlaneEndpoint {
					host: host.to_owned(),
					port,
				})
			}
			None => Ok(ControlPlaneEndpoint {
				host: value.to_owned(),
				port: API_SERVER_PORT,
			}),
		}
	}
}

#[derive(Debug, Clone)]
pub enum JoinCommandSource {
	Inline(String),
	File(PathBuf),
}

/// Process-scoped configuration, built once and read-only afterwards.
#[derive(Debug, Clone)]
pub struct RunContext {
	pub role: NodeRole,
	pub resume: bool,
	pub assume_yes: bool,
	pub user: String,
	pub home: String,
	pub hostname: String,
	pub state_dir: PathBuf,
	pub kubernetes_channel: String,
	pub pod_cidr: String,
	pub advertise_address: Option<String>,
	pub control_plane: Option<ControlPlaneEndpoint>,
	pub join_command: Option<JoinCommandSource>,
	pub ssh_port: u16,
}

impl RunContext {
	pub fn for_master(args: &cli::MasterArgs) -> Result<Self, SetupError> {
		let mut ctx = Self::base(NodeRole::Master, &args.common)?;
		ctx.kubernetes_channel = args.kubernetes_version.clone();
		ctx.pod_cidr = args.pod_cidr.clone();
		ctx.advertise_address = args.advertise_address.clone();
		Ok(ctx)
	}

	pub fn for_worker(args: &cli::WorkerArgs) -> Result<Self, SetupError> {
		let mut ctx = Self::base(NodeRole::Worker, &args.common)?;
		ctx.kubernetes_channel = args.kubernetes_version.clone();
		ctx.control_plane = Some(args.control_plane.parse()?);
		ctx.join_command = Some(match (&args.join_command, &args.join_command_file) {
			(Some(cmd), _) => JoinCommandSource::Inline(cmd.clone()),
			(None, Some(path)) => JoinCommandSource::File(path.clone()),
			(None, None) => {
				return Err(SetupError::Config(
					"worker role needs --join-command or --join-command-file".to_owned(),
				))
			}
		});
		Ok(ctx)
	}

	pub fn for_ssh_access(args: &cli::SshAccessArgs) -> Result<Self, SetupError> {
		let mut ctx = Self::base(NodeRole::SshAccess, &args.common)?;
		ctx.ssh_port = args.port;
		Ok(ctx)
	}

	fn base(role: NodeRole, common: &cli::CommonArgs) -> Result<Self, SetupError> {
		let user = invoking_user()?;
		let home = home_of(&user)?;
		let hostname = exec::capture("hostname", &["-f"])?.trim().to_owned();
		Ok(RunContext {
			role,
			resume: common.resume,
			assume_yes: common.yes,
			user,
			home,
			hostname,
			state_dir: common.state_dir.clone(),
			kubernetes_channel: cli::DEFAULT_KUBERNETES_CHANNEL.to_owned(),
			pod_cidr: cli::DEFAULT_POD_CIDR.to_owned(),
			advertise_address: None,
			control_plane: None,
			join_command: None,
			ssh_port: 22,
		})
	}

	#[cfg(test)]
	pub(crate) fn for_tests(state_dir: PathBuf) -> Self {
		RunContext {
			role: NodeRole::Master,
			resume: false,
			assume_yes: true,
			user: "tester".to_owned(),
			home: "/tmp".to_owned(),
			hostname: "test-host".to_owned(),
			state_dir,
			kubernetes_channel: cli::DEFAULT_KUBERNETES_CHANNEL.to_owned(),
			pod_cidr: cli::DEFAULT_POD_CIDR.to_owned(),
			advertise_address: None,
			control_plane: None,
			join_command: None,
			ssh_port: 22,
		}
	}
}

/// The operator behind a sudo invocation, falling back to the current user.
fn invoking_user() -> Result<String, SetupError> {
	if let Ok(user) = env::var("SUDO_USER") {
		if !user.is_empty() {
			return Ok(user);
		}
	}
	env::var("USER")
		.ok()
		.filter(|user| !user.is_empty())
		.ok_or_else(|| SetupError::Config("cannot resolve invoking user, run via sudo".to_owned()))
}

fn home_of(user: &str) -> Result<String, SetupError> {
	let passwd = fs::read_to_string("/etc/passwd")?;
	passwd
		.lines()
		.filter_map(|line| {
			let fields = line.split(':').collect::<Vec<&str>>();
			(fields.len() >= 6 && fields[0] == user).then(|| fields[5].to_owned())
		})
		.next()
		.ok_or_else(|| SetupError::Config(format!("no passwd entry for user '{user}'")))
}
