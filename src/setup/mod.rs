pub mod confirm;
pub mod kubeconfig;
pub mod preflight;
pub mod probe;
pub mod progress;
pub mod report;
pub mod stages;
pub mod utils;

use crate::context::{NodeRole, RunContext};
use crate::error::SetupError;
use confirm::Confirmation;
use progress::ProgressStore;
use std::fmt;
use tracing::{info, warn};

/// Closed set of stage names across every role. The snake_case form is the
/// marker-file format and must stay stable across releases, or resumption
/// after an upgrade silently restarts from stage 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageId {
	SystemPackages,
	SwapDisabled,
	KernelModules,
	SysctlConfigured,
	ContainerdInstalled,
	KubePackages,
	FirewallConfigured,
	ClusterInitialized,
	AdminKubeconfig,
	PodNetwork,
	JoinCommandSaved,
	ClusterJoined,
	SshdConfigured,
	SshFirewall,
	SshdRestarted,
}

impl StageId {
	pub const ALL: &'static [StageId] = &[
		StageId::SystemPackages,
		StageId::SwapDisabled,
		StageId::KernelModules,
		StageId::SysctlConfigured,
		StageId::ContainerdInstalled,
		StageId::KubePackages,
		StageId::FirewallConfigured,
		StageId::ClusterInitialized,
		StageId::AdminKubeconfig,
		StageId::PodNetwork,
		StageId::JoinCommandSaved,
		StageId::ClusterJoined,
		StageId::SshdConfigured,
		StageId::SshFirewall,
		StageId::SshdRestarted,
	];

	pub const fn name(self) -> &'static str {
		match self {
			StageId::SystemPackages => "system_packages",
			StageId::SwapDisabled => "swap_disabled",
			StageId::KernelModules => "kernel_modules",
			StageId::SysctlConfigured => "sysctl_configured",
			StageId::ContainerdInstalled => "containerd_installed",
			StageId::KubePackages => "kube_packages",
			StageId::FirewallConfigured => "firewall_configured",
			StageId::ClusterInitialized => "cluster_initialized",
			StageId::AdminKubeconfig => "admin_kubeconfig",
			StageId::PodNetwork => "pod_network",
			StageId::JoinCommandSaved => "join_command_saved",
			StageId::ClusterJoined => "cluster_joined",
			StageId::SshdConfigured => "sshd_configured",
			StageId::SshFirewall => "ssh_firewall",
			StageId::SshdRestarted => "sshd_restarted",
		}
	}

	pub fn from_name(name: &str) -> Option<StageId> {
		StageId::ALL.iter().copied().find(|id| id.name() == name)
	}
}

impl fmt::Display for StageId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// One named, ordered unit of provisioning work.
pub trait Stage {
	fn id(&self) -> StageId;
	fn run(&self, ctx: &RunContext) -> Result<(), SetupError>;
}

/// A stage failure annotated with the stage it happened in, for the
/// error reporter.
#[derive(Debug)]
pub struct StageFailure {
	pub stage: StageId,
	pub error: SetupError,
}

const MASTER_STAGES: &[&dyn Stage] = &[
	&stages::SystemPackages,
	&stages::DisableSwap,
	&stages::KernelModules,
	&stages::Sysctl,
	&stages::Containerd,
	&stages::KubePackages,
	&stages::Firewall,
	&stages::KubeadmInit,
	&stages::AdminKubeconfig,
	&stages::PodNetwork,
	&stages::SaveJoinCommand,
];

const WORKER_STAGES: &[&dyn Stage] = &[
	&stages::SystemPackages,
	&stages::DisableSwap,
	&stages::KernelModules,
	&stages::Sysctl,
	&stages::Containerd,
	&stages::KubePackages,
	&stages::Firewall,
	&stages::JoinCluster,
];

const SSH_ACCESS_STAGES: &[&dyn Stage] = &[
	&stages::SshdConfig,
	&stages::SshFirewall,
	&stages::SshdRestart,
];

pub fn stage_list(role: NodeRole) -> &'static [&'static dyn Stage] {
	match role {
		NodeRole::Master => MASTER_STAGES,
		NodeRole::Worker => WORKER_STAGES,
		NodeRole::SshAccess => SSH_ACCESS_STAGES,
	}
}

/// Walks an ordered stage list, skipping stages already recorded in the
/// marker file when resuming, and commits the marker after each success.
pub struct StageRunner<'a> {
	stages: &'a [&'a dyn Stage],
	progress: &'a ProgressStore,
	resume: bool,
}

impl<'a> StageRunner<'a> {
	pub fn new(stages: &'a [&'a dyn Stage], progress: &'a ProgressStore, resume: bool) -> Self {
		StageRunner {
			stages,
			progress,
			resume,
		}
	}

	/// Index of the first stage to execute: without `--resume` always 0;
	/// with it, the stage strictly after the marker. An unrecognized
	/// marker restarts from 0 with a warning rather than failing, so a
	/// corrupted marker file costs re-execution, never a dead end.
	fn start_index(&self) -> Result<usize, SetupError> {
		if !self.resume {
			return Ok(0);
		}
		let Some(marker) = self.progress.read()? else {
			info!("No progress marker found, starting from the first stage.");
			return Ok(0);
		};
		let position = StageId::from_name(&marker)
			.and_then(|id| self.stages.iter().position(|stage| stage.id() == id));
		match position {
			Some(pos) => {
				info!("Resuming after completed stage '{marker}'.");
				Ok(pos + 1)
			}
			None => {
				warn!("Unrecognized progress marker '{marker}', restarting from the first stage.");
				Ok(0)
			}
		}
	}

	pub fn run(&self, ctx: &RunContext) -> Result<(), StageFailure> {
		let start = match self.start_index() {
			Ok(start) => start,
			Err(error) => {
				return Err(StageFailure {
					stage: self.stages[0].id(),
					error,
				})
			}
		};
		if start >= self.stages.len() {
			info!(
				"All {} stages already completed, nothing to do.",
				self.stages.len()
			);
			return Ok(());
		}
		let total = self.stages.len();
		for (position, stage) in self.stages.iter().enumerate().skip(start) {
			let id = stage.id();
			info!("Stage {}/{}: {id}.", position + 1, total);
			if let Err(error) = stage.run(ctx) {
				return Err(StageFailure { stage: id, error });
			}
			if let Err(error) = self.progress.write(id.name()) {
				return Err(StageFailure { stage: id, error });
			}
			info!("Stage {id} completed.");
		}
		Ok(())
	}
}

/// Full provisioning run for the configured role. Returns the process
/// exit code: 0 on success or operator stop, the failing command's code
/// otherwise.
pub fn run(ctx: &RunContext, confirm: &dyn Confirmation) -> i32 {
	if matches!(ctx.role, NodeRole::Master | NodeRole::Worker) {
		if let Err(err) = preflight::check(confirm) {
			tracing::error!("Aborted during prerequisite checks: {err}");
			return err.exit_code();
		}
	}
	if let Some(endpoint) = &ctx.control_plane {
		match probe::gate(endpoint, confirm) {
			Ok(true) => {}
			Ok(false) => {
				info!("Stopping at operator request after connectivity probe.");
				return 0;
			}
			Err(err) => {
				tracing::error!("Connectivity probe failed: {err}");
				return err.exit_code();
			}
		}
	}
	let store = ProgressStore::for_role(&ctx.state_dir, ctx.role.slug());
	let runner = StageRunner::new(stage_list(ctx.role), &store, ctx.resume);
	match runner.run(ctx) {
		Ok(()) => {
			info!("Provisioning for role '{}' finished.", ctx.role.slug());
			0
		}
		Err(failure) => report::stage_failure(&failure, &store, ctx),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::cell::RefCell;
	use std::os::unix::process::ExitStatusExt;
	use std::process::ExitStatus;

	struct Scripted<'a> {
		id: StageId,
		fail_code: Option<i32>,
		log: &'a RefCell<Vec<StageId>>,
	}

	impl Stage for Scripted<'_> {
		fn id(&self) -> StageId {
			self.id
		}

		fn run(&self, _ctx: &RunContext) -> Result<(), SetupError> {
			self.log.borrow_mut().push(self.id);
			match self.fail_code {
				Some(code) => Err(SetupError::CommandFailed {
					cmd: "false".to_owned(),
					status: ExitStatus::from_raw(code << 8),
					stderr: None,
				}),
				None => Ok(()),
			}
		}
	}

	const A: StageId = StageId::SystemPackages;
	const B: StageId = StageId::SwapDisabled;
	const C: StageId = StageId::KernelModules;

	fn scripted<'a>(
		log: &'a RefCell<Vec<StageId>>,
		failures: &[(StageId, i32)],
	) -> Vec<Scripted<'a>> {
		[A, B, C]
			.iter()
			.map(|&id| Scripted {
				id,
				fail_code: failures
					.iter()
					.find(|(fid, _)| *fid == id)
					.map(|(_, code)| *code),
				log,
			})
			.collect()
	}

	fn run_stages(
		stages: &[Scripted<'_>],
		store: &ProgressStore,
		resume: bool,
	) -> Result<(), StageFailure> {
		let refs = stages.iter().map(|s| s as &dyn Stage).collect::<Vec<_>>();
		let ctx = RunContext::for_tests(store.path().parent().unwrap().to_path_buf());
		StageRunner::new(&refs, store, resume).run(&ctx)
	}

	#[test]
	fn fresh_run_executes_every_stage_in_order() {
		let dir = tempfile::tempdir().unwrap();
		let store = ProgressStore::for_role(dir.path(), "master");
		let log = RefCell::new(Vec::new());
		let stages = scripted(&log, &[]);
		run_stages(&stages, &store, false).unwrap();
		assert_eq!(*log.borrow(), vec![A, B, C]);
		assert_eq!(store.read().unwrap().as_deref(), Some(C.name()));
	}

	#[test]
	fn resume_skips_stages_up_to_the_marker() {
		let dir = tempfile::tempdir().unwrap();
		let store = ProgressStore::for_role(dir.path(), "master");
		store.write(B.name()).unwrap();
		let log = RefCell::new(Vec::new());
		let stages = scripted(&log, &[]);
		run_stages(&stages, &store, true).unwrap();
		assert_eq!(*log.borrow(), vec![C]);
	}

	#[test]
	fn without_resume_the_marker_is_ignored() {
		let dir = tempfile::tempdir().unwrap();
		let store = ProgressStore::for_role(dir.path(), "master");
		store.write(B.name()).unwrap();
		let log = RefCell::new(Vec::new());
		let stages = scripted(&log, &[]);
		run_stages(&stages, &store, false).unwrap();
		assert_eq!(*log.borrow(), vec![A, B, C]);
	}

	#[test]
	fn unknown_marker_restarts_from_the_first_stage() {
		let dir = tempfile::tempdir().unwrap();
		let store = ProgressStore::for_role(dir.path(), "master");
		store.write("not_a_stage").unwrap();
		let log = RefCell::new(Vec::new());
		let stages = scripted(&log, &[]);
		run_stages(&stages, &store, true).unwrap();
		assert_eq!(*log.borrow(), vec![A, B, C]);
	}

	#[test]
	fn resume_after_completion_runs_nothing() {
		let dir = tempfile::tempdir().unwrap();
		let store = ProgressStore::for_role(dir.path(), "master");
		store.write(C.name()).unwrap();
		let log = RefCell::new(Vec::new());
		let stages = scripted(&log, &[]);
		run_stages(&stages, &store, true).unwrap();
		assert!(log.borrow().is_empty());
	}

	#[test]
	fn failure_halts_and_leaves_the_previous_marker() {
		let dir = tempfile::tempdir().unwrap();
		let store = ProgressStore::for_role(dir.path(), "master");
		let log = RefCell::new(Vec::new());
		let stages = scripted(&log, &[(C, 7)]);
		let failure = run_stages(&stages, &store, false).unwrap_err();
		assert_eq!(failure.stage, C);
		assert_eq!(failure.error.exit_code(), 7);
		assert_eq!(*log.borrow(), vec![A, B, C]);
		assert_eq!(store.read().unwrap().as_deref(), Some(B.name()));
		// A resumed re-run picks up exactly at the failed stage.
		let log = RefCell::new(Vec::new());
		let stages = scripted(&log, &[]);
		run_stages(&stages, &store, true).unwrap();
		assert_eq!(*log.borrow(), vec![C]);
	}

	#[test]
	fn failure_in_the_first_stage_writes_no_marker() {
		let dir = tempfile::tempdir().unwrap();
		let store = ProgressStore::for_role(dir.path(), "master");
		let log = RefCell::new(Vec::new());
		let stages = scripted(&log, &[(A, 3)]);
		let failure = run_stages(&stages, &store, false).unwrap_err();
		assert_eq!(failure.stage, A);
		assert_eq!(store.read().unwrap(), None);
	}

	#[test]
	fn stage_names_round_trip_and_are_unique() {
		for &id in StageId::ALL {
			assert_eq!(StageId::from_name(id.name()), Some(id));
		}
		let mut names = StageId::ALL.iter().map(|id| id.name()).collect::<Vec<_>>();
		names.sort_unstable();
		names.dedup();
		assert_eq!(names.len(), StageId::ALL.len());
	}

	#[test]
	fn role_stage_lists_have_unique_ordered_ids() {
		for role in [NodeRole::Master, NodeRole::Worker, NodeRole::SshAccess] {
			let mut names = stage_list(role)
				.iter()
				.map(|stage| stage.id().name())
				.collect::<Vec<_>>();
			let count = names.len();
			names.sort_unstable();
			names.dedup();
			assert_eq!(names.len(), count, "duplicate stage in {role:?}");
		}
	}
}
