use crate::error::SetupError;
use crate::setup::confirm::Confirmation;
use std::{
	net::{TcpStream, ToSocketAddrs},
	path::Path,
	thread,
	time::Duration,
};
use sysinfo::{Disks, System};
use tracing::{info, warn};

pub const MIN_MEMORY_MB: u64 = 2048;
pub const MIN_CPU_CORES: u64 = 2;
pub const MIN_DISK_FREE_GB: u64 = 10;

/// Host probed for internet egress; also the repository the kube packages
/// stage pulls from, so reachability here is what actually matters.
const EGRESS_PROBE_HOST: &str = "pkgs.k8s.io";
const EGRESS_PROBE_PORT: u16 = 443;
const EGRESS_TIMEOUT: Duration = Duration::from_secs(5);

/// One prerequisite check result. Ephemeral, never persisted.
#[derive(Debug, Clone)]
pub struct PrereqReport {
	pub metric: &'static str,
	pub observed: String,
	pub threshold: String,
	pub pass: bool,
}

impl PrereqReport {
	fn numeric(metric: &'static str, observed: u64, threshold: u64, unit: &str) -> Self {
		PrereqReport {
			metric,
			observed: format!("{observed} {unit}"),
			threshold: format!("{threshold} {unit}"),
			pass: observed >= threshold,
		}
	}
}

/// Probe RAM, CPU count, free disk on / and internet egress.
pub fn gather() -> Vec<PrereqReport> {
	let mut reports = Vec::new();
	let mut sys = System::new();
	sys.refresh_memory();
	reports.push(PrereqReport::numeric(
		"memory",
		sys.total_memory() / (1024 * 1024),
		MIN_MEMORY_MB,
		"MB",
	));
	let cpu_cores = thread::available_parallelism().map_or(0, |nz| nz.get() as u64);
	reports.push(PrereqReport::numeric(
		"cpu cores",
		cpu_cores,
		MIN_CPU_CORES,
		"cores",
	));
	if let Some(free_gb) = root_disk_free_gb() {
		reports.push(PrereqReport::numeric(
			"free disk on /",
			free_gb,
			MIN_DISK_FREE_GB,
			"GiB",
		));
	} else {
		warn!("Could not determine free disk space on /, skipping the check.");
	}
	let egress = egress_reachable();
	reports.push(PrereqReport {
		metric: "internet egress",
		observed: if egress { "reachable" } else { "unreachable" }.to_owned(),
		threshold: format!("{EGRESS_PROBE_HOST}:{EGRESS_PROBE_PORT} reachable"),
		pass: egress,
	});
	reports
}

fn root_disk_free_gb() -> Option<u64> {
	let disks = Disks::new_with_refreshed_list();
	disks
		.iter()
		.find(|disk| disk.mount_point() == Path::new("/"))
		.map(|disk| disk.available_space() / (1024 * 1024 * 1024))
}

fn egress_reachable() -> bool {
	(EGRESS_PROBE_HOST, EGRESS_PROBE_PORT)
		.to_socket_addrs()
		.ok()
		.and_then(|mut addrs| addrs.next())
		.map(|addr| TcpStream::connect_timeout(&addr, EGRESS_TIMEOUT).is_ok())
		.unwrap_or(false)
}

/// Gate on the given reports: every shortfall needs an explicit operator
/// go-ahead, declining aborts the run before any stage executes. Nothing
/// is auto-remediated here.
pub fn enforce(reports: &[PrereqReport], confirm: &dyn Confirmation) -> Result<(), SetupError> {
	for report in reports {
		if report.pass {
			info!(
				"Prerequisite ok: {} ({}, need {}).",
				report.metric, report.observed, report.threshold
			);
			continue;
		}
		warn!(
			"Prerequisite below threshold: {} is {}, need {}.",
			report.metric, report.observed, report.threshold
		);
		let accepted = confirm.confirm(&format!(
			"{} is below the recommended threshold. Continue anyway?",
			report.metric
		))?;
		if !accepted {
			return Err(SetupError::PrerequisiteDeclined(report.metric.to_owned()));
		}
	}
	Ok(())
}

pub fn check(confirm: &dyn Confirmation) -> Result<(), SetupError> {
	let reports = gather();
	enforce(&reports, confirm)
}

#[cfg(test)]
mod tests {
	use super::*;

	struct Decline;

	impl Confirmation for Decline {
		fn confirm(&self, _prompt: &str) -> Result<bool, SetupError> {
			Ok(false)
		}
	}

	struct Accept;

	impl Confirmation for Accept {
		fn confirm(&self, _prompt: &str) -> Result<bool, SetupError> {
			Ok(true)
		}
	}

	fn low_memory_report() -> PrereqReport {
		PrereqReport::numeric("memory", 1024, MIN_MEMORY_MB, "MB")
	}

	#[test]
	fn numeric_report_passes_at_threshold() {
		assert!(PrereqReport::numeric("memory", 2048, MIN_MEMORY_MB, "MB").pass);
		assert!(!low_memory_report().pass);
	}

	#[test]
	fn declined_shortfall_aborts() {
		let err = enforce(&[low_memory_report()], &Decline).unwrap_err();
		assert!(matches!(err, SetupError::PrerequisiteDeclined(_)));
		assert_eq!(err.exit_code(), 1);
	}

	#[test]
	fn accepted_shortfall_proceeds() {
		assert!(enforce(&[low_memory_report()], &Accept).is_ok());
	}

	#[test]
	fn passing_reports_never_prompt() {
		// Decline would abort if the prompt were reached.
		let passing = PrereqReport::numeric("cpu cores", 8, MIN_CPU_CORES, "cores");
		assert!(enforce(&[passing], &Decline).is_ok());
	}
}
