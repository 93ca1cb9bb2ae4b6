use crate::context::RunContext;
use crate::error::SetupError;
use crate::setup::progress::ProgressStore;
use crate::setup::StageFailure;
use tracing::{error, info};

/// Summarize a failed stage and hand back the exit code to terminate
/// with. Nothing is rolled back; the only recovery path is fixing the
/// underlying problem and re-running with `--resume`.
pub fn stage_failure(failure: &StageFailure, store: &ProgressStore, ctx: &RunContext) -> i32 {
	let code = failure.error.exit_code();
	error!(
		"Stage '{}' failed (exit code {code}): {}",
		failure.stage, failure.error
	);
	if let SetupError::CommandFailed {
		stderr: Some(stderr),
		..
	} = &failure.error
	{
		error!("Captured stderr: {stderr}");
	}
	match store.read() {
		Ok(Some(marker)) => info!("Last completed stage: '{marker}'."),
		Ok(None) => info!("No stage had completed before the failure."),
		Err(err) => error!("Could not read the progress marker: {err}"),
	}
	info!(
		"Fix the underlying problem, then run 'kubestrap {} --resume' to continue from '{}'.",
		ctx.role.slug(),
		failure.stage
	);
	code
}
