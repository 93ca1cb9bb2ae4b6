use crate::context::{JoinCommandSource, RunContext};
use crate::error::SetupError;
use crate::setup::utils::exec;
use crate::setup::{Stage, StageId};
use std::fs;
use tracing::info;

pub struct JoinCluster;

fn resolve_join_command(source: &JoinCommandSource) -> Result<String, SetupError> {
	let command = match source {
		JoinCommandSource::Inline(command) => command.trim().to_owned(),
		JoinCommandSource::File(path) => fs::read_to_string(path)?.trim().to_owned(),
	};
	if !command.contains("kubeadm join") {
		return Err(SetupError::Config(format!(
			"join command does not invoke kubeadm join: {command:?}"
		)));
	}
	Ok(command)
}

impl Stage for JoinCluster {
	fn id(&self) -> StageId {
		StageId::ClusterJoined
	}

	fn run(&self, ctx: &RunContext) -> Result<(), SetupError> {
		let source = ctx.join_command.as_ref().ok_or_else(|| {
			SetupError::Config("worker run without a join command source".to_owned())
		})?;
		let join_cmd = resolve_join_command(source)?;
		info!("Joining the cluster.");
		exec::shell(&join_cmd)?;
		info!("This node has joined the cluster.");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn inline_join_command_is_trimmed() {
		let source =
			JoinCommandSource::Inline("  kubeadm join 10.0.0.2:6443 --token abc \n".to_owned());
		assert_eq!(
			resolve_join_command(&source).unwrap(),
			"kubeadm join 10.0.0.2:6443 --token abc"
		);
	}

	#[test]
	fn file_join_command_is_read() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "kubeadm join 10.0.0.2:6443 --token abc").unwrap();
		let source = JoinCommandSource::File(file.path().to_path_buf());
		assert_eq!(
			resolve_join_command(&source).unwrap(),
			"kubeadm join 10.0.0.2:6443 --token abc"
		);
	}

	#[test]
	fn non_join_content_is_rejected() {
		let source = JoinCommandSource::Inline("rm -rf /".to_owned());
		assert!(matches!(
			resolve_join_command(&source),
			Err(SetupError::Config(_))
		));
	}
}
