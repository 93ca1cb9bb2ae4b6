use std::{io, process::ExitStatus, string::FromUtf8Error};

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
	#[error("I/O error: {0}.")]
	Io(#[from] io::Error),

	#[error("Failed to execute command '{cmd}': {source}")]
	CommandLaunch {
		cmd: String,
		#[source]
		source: io::Error,
	},

	#[error("Command failed: {cmd}")]
	CommandFailed {
		cmd: String,
		status: ExitStatus,
		stderr: Option<String>,
	},

	#[error("Prerequisite check declined: {0}.")]
	PrerequisiteDeclined(String),

	#[error("Invalid configuration: {0}.")]
	Config(String),

	#[error("String error: {0}.")]
	StringError(#[from] FromUtf8Error),
}

impl SetupError {
	/// Exit code the process should terminate with. A failed external
	/// command propagates its own code; everything else maps to 1,
	/// including commands killed by a signal.
	pub fn exit_code(&self) -> i32 {
		match self {
			SetupError::CommandFailed { status, .. } => status.code().unwrap_or(1),
			_ => 1,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::os::unix::process::ExitStatusExt;

	#[test]
	fn command_failed_propagates_exit_code() {
		let err = SetupError::CommandFailed {
			cmd: "kubeadm init".to_owned(),
			status: ExitStatus::from_raw(7 << 8),
			stderr: None,
		};
		assert_eq!(err.exit_code(), 7);
	}

	#[test]
	fn signal_death_maps_to_one() {
		// Raw status 9 is SIGKILL with no exit code.
		let err = SetupError::CommandFailed {
			cmd: "kubeadm init".to_owned(),
			status: ExitStatus::from_raw(9),
			stderr: None,
		};
		assert_eq!(err.exit_code(), 1);
	}

	#[test]
	fn non_command_errors_map_to_one() {
		let err = SetupError::Config("missing join command".to_owned());
		assert_eq!(err.exit_code(), 1);
	}
}
