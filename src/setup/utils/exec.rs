use crate::error::SetupError;
use std::process::{Command, Stdio};

fn command_line(program: &str, args: &[&str]) -> String {
	if args.is_empty() {
		program.to_owned()
	} else {
		format!("{program} {}", args.join(" "))
	}
}

/// Run a command with inherited stdio, failing on a non-zero exit.
pub fn status(program: &str, args: &[&str]) -> Result<(), SetupError> {
	let cmd = command_line(program, args);
	let status = Command::new(program)
		.args(args)
		.status()
		.map_err(|source| SetupError::CommandLaunch {
			cmd: cmd.clone(),
			source,
		})?;
	if !status.success() {
		return Err(SetupError::CommandFailed {
			cmd,
			status,
			stderr: None,
		});
	}
	Ok(())
}

/// Run a command and return its stdout, failing on a non-zero exit with
/// stderr captured into the error.
pub fn capture(program: &str, args: &[&str]) -> Result<String, SetupError> {
	let cmd = command_line(program, args);
	let output = Command::new(program)
		.args(args)
		.output()
		.map_err(|source| SetupError::CommandLaunch {
			cmd: cmd.clone(),
			source,
		})?;
	if !output.status.success() {
		let stderr = if output.stderr.is_empty() {
			None
		} else {
			Some(String::from_utf8_lossy(&output.stderr).trim().to_owned())
		};
		return Err(SetupError::CommandFailed {
			cmd,
			status: output.status,
			stderr,
		});
	}
	Ok(String::from_utf8(output.stdout)?)
}

/// Run a shell script fragment under `sh -c`.
pub fn shell(script: &str) -> Result<(), SetupError> {
	let status = Command::new("sh")
		.arg("-c")
		.arg(script)
		.status()
		.map_err(|source| SetupError::CommandLaunch {
			cmd: format!("sh -c {script:?}"),
			source,
		})?;
	if !status.success() {
		return Err(SetupError::CommandFailed {
			cmd: format!("sh -c {script:?}"),
			status,
			stderr: None,
		});
	}
	Ok(())
}

/// Quietly probe whether a command succeeds, swallowing all output.
pub fn check(program: &str, args: &[&str]) -> bool {
	Command::new(program)
		.args(args)
		.stdout(Stdio::null())
		.stderr(Stdio::null())
		.status()
		.is_ok_and(|status| status.success())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn capture_returns_stdout() {
		let out = capture("echo", &["hello"]).unwrap();
		assert_eq!(out.trim(), "hello");
	}

	#[test]
	fn status_failure_carries_exit_code() {
		let err = shell("exit 7").unwrap_err();
		match err {
			SetupError::CommandFailed { status, .. } => assert_eq!(status.code(), Some(7)),
			other => panic!("unexpected error: {other:?}"),
		}
	}

	#[test]
	fn launch_failure_is_reported_separately() {
		let err = status("kubestrap-no-such-binary", &[]).unwrap_err();
		assert!(matches!(err, SetupError::CommandLaunch { .. }));
	}

	#[test]
	fn check_reflects_command_success() {
		assert!(check("true", &[]));
		assert!(!check("false", &[]));
	}
}
