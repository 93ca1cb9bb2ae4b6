use crate::error::SetupError;
use crate::setup::utils::exec;
use std::process::Command;

pub fn is_installed(package_name: &str) -> Result<bool, SetupError> {
	let output = Command::new("dpkg-query")
		.args(["-W", "-f=${Status}", package_name])
		.output()
		.map_err(|source| SetupError::CommandLaunch {
			cmd: format!("dpkg-query -W -f=${{Status}} {package_name}"),
			source,
		})?;
	if !output.status.success() {
		return Ok(false);
	}
	let stdout = String::from_utf8_lossy(&output.stdout);
	let status = stdout.trim();
	Ok(status == "install ok installed" || status == "hold ok installed")
}

pub fn update() -> Result<(), SetupError> {
	exec::status("apt-get", &["update"])
}

pub fn install(package_names: &[&str]) -> Result<(), SetupError> {
	let mut args = vec!["install", "-y", "--no-install-recommends"];
	args.extend_from_slice(package_names);
	exec::status("apt-get", &args)
}

pub fn hold(package_names: &[&str]) -> Result<(), SetupError> {
	let mut args = vec!["hold"];
	args.extend_from_slice(package_names);
	exec::status("apt-mark", &args)
}
