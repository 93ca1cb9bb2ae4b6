use crate::context::API_SERVER_PORT;
use crate::error::SetupError;
use crate::setup::stages::control_plane::ADMIN_KUBECONFIG;
use crate::setup::utils::{exec, files};
use std::path::Path;
use tracing::info;

/// Server URL for the generated kubeconfig; a bare host gets the default
/// API server port appended.
pub fn server_url(server: &str) -> String {
	let server = server.trim().trim_start_matches("https://");
	if server.contains(':') {
		format!("https://{server}")
	} else {
		format!("https://{server}:{API_SERVER_PORT}")
	}
}

/// Emit a self-contained admin kubeconfig pointed at the externally
/// reachable API server address. Certificates are embedded so the file
/// can be copied to a remote workstation as-is.
pub fn generate(server: &str, output: &Path) -> Result<(), SetupError> {
	info!("Flattening {ADMIN_KUBECONFIG} for remote use.");
	let flattened = exec::capture(
		"kubectl",
		&[
			"--kubeconfig",
			ADMIN_KUBECONFIG,
			"config",
			"view",
			"--flatten",
			"--minify",
		],
	)?;
	files::write_private(output, &flattened)?;
	let output_str = output.to_string_lossy();
	let url = server_url(server);
	exec::status(
		"kubectl",
		&[
			"--kubeconfig",
			&output_str,
			"config",
			"set-cluster",
			"kubernetes",
			&format!("--server={url}"),
		],
	)?;
	info!("Remote admin kubeconfig written to {output_str} with server {url}.");
	Ok(())
}
