use crate::error::SetupError;
use sha2::{Digest, Sha256};
use std::{fs, io::Write, os::unix::fs::OpenOptionsExt, path::Path};

/// Whether the file at `path` already holds exactly `want`, compared by
/// SHA-256 digest.
pub fn content_matches(path: &Path, want: &str) -> bool {
	match fs::read(path) {
		Ok(have) => Sha256::digest(&have) == Sha256::digest(want.as_bytes()),
		Err(_) => false,
	}
}

/// Write `content` to `path` unless it is already current. Returns whether
/// a write happened. Parent directories are created as needed.
pub fn write_if_changed(path: &Path, content: &str) -> Result<bool, SetupError> {
	if content_matches(path, content) {
		return Ok(false);
	}
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent)?;
	}
	fs::write(path, content)?;
	Ok(true)
}

/// Write `content` to `path` with mode 0600, truncating any previous file.
pub fn write_private(path: &Path, content: &str) -> Result<(), SetupError> {
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent)?;
	}
	let mut file = fs::OpenOptions::new()
		.write(true)
		.create(true)
		.truncate(true)
		.mode(0o600)
		.open(path)?;
	file.write_all(content.as_bytes())?;
	Ok(())
}
