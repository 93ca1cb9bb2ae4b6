use crate::error::SetupError;
use std::{fs, io, path::Path, path::PathBuf};

/// Durable single-value marker store: the name of the last completed stage,
/// one plain-text file per role. Last write wins; there is no locking, one
/// provisioning run per host is assumed.
pub struct ProgressStore {
	path: PathBuf,
}

impl ProgressStore {
	pub fn new(path: PathBuf) -> Self {
		ProgressStore { path }
	}

	pub fn for_role(state_dir: &Path, role_slug: &str) -> Self {
		ProgressStore::new(state_dir.join(format!("{role_slug}.stage")))
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// The persisted marker, `None` when the file is absent or empty.
	pub fn read(&self) -> Result<Option<String>, SetupError> {
		match fs::read_to_string(&self.path) {
			Ok(content) => {
				let marker = content.trim();
				if marker.is_empty() {
					Ok(None)
				} else {
					Ok(Some(marker.to_owned()))
				}
			}
			Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
			Err(err) => Err(err.into()),
		}
	}

	pub fn write(&self, stage_name: &str) -> Result<(), SetupError> {
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent)?;
		}
		fs::write(&self.path, format!("{stage_name}\n"))?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn read_of_absent_marker_is_none() {
		let dir = tempfile::tempdir().unwrap();
		let store = ProgressStore::for_role(dir.path(), "master");
		assert_eq!(store.read().unwrap(), None);
	}

	#[test]
	fn round_trip_survives_reopening() {
		let dir = tempfile::tempdir().unwrap();
		{
			let store = ProgressStore::for_role(dir.path(), "worker");
			store.write("swap_disabled").unwrap();
		}
		// Fresh handle simulates a process restart.
		let store = ProgressStore::for_role(dir.path(), "worker");
		assert_eq!(store.read().unwrap().as_deref(), Some("swap_disabled"));
	}

	#[test]
	fn later_writes_overwrite_earlier_ones() {
		let dir = tempfile::tempdir().unwrap();
		let store = ProgressStore::for_role(dir.path(), "master");
		store.write("swap_disabled").unwrap();
		store.write("kernel_modules").unwrap();
		assert_eq!(store.read().unwrap().as_deref(), Some("kernel_modules"));
	}

	#[test]
	fn whitespace_only_marker_reads_as_none() {
		let dir = tempfile::tempdir().unwrap();
		let store = ProgressStore::for_role(dir.path(), "master");
		fs::write(store.path(), "  \n").unwrap();
		assert_eq!(store.read().unwrap(), None);
	}
}
