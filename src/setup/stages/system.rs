use crate::context::RunContext;
use crate::error::SetupError;
use crate::setup::utils::pkg;
use crate::setup::{Stage, StageId};
use tracing::info;

pub struct SystemPackages;

impl SystemPackages {
	pub const PACKAGE_NAMES: &'static [&'static str] = &[
		"apt-transport-https",
		"ca-certificates",
		"curl",
		"gpg",
	];
}

impl Stage for SystemPackages {
	fn id(&self) -> StageId {
		StageId::SystemPackages
	}

	fn run(&self, _ctx: &RunContext) -> Result<(), SetupError> {
		info!("Refreshing apt metadata and installing base packages.");
		pkg::update()?;
		pkg::install(SystemPackages::PACKAGE_NAMES)?;
		info!("Base packages installed.");
		Ok(())
	}
}
