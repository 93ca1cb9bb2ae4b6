use crate::context::RunContext;
use crate::error::SetupError;
use crate::setup::utils::exec;
use crate::setup::{Stage, StageId};
use std::fs;
use tracing::info;

pub struct DisableSwap;

impl DisableSwap {
	pub const FSTAB_PATH: &'static str = "/etc/fstab";
}

/// Comment out every active swap entry, keeping the line so the operator
/// can restore it by hand.
fn comment_swap_entries(fstab: &str) -> String {
	let mut out = String::with_capacity(fstab.len());
	for line in fstab.lines() {
		let is_swap = !line.trim_start().starts_with('#')
			&& line
				.split_whitespace()
				.nth(2)
				.is_some_and(|fs_type| fs_type == "swap");
		if is_swap {
			out.push('#');
		}
		out.push_str(line);
		out.push('\n');
	}
	if !fstab.ends_with('\n') {
		out.pop();
	}
	out
}

impl Stage for DisableSwap {
	fn id(&self) -> StageId {
		StageId::SwapDisabled
	}

	fn run(&self, _ctx: &RunContext) -> Result<(), SetupError> {
		info!("Turning swap off.");
		exec::status("swapoff", &["-a"])?;
		let original = match fs::read_to_string(DisableSwap::FSTAB_PATH) {
			Ok(content) => content,
			Err(_) => {
				info!("fstab is missing or unreadable, nothing to persist.");
				return Ok(());
			}
		};
		let updated = comment_swap_entries(&original);
		if updated != original {
			info!("Commenting swap entries out of {}.", DisableSwap::FSTAB_PATH);
			fs::write(DisableSwap::FSTAB_PATH, updated)?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn swap_lines_are_commented_out() {
		let fstab = "UUID=abc / ext4 defaults 0 1\n/swapfile none swap sw 0 0\n";
		let expected = "UUID=abc / ext4 defaults 0 1\n#/swapfile none swap sw 0 0\n";
		assert_eq!(comment_swap_entries(fstab), expected);
	}

	#[test]
	fn already_commented_lines_are_untouched() {
		let fstab = "#/swapfile none swap sw 0 0\nUUID=abc / ext4 defaults 0 1\n";
		assert_eq!(comment_swap_entries(fstab), fstab);
	}

	#[test]
	fn fstab_without_swap_is_unchanged() {
		let fstab = "UUID=abc / ext4 defaults 0 1\nproc /proc proc defaults 0 0\n";
		assert_eq!(comment_swap_entries(fstab), fstab);
	}

	#[test]
	fn missing_trailing_newline_is_preserved() {
		let fstab = "UUID=abc / ext4 defaults 0 1";
		assert_eq!(comment_swap_entries(fstab), fstab);
	}
}
