use crate::error::SetupError;
use std::io::{self, BufRead, Write};
use tracing::info;

/// Operator yes/no gate. The interactive implementation blocks on the
/// terminal; non-interactive implementations keep the stage machinery
/// deterministic under test and with `--yes`.
pub trait Confirmation {
	fn confirm(&self, prompt: &str) -> Result<bool, SetupError>;
}

pub struct Interactive;

impl Confirmation for Interactive {
	fn confirm(&self, prompt: &str) -> Result<bool, SetupError> {
		let stdin = io::stdin();
		let mut stdout = io::stdout();
		loop {
			write!(stdout, "{prompt} [y/n]: ")?;
			stdout.flush()?;
			let mut answer = String::new();
			if stdin.lock().read_line(&mut answer)? == 0 {
				// stdin closed, safest reading is a decline
				return Ok(false);
			}
			if let Some(accepted) = parse_answer(&answer) {
				return Ok(accepted);
			}
		}
	}
}

/// Used with `--yes`: every prompt is logged and accepted.
pub struct AssumeYes;

impl Confirmation for AssumeYes {
	fn confirm(&self, prompt: &str) -> Result<bool, SetupError> {
		info!("{prompt} -> assumed yes.");
		Ok(true)
	}
}

pub fn parse_answer(answer: &str) -> Option<bool> {
	match answer.trim().to_ascii_lowercase().as_str() {
		"y" | "yes" => Some(true),
		"n" | "no" => Some(false),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn answers_parse_case_insensitively() {
		assert_eq!(parse_answer("y\n"), Some(true));
		assert_eq!(parse_answer("YES"), Some(true));
		assert_eq!(parse_answer(" n "), Some(false));
		assert_eq!(parse_answer("No"), Some(false));
		assert_eq!(parse_answer("maybe"), None);
		assert_eq!(parse_answer(""), None);
	}

	#[test]
	fn assume_yes_accepts_everything() {
		assert!(AssumeYes.confirm("Proceed?").unwrap());
	}
}
