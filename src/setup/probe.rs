use crate::context::ControlPlaneEndpoint;
use crate::error::SetupError;
use crate::setup::confirm::Confirmation;
use crate::setup::utils::exec;
use std::{
	net::{TcpStream, ToSocketAddrs},
	time::Duration,
};
use tracing::{info, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy)]
pub struct ProbeOutcome {
	pub ping_ok: bool,
	pub port_ok: bool,
}

impl ProbeOutcome {
	pub fn reachable(self) -> bool {
		self.ping_ok && self.port_ok
	}
}

pub fn probe(endpoint: &ControlPlaneEndpoint) -> ProbeOutcome {
	let ping_ok = exec::check("ping", &["-c", "1", "-W", "2", &endpoint.host]);
	let port_ok = tcp_port_open(&endpoint.host, endpoint.port);
	ProbeOutcome { ping_ok, port_ok }
}

pub fn tcp_port_open(host: &str, port: u16) -> bool {
	(host, port)
		.to_socket_addrs()
		.ok()
		.and_then(|mut addrs| addrs.next())
		.map(|addr| TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT).is_ok())
		.unwrap_or(false)
}

/// Advisory reachability gate run on the worker before any stage. Returns
/// whether the run should proceed; a decline is an operator stop, not a
/// failure.
pub fn gate(
	endpoint: &ControlPlaneEndpoint,
	confirm: &dyn Confirmation,
) -> Result<bool, SetupError> {
	let outcome = probe(endpoint);
	evaluate(endpoint, outcome, confirm)
}

fn evaluate(
	endpoint: &ControlPlaneEndpoint,
	outcome: ProbeOutcome,
	confirm: &dyn Confirmation,
) -> Result<bool, SetupError> {
	if outcome.reachable() {
		info!(
			"Control plane {}:{} is reachable.",
			endpoint.host, endpoint.port
		);
		return Ok(true);
	}
	if !outcome.ping_ok {
		warn!("Control plane host {} does not answer ping.", endpoint.host);
	}
	if !outcome.port_ok {
		warn!(
			"API server port {}:{} is not accepting connections.",
			endpoint.host, endpoint.port
		);
	}
	confirm.confirm(&format!(
		"Control plane {}:{} looks unreachable. Continue anyway?",
		endpoint.host, endpoint.port
	))
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::net::TcpListener;

	struct Decline;

	impl Confirmation for Decline {
		fn confirm(&self, _prompt: &str) -> Result<bool, SetupError> {
			Ok(false)
		}
	}

	struct Accept;

	impl Confirmation for Accept {
		fn confirm(&self, _prompt: &str) -> Result<bool, SetupError> {
			Ok(true)
		}
	}

	fn endpoint() -> ControlPlaneEndpoint {
		ControlPlaneEndpoint {
			host: "127.0.0.1".to_owned(),
			port: 6443,
		}
	}

	#[test]
	fn open_port_is_detected() {
		let listener = TcpListener::bind("127.0.0.1:0").unwrap();
		let port = listener.local_addr().unwrap().port();
		assert!(tcp_port_open("127.0.0.1", port));
	}

	#[test]
	fn closed_port_is_detected() {
		let listener = TcpListener::bind("127.0.0.1:0").unwrap();
		let port = listener.local_addr().unwrap().port();
		drop(listener);
		assert!(!tcp_port_open("127.0.0.1", port));
	}

	#[test]
	fn reachable_outcome_never_prompts() {
		let outcome = ProbeOutcome {
			ping_ok: true,
			port_ok: true,
		};
		assert!(evaluate(&endpoint(), outcome, &Decline).unwrap());
	}

	#[test]
	fn unreachable_outcome_with_accept_proceeds() {
		let outcome = ProbeOutcome {
			ping_ok: false,
			port_ok: false,
		};
		assert!(evaluate(&endpoint(), outcome, &Accept).unwrap());
	}

	#[test]
	fn unreachable_outcome_with_decline_stops() {
		let outcome = ProbeOutcome {
			ping_ok: true,
			port_ok: false,
		};
		assert!(!evaluate(&endpoint(), outcome, &Decline).unwrap());
	}
}
