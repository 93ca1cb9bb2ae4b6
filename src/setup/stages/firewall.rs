use crate::context::{NodeRole, RunContext};
use crate::error::SetupError;
use crate::setup::utils::exec;
use crate::setup::{Stage, StageId};
use tracing::info;

#[derive(Debug, Clone)]
pub struct FirewallRule {
	port: &'static str,
	protocol: &'static str,
	comment: &'static str,
}

const MASTER_RULES: &[FirewallRule] = &[
	FirewallRule {
		port: "6443",
		protocol: "tcp",
		comment: "kube-apiserver",
	},
	FirewallRule {
		port: "2379:2380",
		protocol: "tcp",
		comment: "etcd",
	},
	FirewallRule {
		port: "10250",
		protocol: "tcp",
		comment: "kubelet",
	},
	FirewallRule {
		port: "10257",
		protocol: "tcp",
		comment: "controller-manager",
	},
	FirewallRule {
		port: "10259",
		protocol: "tcp",
		comment: "scheduler",
	},
	FirewallRule {
		port: "8472",
		protocol: "udp",
		comment: "flannel vxlan",
	},
];

const WORKER_RULES: &[FirewallRule] = &[
	FirewallRule {
		port: "10250",
		protocol: "tcp",
		comment: "kubelet",
	},
	FirewallRule {
		port: "10256",
		protocol: "tcp",
		comment: "kube-proxy",
	},
	FirewallRule {
		port: "30000:32767",
		protocol: "tcp",
		comment: "nodeport services",
	},
	FirewallRule {
		port: "8472",
		protocol: "udp",
		comment: "flannel vxlan",
	},
];

fn allow(rule: &FirewallRule) -> Result<(), SetupError> {
	exec::status(
		"ufw",
		&[
			"allow",
			&format!("{}/{}", rule.port, rule.protocol),
			"comment",
			rule.comment,
		],
	)
}

pub struct Firewall;

impl Firewall {
	pub fn rules(role: NodeRole) -> &'static [FirewallRule] {
		match role {
			NodeRole::Worker => WORKER_RULES,
			_ => MASTER_RULES,
		}
	}
}

impl Stage for Firewall {
	fn id(&self) -> StageId {
		StageId::FirewallConfigured
	}

	fn run(&self, ctx: &RunContext) -> Result<(), SetupError> {
		let rules = Firewall::rules(ctx.role);
		info!("Opening {} firewall ports for {}.", rules.len(), ctx.role.slug());
		for rule in rules {
			allow(rule)?;
		}
		exec::status("ufw", &["reload"])?;
		Ok(())
	}
}

/// SSH gets `ufw limit` rather than a plain allow, which rate-limits
/// brute-force attempts at the firewall.
pub struct SshFirewall;

impl Stage for SshFirewall {
	fn id(&self) -> StageId {
		StageId::SshFirewall
	}

	fn run(&self, ctx: &RunContext) -> Result<(), SetupError> {
		info!("Rate-limiting SSH on port {}.", ctx.ssh_port);
		exec::status(
			"ufw",
			&[
				"limit",
				&format!("{}/tcp", ctx.ssh_port),
				"comment",
				"ssh",
			],
		)?;
		exec::status("ufw", &["reload"])?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn master_rules_cover_the_api_server() {
		assert!(Firewall::rules(NodeRole::Master)
			.iter()
			.any(|rule| rule.port == "6443" && rule.protocol == "tcp"));
	}

	#[test]
	fn worker_rules_cover_the_nodeport_range() {
		assert!(Firewall::rules(NodeRole::Worker)
			.iter()
			.any(|rule| rule.port == "30000:32767"));
	}
}
