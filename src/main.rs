mod cli;
mod context;
mod error;
mod logging;
mod setup;

use clap::Parser;
use context::RunContext;
use setup::confirm::{AssumeYes, Confirmation, Interactive};
use std::process;
use tracing::{error, info};

fn main() {
	let cli = cli::Cli::parse();
	logging::init(&cli.log_file);
	info!("kubestrap started.");
	process::exit(run(&cli.command));
}

fn run(command: &cli::Command) -> i32 {
	let ctx = match command {
		cli::Command::Master(args) => RunContext::for_master(args),
		cli::Command::Worker(args) => RunContext::for_worker(args),
		cli::Command::SshAccess(args) => RunContext::for_ssh_access(args),
		cli::Command::RemoteKubeconfig(args) => {
			return match setup::kubeconfig::generate(&args.server, &args.output) {
				Ok(()) => 0,
				Err(err) => {
					error!("Kubeconfig generation failed: {err}");
					err.exit_code()
				}
			}
		}
	};
	let ctx = match ctx {
		Ok(ctx) => ctx,
		Err(err) => {
			error!("Invalid invocation: {err}");
			return err.exit_code();
		}
	};
	let confirm: Box<dyn Confirmation> = if ctx.assume_yes {
		Box::new(AssumeYes)
	} else {
		Box::new(Interactive)
	};
	setup::run(&ctx, confirm.as_ref())
}
