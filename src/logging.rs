use std::{fs::OpenOptions, panic, path::Path, sync::Mutex};
use tracing_journald::layer as journald_layer;
use tracing_panic::panic_hook;
use tracing_subscriber::{fmt, layer::SubscriberExt, registry::Registry, EnvFilter};

// journalctl -t kubestrap
pub fn init(log_file: &Path) {
	panic::set_hook(Box::new(panic_hook));
	let file_layer = OpenOptions::new()
		.create(true)
		.append(true)
		.open(log_file)
		.map_err(|err| eprintln!("log file {} not writable: {err}", log_file.display()))
		.ok()
		.map(|file| {
			fmt::layer()
				.with_ansi(false)
				.with_target(true)
				.with_timer(fmt::time::SystemTime)
				.with_writer(Mutex::new(file))
		});
	let log_sub = Registry::default()
		.with(
			EnvFilter::builder()
				.with_default_directive(tracing::Level::INFO.into())
				.from_env_lossy(),
		)
		.with(
			fmt::layer()
				.with_ansi(true)
				.with_file(true)
				.with_line_number(true)
				.with_target(true)
				.with_timer(fmt::time::SystemTime)
				.compact(),
		)
		.with(file_layer)
		.with(
			journald_layer()
				.map_err(|err| eprintln!("journald not available: {err}"))
				.ok()
				.map(|layr| layr.with_syslog_identifier("kubestrap".into())),
		);
	tracing::subscriber::set_global_default(log_sub).expect("Failed to set log subscriber.");
}
