use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use voidvm::launcher;

fn main() -> ExitCode {
	let config = launcher::parse_args(std::env::args()).unwrap_or_else(|e| e.exit());

	let level = if config.debug { "debug" } else { "warn" };
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
	tracing_subscriber::fmt().with_env_filter(filter).init();

	launcher::run(config)
}
