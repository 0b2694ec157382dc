use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is unset or empty.
pub const DEFAULT_FILTER: &str = "docverify_cli=info";

/// Build the log filter from the value of `RUST_LOG`. The default applies
/// only when nothing was given, so any level set there for this crate wins.
pub fn filter(rust_log: Option<&str>) -> Result<EnvFilter> {
	match rust_log.map(str::trim).filter(|s| !s.is_empty()) {
		Some(directives) => EnvFilter::try_new(directives)
			.with_context(|| format!("invalid RUST_LOG directives: {directives}")),
		None => Ok(EnvFilter::try_new(DEFAULT_FILTER)?),
	}
}

/// Install the global subscriber. Logs go to stderr so command output on
/// stdout stays clean.
pub fn init() -> Result<()> {
	let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
	tracing_subscriber::fmt()
		.with_writer(std::io::stderr)
		.with_env_filter(filter(rust_log.as_deref())?)
		.init();
	Ok(())
}
