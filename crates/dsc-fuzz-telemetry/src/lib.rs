//! Tracing setup shared by fuzzer binaries and tests

use anyhow::Context;
use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to `default_directive`
///
/// Events go to stderr; stdout is reserved for the report.
///
/// Calling this again after a subscriber is installed is a no-op.
pub fn init(default_directive: &str) -> anyhow::Result<()> {
  let filter = match EnvFilter::try_from_default_env() {
    Ok(filter) => filter,
    Err(_) => EnvFilter::try_new(default_directive)
      .with_context(|| format!("invalid tracing directive {default_directive:?}"))?,
  };

  if tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(true)
    .with_writer(std::io::stderr)
    .try_init()
    .is_err()
  {
    tracing::debug!("tracing subscriber already installed");
  }
  Ok(())
}
