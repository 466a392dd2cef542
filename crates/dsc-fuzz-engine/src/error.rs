use dsc_fuzz_config::ConfigError;
use dsc_fuzz_core::ProtocolError;
use thiserror::Error;

/// Failures that prevent a trial from running at all
#[derive(Debug, Error)]
pub enum EngineError {
  #[error("fixture setup failed: {0}")]
  Setup(#[source] ProtocolError),

  #[error(transparent)]
  Config(#[from] ConfigError),
}
