//! Fuzzer configuration
//! Defaults mirror a 64 trial x 64 step campaign over 10 accounts

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_PREFIX: &str = "DSC_FUZZ_";

/// 1000 whole tokens with 18 decimals
pub const DEFAULT_MAX_DEPOSIT: u128 = 1_000 * 1_000_000_000_000_000_000;

/// Inclusive basis-point range update-price multipliers are drawn from
pub const MIN_MULTIPLIER_BPS: u32 = 2_000;
pub const MAX_MULTIPLIER_BPS: u32 = 11_500;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
  #[error("invalid value {value:?} for {key}")]
  Invalid { key: String, value: String },

  #[error("invalid configuration: {0}")]
  Validation(String),
}

/// Relative selection weights per operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationWeights {
  pub deposit: u32,
  pub redeem: u32,
  pub mint: u32,
  pub update_price: u32,
  pub composite: u32,
}

impl Default for OperationWeights {
  fn default() -> Self {
    Self { deposit: 1, redeem: 1, mint: 1, update_price: 1, composite: 1 }
  }
}

impl OperationWeights {
  pub fn total(&self) -> u64 {
    [self.deposit, self.redeem, self.mint, self.update_price, self.composite]
      .iter()
      .map(|w| *w as u64)
      .sum()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuzzConfig {
  pub trials: usize,
  pub steps_per_trial: usize,
  pub accounts: usize,
  pub max_deposit: u128,
  pub seed: Option<u64>,
  pub weights: OperationWeights,
  /// Fixed devaluation applied by the deposit-then-update-price operation
  pub composite_multiplier_bps: u32,
  /// Factor applied to the collateral equivalent before a remedial deposit
  ///
  /// With a 50% liquidation threshold a margin of 2 leaves the minter at a health
  /// factor of about 1, so any later redeem from that position is rejected. Larger
  /// margins leave headroom for redeems; 2 keeps positions at the edge where
  /// solvency bugs surface.
  pub remedial_margin: u128,
  /// Draws per step before the step is counted as skipped
  pub max_draw_attempts: usize,
  pub max_shrink_replays: usize,
}

impl Default for FuzzConfig {
  fn default() -> Self {
    Self {
      trials: 64,
      steps_per_trial: 64,
      accounts: 10,
      max_deposit: DEFAULT_MAX_DEPOSIT,
      seed: None,
      weights: OperationWeights::default(),
      composite_multiplier_bps: 3_000,
      remedial_margin: 2,
      max_draw_attempts: 16,
      max_shrink_replays: 1_024,
    }
  }
}

impl FuzzConfig {
  /// Load from the process environment, reading `.env` first when present
  pub fn from_env() -> Result<Self, ConfigError> {
    dotenvy::dotenv().ok();
    Self::from_lookup(|key| env::var(key).ok())
  }

  /// Build from an arbitrary key lookup; unset keys keep their defaults
  pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let mut config = Self::default();
    let get = |name: &str| {
      let key = format!("{ENV_PREFIX}{name}");
      lookup(&key).map(|value| (key, value))
    };

    if let Some(entry) = get("TRIALS") {
      config.trials = parse(entry)?;
    }
    if let Some(entry) = get("STEPS") {
      config.steps_per_trial = parse(entry)?;
    }
    if let Some(entry) = get("ACCOUNTS") {
      config.accounts = parse(entry)?;
    }
    if let Some(entry) = get("MAX_DEPOSIT") {
      config.max_deposit = parse(entry)?;
    }
    if let Some(entry) = get("SEED") {
      config.seed = Some(parse(entry)?);
    }
    if let Some(entry) = get("WEIGHT_DEPOSIT") {
      config.weights.deposit = parse(entry)?;
    }
    if let Some(entry) = get("WEIGHT_REDEEM") {
      config.weights.redeem = parse(entry)?;
    }
    if let Some(entry) = get("WEIGHT_MINT") {
      config.weights.mint = parse(entry)?;
    }
    if let Some(entry) = get("WEIGHT_UPDATE_PRICE") {
      config.weights.update_price = parse(entry)?;
    }
    if let Some(entry) = get("WEIGHT_COMPOSITE") {
      config.weights.composite = parse(entry)?;
    }
    if let Some(entry) = get("COMPOSITE_MULTIPLIER_BPS") {
      config.composite_multiplier_bps = parse(entry)?;
    }
    if let Some(entry) = get("REMEDIAL_MARGIN") {
      config.remedial_margin = parse(entry)?;
    }
    if let Some(entry) = get("MAX_DRAW_ATTEMPTS") {
      config.max_draw_attempts = parse(entry)?;
    }
    if let Some(entry) = get("MAX_SHRINK_REPLAYS") {
      config.max_shrink_replays = parse(entry)?;
    }

    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    let fail = |msg: &str| Err(ConfigError::Validation(msg.to_string()));

    if self.trials == 0 {
      return fail("trials must be at least 1");
    }
    if self.steps_per_trial == 0 {
      return fail("steps_per_trial must be at least 1");
    }
    if self.accounts == 0 {
      return fail("accounts must be at least 1");
    }
    if self.max_deposit == 0 {
      return fail("max_deposit must be at least 1");
    }
    if self.weights.total() == 0 {
      return fail("at least one operation weight must be non-zero");
    }
    if !(MIN_MULTIPLIER_BPS..=MAX_MULTIPLIER_BPS).contains(&self.composite_multiplier_bps) {
      return fail("composite_multiplier_bps must lie within the update-price range");
    }
    if self.remedial_margin == 0 {
      return fail("remedial_margin must be at least 1");
    }
    if self.max_draw_attempts == 0 {
      return fail("max_draw_attempts must be at least 1");
    }
    Ok(())
  }

  pub fn with_seed(mut self, seed: u64) -> Self {
    self.seed = Some(seed);
    self
  }

  pub fn with_trials(mut self, trials: usize) -> Self {
    self.trials = trials;
    self
  }

  pub fn with_steps(mut self, steps_per_trial: usize) -> Self {
    self.steps_per_trial = steps_per_trial;
    self
  }

  pub fn with_weights(mut self, weights: OperationWeights) -> Self {
    self.weights = weights;
    self
  }
}

fn parse<T: FromStr>((key, value): (String, String)) -> Result<T, ConfigError> {
  value
    .trim()
    .parse()
    .map_err(|_| ConfigError::Invalid { key, value })
}
