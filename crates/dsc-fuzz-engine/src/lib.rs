//! Stateful randomized solvency fuzzer
//! Drives a protocol adapter through weighted operation sequences, checks collateral coverage
//! after every step and shrinks failing sequences to a minimal reproducer

pub mod catalog;
pub mod error;
pub mod invariant;
pub mod model;
pub mod scheduler;
pub mod shrink;

pub use catalog::{Applied, Catalog};
pub use error::EngineError;
pub use invariant::{assert_collateral_covers_supply, check_invariants, collateral_value, Coverage};
pub use model::{ModelError, ModelState};
pub use scheduler::{trial_seed, Campaign, Phase, Scheduler, StepFailure, Trial};
pub use shrink::{ShrinkOutcome, Shrinker};

use dsc_fuzz_config::FuzzConfig;
use dsc_fuzz_core::{AdapterFactory, RunResult, Sequence};
use serde::Serialize;
use tracing::{info, warn};

/// Everything a campaign produced, ready for the reporting boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FuzzReport {
  pub config: FuzzConfig,
  pub seed: u64,
  pub trials_run: usize,
  pub outcome: RunResult,
  pub shrunk: Option<RunResult>,
  pub shrink_replays: usize,
}

impl FuzzReport {
  pub fn is_failure(&self) -> bool {
    self.outcome.is_failure()
  }

  /// The smallest known reproducer, if the campaign failed
  pub fn counterexample(&self) -> Option<&Sequence> {
    self.shrunk.as_ref().unwrap_or(&self.outcome).sequence()
  }
}

pub struct Fuzzer<F> {
  config: FuzzConfig,
  factory: F,
}

impl<F: AdapterFactory> Fuzzer<F> {
  pub fn new(config: FuzzConfig, factory: F) -> Result<Self, EngineError> {
    config.validate()?;
    Ok(Self { config, factory })
  }

  pub fn config(&self) -> &FuzzConfig {
    &self.config
  }

  fn scheduler(&self) -> Result<Scheduler<'_, F>, EngineError> {
    Scheduler::new(&self.config, &self.factory)
  }

  /// Run with the configured seed, or a random one when none is set
  pub fn run(&self) -> Result<FuzzReport, EngineError> {
    let seed = self.config.seed.unwrap_or_else(rand::random);
    self.run_with_seed(seed)
  }

  pub fn run_with_seed(&self, seed: u64) -> Result<FuzzReport, EngineError> {
    let scheduler = self.scheduler()?;
    info!(seed, trials = self.config.trials, steps = self.config.steps_per_trial, "starting campaign");

    let campaign = scheduler.run(seed)?;
    let (shrunk, shrink_replays) = if campaign.outcome.is_failure() {
      let outcome = Shrinker::new(&scheduler, self.config.max_shrink_replays).shrink(campaign.outcome.clone())?;
      warn!(
        original = campaign.outcome.sequence().map_or(0, Sequence::len),
        minimized = outcome.minimized.sequence().map_or(0, Sequence::len),
        replays = outcome.replays,
        "failure minimized"
      );
      (Some(outcome.minimized), outcome.replays)
    } else {
      (None, 0)
    };

    Ok(FuzzReport {
      config: self.config.clone(),
      seed,
      trials_run: campaign.trials_run,
      outcome: campaign.outcome,
      shrunk,
      shrink_replays,
    })
  }

  /// Re-execute a recorded sequence against a fresh fixture
  pub fn replay(&self, sequence: &Sequence) -> Result<RunResult, EngineError> {
    self.scheduler()?.replay(sequence)
  }

  pub fn shrink(&self, failure: RunResult) -> Result<ShrinkOutcome, EngineError> {
    let scheduler = self.scheduler()?;
    Shrinker::new(&scheduler, self.config.max_shrink_replays).shrink(failure)
  }
}
