//! Trial scheduler: Setup -> Running -> {Passed, Failed}
//! Draws operations by weight, applies them, and checks the invariant after every step

use dsc_fuzz_config::FuzzConfig;
use dsc_fuzz_core::{
  Account, AdapterFactory, InvariantViolation, Operation, ProtocolAdapter, ProtocolError, RejectionKind, RunResult,
  Sequence,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::catalog::{Applied, Catalog};
use crate::error::EngineError;
use crate::invariant::{check_invariants, Coverage};
use crate::model::ModelState;

/// Golden-ratio increment separating per-trial seeds
const TRIAL_SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Setup,
  Running,
  Passed,
  Failed,
}

/// Why a step ended the trial
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepFailure {
  Violation(InvariantViolation),
  Error(ProtocolError),
}

impl StepFailure {
  fn into_result(self, sequence: Sequence, step: usize) -> RunResult {
    match self {
      Self::Violation(violation) => RunResult::InvariantViolation { sequence, step, violation },
      Self::Error(error) => RunResult::ExecutionError { sequence, step, error },
    }
  }
}

/// One isolated fixture with its model and account pool
pub struct Trial<A> {
  adapter: A,
  model: ModelState,
  accounts: Vec<Account>,
  phase: Phase,
}

impl<A: ProtocolAdapter> Trial<A> {
  pub fn adapter(&self) -> &A {
    &self.adapter
  }

  pub fn model(&self) -> &ModelState {
    &self.model
  }

  pub fn accounts(&self) -> &[Account] {
    &self.accounts
  }

  pub fn phase(&self) -> Phase {
    self.phase
  }

  /// Apply one operation, then check the invariant and the model against the adapter
  pub fn execute(&mut self, catalog: &Catalog, operation: &Operation) -> Result<Applied, StepFailure> {
    let applied = catalog
      .apply(operation, &mut self.adapter, &mut self.model, &self.accounts)
      .map_err(StepFailure::Error)?;

    if applied == Applied::Skipped {
      return Ok(applied);
    }
    debug!(%operation, ?applied, "operation applied");

    match check_invariants(&self.adapter).map_err(StepFailure::Error)? {
      Coverage::Covered { .. } => {}
      Coverage::Violated(violation) => return Err(StepFailure::Violation(violation)),
    }

    self.verify_model(operation).map_err(StepFailure::Error)?;
    Ok(applied)
  }

  /// Supply and the acting account's balance must match the adapter exactly
  fn verify_model(&self, operation: &Operation) -> Result<(), ProtocolError> {
    let supply = self.adapter.total_supply()?;
    if supply != self.model.total_supply() {
      return Err(ProtocolError::new(
        RejectionKind::ModelDivergence,
        format!("model supply {} != protocol supply {supply}", self.model.total_supply()),
      ));
    }

    let Some(user) = operation.account().and_then(|index| self.accounts.get(index).copied()) else {
      return Ok(());
    };
    let asset = operation.asset();
    let actual = self.adapter.collateral_balance_of(user, asset)?;
    let recorded = self.model.balance_of(user, asset);
    if actual != recorded {
      return Err(ProtocolError::new(
        RejectionKind::ModelDivergence,
        format!("model balance {recorded} != protocol balance {actual} for {user} {asset}"),
      ));
    }
    Ok(())
  }

  fn finish(&mut self, result: &RunResult) {
    self.phase = if result.is_failure() { Phase::Failed } else { Phase::Passed };
  }
}

/// Result of the outer trial loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Campaign {
  pub trials_run: usize,
  /// First failing trial, or an aggregate pass over every trial
  pub outcome: RunResult,
}

pub struct Scheduler<'a, F> {
  config: &'a FuzzConfig,
  factory: &'a F,
  catalog: Catalog,
}

impl<'a, F: AdapterFactory> Scheduler<'a, F> {
  pub fn new(config: &'a FuzzConfig, factory: &'a F) -> Result<Self, EngineError> {
    let catalog = Catalog::new(config)?;
    Ok(Self { config, factory, catalog })
  }

  pub fn catalog(&self) -> &Catalog {
    &self.catalog
  }

  /// Deploy a fresh fixture, provision accounts and seed the model
  pub fn setup(&self) -> Result<Trial<F::Adapter>, EngineError> {
    let mut adapter = self.factory.fresh().map_err(EngineError::Setup)?;
    let accounts = adapter
      .provision_accounts(self.config.accounts)
      .map_err(EngineError::Setup)?;
    let model = ModelState::from_adapter(&adapter, &accounts).map_err(EngineError::Setup)?;

    if model.total_supply() != 0 {
      warn!(supply = model.total_supply(), "fixture starts with outstanding supply");
    }

    Ok(Trial {
      adapter,
      model,
      accounts,
      phase: Phase::Setup,
    })
  }

  /// Generate and run one trial from `seed`; stops at the first failure
  pub fn run_trial(&self, seed: u64) -> Result<RunResult, EngineError> {
    let mut trial = self.setup()?;
    trial.phase = Phase::Running;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut sequence = Sequence::new(seed);
    let mut skipped = 0;

    for _ in 0..self.config.steps_per_trial {
      let drawn = (0..self.config.max_draw_attempts)
        .find_map(|_| self.catalog.draw(&mut rng, &trial.model, &trial.accounts));

      let Some(operation) = drawn else {
        skipped += 1;
        continue;
      };

      sequence.push(operation);
      match trial.execute(&self.catalog, &operation) {
        Ok(Applied::Skipped) => skipped += 1,
        Ok(_) => {}
        Err(failure) => {
          let step = sequence.len() - 1;
          let result = failure.into_result(sequence, step);
          trial.finish(&result);
          return Ok(result);
        }
      }
    }

    let result = RunResult::Passed {
      steps: sequence.len(),
      skipped,
    };
    trial.finish(&result);
    Ok(result)
  }

  /// Re-execute a recorded sequence against a fresh fixture
  pub fn replay(&self, sequence: &Sequence) -> Result<RunResult, EngineError> {
    let mut trial = self.setup()?;
    trial.phase = Phase::Running;
    let mut skipped = 0;

    for (step, operation) in sequence.operations.iter().enumerate() {
      match trial.execute(&self.catalog, operation) {
        Ok(Applied::Skipped) => skipped += 1,
        Ok(_) => {}
        Err(failure) => {
          let result = failure.into_result(sequence.clone(), step);
          trial.finish(&result);
          return Ok(result);
        }
      }
    }

    let result = RunResult::Passed {
      steps: sequence.len(),
      skipped,
    };
    trial.finish(&result);
    Ok(result)
  }

  /// Run up to `config.trials` trials; the first failure stops the loop
  pub fn run(&self, base_seed: u64) -> Result<Campaign, EngineError> {
    let mut steps = 0;
    let mut skipped = 0;

    for index in 0..self.config.trials {
      let seed = trial_seed(base_seed, index);
      let result = self.run_trial(seed)?;

      match result {
        RunResult::Passed { steps: s, skipped: k } => {
          debug!(trial = index, seed, steps = s, skipped = k, "trial passed");
          steps += s;
          skipped += k;
        }
        failure => {
          warn!(trial = index, seed, step = ?failure.step(), "trial failed");
          return Ok(Campaign {
            trials_run: index + 1,
            outcome: failure,
          });
        }
      }
    }

    info!(trials = self.config.trials, steps, skipped, "all trials passed");
    Ok(Campaign {
      trials_run: self.config.trials,
      outcome: RunResult::Passed { steps, skipped },
    })
  }
}

pub fn trial_seed(base: u64, index: usize) -> u64 {
  base.wrapping_add((index as u64).wrapping_mul(TRIAL_SEED_STRIDE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trial_seeds_are_distinct_and_start_at_base() {
        assert_eq!(trial_seed(5, 0), 5);
        assert_ne!(trial_seed(5, 1), trial_seed(5, 2));
        assert_eq!(trial_seed(u64::MAX, 1), u64::MAX.wrapping_add(TRIAL_SEED_STRIDE));
    }

    #[test]
    fn step_failure_keeps_sequence_and_step() {
        let error = ProtocolError::new(RejectionKind::Other, "boom");
        let result = StepFailure::Error(error.clone()).into_result(Sequence::new(9), 4);
        assert_eq!(
            result,
            RunResult::ExecutionError { sequence: Sequence::new(9), step: 4, error }
        );
    }
}
