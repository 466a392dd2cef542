//! Counterexample minimization by replay
//! A candidate is accepted only if a fresh replay fails with the same signature

use dsc_fuzz_core::{
  AdapterFactory, CollateralAsset, FailureSignature, Operation, PriceMultiplier, RunResult, Sequence,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::EngineError;
use crate::scheduler::Scheduler;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShrinkOutcome {
  pub minimized: RunResult,
  pub replays: usize,
  pub accepted: usize,
}

/// Scalar parameter of an operation that can be moved toward a simpler value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scalar {
  Account,
  Asset,
  Amount,
  Percentage,
  Multiplier,
}

struct Best {
  sequence: Sequence,
  result: RunResult,
}

pub struct Shrinker<'s, 'a, F> {
  scheduler: &'s Scheduler<'a, F>,
  budget: usize,
  replays: usize,
  accepted: usize,
}

impl<'s, 'a, F: AdapterFactory> Shrinker<'s, 'a, F> {
  pub fn new(scheduler: &'s Scheduler<'a, F>, budget: usize) -> Self {
    Self {
      scheduler,
      budget,
      replays: 0,
      accepted: 0,
    }
  }

  /// Minimize `failure`; a passing result is returned untouched
  pub fn shrink(mut self, failure: RunResult) -> Result<ShrinkOutcome, EngineError> {
    let (Some(target), Some(sequence), Some(step)) =
      (failure.signature(), failure.sequence().cloned(), failure.step())
    else {
      return Ok(self.outcome(failure));
    };

    // (a) nothing after the failing step contributes
    let Some(mut best) = self.attempt(sequence.truncated(step + 1), &target)? else {
      warn!("failure did not reproduce on replay, leaving it unshrunk");
      return Ok(self.outcome(failure));
    };

    let mut round = 0;
    loop {
      round += 1;
      let before = self.accepted;

      self.remove_operations(&mut best, &target)?;
      self.simplify_scalars(&mut best, &target)?;

      info!(round, len = best.sequence.len(), replays = self.replays, "shrink round finished");
      if self.accepted == before || self.exhausted() {
        break;
      }
    }

    Ok(self.outcome(best.result))
  }

  /// (b) drop operations one at a time
  fn remove_operations(&mut self, best: &mut Best, target: &FailureSignature) -> Result<(), EngineError> {
    let mut index = 0;
    while index < best.sequence.len() && !self.exhausted() {
      match self.attempt(best.sequence.without(index), target)? {
        Some(smaller) => *best = smaller,
        None => index += 1,
      }
    }
    Ok(())
  }

  /// (c) binary-search each scalar toward its simplest value
  ///
  /// Walks from the failing step backwards, so later parameters shrink against the
  /// state the earlier operations built.
  fn simplify_scalars(&mut self, best: &mut Best, target: &FailureSignature) -> Result<(), EngineError> {
    for index in (0..best.sequence.len()).rev() {
      if self.exhausted() {
        break;
      }
      for (scalar, _, _) in scalars(&best.sequence.operations[index]) {
        if index >= best.sequence.len() {
          break;
        }
        self.search_scalar(best, index, scalar, target)?;
      }
    }
    Ok(())
  }

  fn search_scalar(
    &mut self,
    best: &mut Best,
    index: usize,
    scalar: Scalar,
    target: &FailureSignature,
  ) -> Result<(), EngineError> {
    let Some((_, current, simplest)) = scalars(&best.sequence.operations[index])
      .into_iter()
      .find(|(s, _, _)| *s == scalar)
    else {
      return Ok(());
    };

    // distance `low` has not reproduced, distance `high` has
    let mut low = 0u128;
    let mut high = current.abs_diff(simplest);

    while low < high && !self.exhausted() {
      let distance = if low == 0 && high > 1 { 0 } else { low + (high - low) / 2 };
      let value = if current >= simplest { simplest + distance } else { simplest - distance };

      let candidate = best
        .sequence
        .operations
        .get(index)
        .and_then(|op| with_scalar(*op, scalar, value));
      let Some(candidate) = candidate else {
        low = distance + 1;
        continue;
      };

      match self.attempt(best.sequence.with_operation(index, candidate), target)? {
        Some(simpler) => {
          debug!(index, ?scalar, value, "scalar simplified");
          *best = simpler;
          high = distance;
          if index >= best.sequence.len() {
            break;
          }
        }
        None => low = distance + 1,
      }
    }
    Ok(())
  }

  /// Replay a candidate; accept it when the failure signature matches
  fn attempt(&mut self, candidate: Sequence, target: &FailureSignature) -> Result<Option<Best>, EngineError> {
    if candidate.is_empty() || self.exhausted() {
      return Ok(None);
    }
    self.replays += 1;

    let result = self.scheduler.replay(&candidate)?;
    if result.signature().as_ref() != Some(target) {
      return Ok(None);
    }
    let Some(step) = result.step() else {
      return Ok(None);
    };

    self.accepted += 1;
    let sequence = candidate.truncated(step + 1);
    Ok(Some(Best {
      result: result.with_sequence(sequence.clone()),
      sequence,
    }))
  }

  fn exhausted(&self) -> bool {
    self.replays >= self.budget
  }

  fn outcome(&self, minimized: RunResult) -> ShrinkOutcome {
    ShrinkOutcome {
      minimized,
      replays: self.replays,
      // the confirming replay of the truncated prefix is not a reduction
      accepted: self.accepted.saturating_sub(1),
    }
  }
}

/// (scalar, current value, simplest value) for every shrinkable parameter
fn scalars(operation: &Operation) -> Vec<(Scalar, u128, u128)> {
  let neutral = PriceMultiplier::NEUTRAL.bps() as u128;
  let mut out = Vec::with_capacity(4);

  if let Some(account) = operation.account() {
    out.push((Scalar::Account, account as u128, 0));
  }
  out.push((Scalar::Asset, operation.asset().index() as u128, 0));

  match *operation {
    Operation::Deposit { amount, .. } | Operation::MintSynthetic { amount, .. } => {
      out.push((Scalar::Amount, amount, 1));
    }
    Operation::Redeem { percentage, .. } => out.push((Scalar::Percentage, percentage as u128, 1)),
    Operation::UpdatePrice { multiplier, .. } => {
      out.push((Scalar::Multiplier, multiplier.bps() as u128, neutral));
    }
    Operation::DepositAndUpdatePrice { amount, multiplier, .. } => {
      out.push((Scalar::Amount, amount, 1));
      out.push((Scalar::Multiplier, multiplier.bps() as u128, neutral));
    }
  }
  out
}

/// Copy of `operation` with one scalar replaced; `None` if the value is out of range
fn with_scalar(operation: Operation, scalar: Scalar, value: u128) -> Option<Operation> {
  let mut op = operation;
  match (scalar, &mut op) {
    (
      Scalar::Account,
      Operation::Deposit { account, .. }
      | Operation::Redeem { account, .. }
      | Operation::MintSynthetic { account, .. }
      | Operation::DepositAndUpdatePrice { account, .. },
    ) => *account = usize::try_from(value).ok()?,
    (
      Scalar::Asset,
      Operation::Deposit { asset, .. }
      | Operation::Redeem { asset, .. }
      | Operation::MintSynthetic { asset, .. }
      | Operation::UpdatePrice { asset, .. }
      | Operation::DepositAndUpdatePrice { asset, .. },
    ) => *asset = *CollateralAsset::ALL.get(usize::try_from(value).ok()?)?,
    (
      Scalar::Amount,
      Operation::Deposit { amount, .. }
      | Operation::MintSynthetic { amount, .. }
      | Operation::DepositAndUpdatePrice { amount, .. },
    ) => {
      if value == 0 {
        return None;
      }
      *amount = value;
    }
    (Scalar::Percentage, Operation::Redeem { percentage, .. }) => {
      let value = u8::try_from(value).ok()?;
      if !(1..=100).contains(&value) {
        return None;
      }
      *percentage = value;
    }
    (
      Scalar::Multiplier,
      Operation::UpdatePrice { multiplier, .. } | Operation::DepositAndUpdatePrice { multiplier, .. },
    ) => *multiplier = PriceMultiplier::from_bps(u32::try_from(value).ok()?)?,
    _ => return None,
  }
  Some(op)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_cover_every_parameter() {
        let op = Operation::DepositAndUpdatePrice {
            account: 3,
            asset: CollateralAsset::Wbtc,
            amount: 500,
            multiplier: PriceMultiplier::from_bps(3_000).unwrap(),
        };
        let found: Vec<Scalar> = scalars(&op).into_iter().map(|(s, _, _)| s).collect();
        assert_eq!(found, vec![Scalar::Account, Scalar::Asset, Scalar::Amount, Scalar::Multiplier]);

        let update = Operation::UpdatePrice {
            asset: CollateralAsset::Weth,
            multiplier: PriceMultiplier::from_bps(2_000).unwrap(),
        };
        assert_eq!(
            scalars(&update),
            vec![(Scalar::Asset, 0, 0), (Scalar::Multiplier, 2_000, 10_000)]
        );
    }

    #[test]
    fn with_scalar_rejects_out_of_range_values() {
        let redeem = Operation::Redeem { account: 0, asset: CollateralAsset::Weth, percentage: 40 };
        assert_eq!(with_scalar(redeem, Scalar::Percentage, 0), None);
        assert_eq!(with_scalar(redeem, Scalar::Percentage, 101), None);
        assert_eq!(with_scalar(redeem, Scalar::Amount, 5), None);
        assert_eq!(
            with_scalar(redeem, Scalar::Percentage, 1),
            Some(Operation::Redeem { account: 0, asset: CollateralAsset::Weth, percentage: 1 })
        );

        let update = Operation::UpdatePrice {
            asset: CollateralAsset::Wbtc,
            multiplier: PriceMultiplier::from_bps(2_000).unwrap(),
        };
        assert_eq!(with_scalar(update, Scalar::Multiplier, 1_999), None);
        assert_eq!(with_scalar(update, Scalar::Account, 0), None);
        assert_eq!(
            with_scalar(update, Scalar::Asset, 0),
            Some(Operation::UpdatePrice {
                asset: CollateralAsset::Weth,
                multiplier: PriceMultiplier::from_bps(2_000).unwrap(),
            })
        );
    }
}
