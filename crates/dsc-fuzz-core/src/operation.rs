//! Operations, sequences and trial outcomes
//! Operations are immutable once generated and are the unit of replay and shrinking

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::adapter::{ProtocolError, RejectionKind};
use crate::types::{Amount, CollateralAsset, PriceMultiplier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
  Deposit,
  Redeem,
  MintSynthetic,
  UpdatePrice,
  DepositAndUpdatePrice,
}

impl OperationKind {
  pub const ALL: [OperationKind; 5] = [
    OperationKind::Deposit,
    OperationKind::Redeem,
    OperationKind::MintSynthetic,
    OperationKind::UpdatePrice,
    OperationKind::DepositAndUpdatePrice,
  ];
}

/// One concrete protocol action; accounts are indices into the trial's account pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
  Deposit {
    account: usize,
    asset: CollateralAsset,
    amount: Amount,
  },
  /// Redeems `percentage` of the account's recorded balance, floor-divided
  Redeem {
    account: usize,
    asset: CollateralAsset,
    percentage: u8,
  },
  /// `asset` is the collateral topped up if the mint needs remediation
  MintSynthetic {
    account: usize,
    asset: CollateralAsset,
    amount: Amount,
  },
  UpdatePrice {
    asset: CollateralAsset,
    multiplier: PriceMultiplier,
  },
  DepositAndUpdatePrice {
    account: usize,
    asset: CollateralAsset,
    amount: Amount,
    multiplier: PriceMultiplier,
  },
}

impl Operation {
  pub fn kind(&self) -> OperationKind {
    match self {
      Self::Deposit { .. } => OperationKind::Deposit,
      Self::Redeem { .. } => OperationKind::Redeem,
      Self::MintSynthetic { .. } => OperationKind::MintSynthetic,
      Self::UpdatePrice { .. } => OperationKind::UpdatePrice,
      Self::DepositAndUpdatePrice { .. } => OperationKind::DepositAndUpdatePrice,
    }
  }

  pub fn account(&self) -> Option<usize> {
    match *self {
      Self::Deposit { account, .. }
      | Self::Redeem { account, .. }
      | Self::MintSynthetic { account, .. }
      | Self::DepositAndUpdatePrice { account, .. } => Some(account),
      Self::UpdatePrice { .. } => None,
    }
  }

  pub fn asset(&self) -> CollateralAsset {
    match *self {
      Self::Deposit { asset, .. }
      | Self::Redeem { asset, .. }
      | Self::MintSynthetic { asset, .. }
      | Self::UpdatePrice { asset, .. }
      | Self::DepositAndUpdatePrice { asset, .. } => asset,
    }
  }
}

impl fmt::Display for Operation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Deposit { account, asset, amount } => write!(f, "deposit(user={account}, {asset}, {amount})"),
      Self::Redeem { account, asset, percentage } => write!(f, "redeem(user={account}, {asset}, {percentage}%)"),
      Self::MintSynthetic { account, asset, amount } => write!(f, "mint(user={account}, {amount}, remedial={asset})"),
      Self::UpdatePrice { asset, multiplier } => write!(f, "update_price({asset}, {multiplier})"),
      Self::DepositAndUpdatePrice { account, asset, amount, multiplier } => {
        write!(f, "deposit_and_update_price(user={account}, {asset}, {amount}, {multiplier})")
      }
    }
  }
}

/// Ordered operations plus the seed that generated them
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Sequence {
  pub seed: u64,
  pub operations: Vec<Operation>,
}

impl Sequence {
  pub fn new(seed: u64) -> Self {
    Self { seed, operations: Vec::new() }
  }

  pub fn len(&self) -> usize {
    self.operations.len()
  }

  pub fn is_empty(&self) -> bool {
    self.operations.is_empty()
  }

  pub fn push(&mut self, operation: Operation) {
    self.operations.push(operation);
  }

  /// Copy keeping only the first `len` operations
  pub fn truncated(&self, len: usize) -> Self {
    Self {
      seed: self.seed,
      operations: self.operations.iter().take(len).copied().collect(),
    }
  }

  /// Copy with the operation at `index` removed
  pub fn without(&self, index: usize) -> Self {
    let mut operations = self.operations.clone();
    if index < operations.len() {
      operations.remove(index);
    }
    Self { seed: self.seed, operations }
  }

  /// Copy with the operation at `index` replaced
  pub fn with_operation(&self, index: usize, operation: Operation) -> Self {
    let mut operations = self.operations.clone();
    if let Some(slot) = operations.get_mut(index) {
      *slot = operation;
    }
    Self { seed: self.seed, operations }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Invariant {
  /// Σ(deposited collateral × oracle price) ≥ total synthetic supply
  CollateralCoversSupply,
}

impl fmt::Display for Invariant {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::CollateralCoversSupply => f.write_str("protocol_must_have_more_value_than_total_supply"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvariantViolation {
  pub invariant: Invariant,
  /// Aggregate collateral value in USD base units, floored for display
  pub collateral_value: Amount,
  pub total_supply: Amount,
}

impl fmt::Display for InvariantViolation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} violated: collateral value {} < total supply {}",
      self.invariant, self.collateral_value, self.total_supply
    )
  }
}

/// What a shrunk candidate must reproduce to be accepted
///
/// Rejections match on their kind only; reasons embed amounts and health factors
/// that legitimately change as parameters shrink.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureSignature {
  Invariant { invariant: Invariant },
  Rejection { kind: RejectionKind },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunResult {
  Passed {
    steps: usize,
    skipped: usize,
  },
  InvariantViolation {
    sequence: Sequence,
    step: usize,
    violation: InvariantViolation,
  },
  ExecutionError {
    sequence: Sequence,
    step: usize,
    error: ProtocolError,
  },
}

impl RunResult {
  pub fn is_failure(&self) -> bool {
    !matches!(self, Self::Passed { .. })
  }

  pub fn sequence(&self) -> Option<&Sequence> {
    match self {
      Self::Passed { .. } => None,
      Self::InvariantViolation { sequence, .. } | Self::ExecutionError { sequence, .. } => Some(sequence),
    }
  }

  /// Index of the failing operation
  pub fn step(&self) -> Option<usize> {
    match self {
      Self::Passed { .. } => None,
      Self::InvariantViolation { step, .. } | Self::ExecutionError { step, .. } => Some(*step),
    }
  }

  pub fn signature(&self) -> Option<FailureSignature> {
    match self {
      Self::Passed { .. } => None,
      Self::InvariantViolation { violation, .. } => Some(FailureSignature::Invariant {
        invariant: violation.invariant,
      }),
      Self::ExecutionError { error, .. } => Some(FailureSignature::Rejection { kind: error.kind }),
    }
  }

  /// Same failure with its sequence replaced
  pub fn with_sequence(self, replacement: Sequence) -> Self {
    match self {
      Self::Passed { .. } => self,
      Self::InvariantViolation { step, violation, .. } => Self::InvariantViolation {
        sequence: replacement,
        step,
        violation,
      },
      Self::ExecutionError { step, error, .. } => Self::ExecutionError {
        sequence: replacement,
        step,
        error,
      },
    }
  }
}
