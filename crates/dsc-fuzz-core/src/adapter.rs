//! Collaborator interfaces the fuzzer drives
//! Every call is synchronous: it completes or fails before the next one is issued

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Account, Amount, CollateralAsset, OracleRef, Price};

/// Machine-readable rejection class returned at the adapter boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
  /// Health factor broken or not improved; resolvable by adding collateral
  HealthFactor,
  ZeroAmount,
  UnsupportedAsset,
  InsufficientCollateral,
  InsufficientBalance,
  InsufficientAllowance,
  InvalidPrice,
  Arithmetic,
  /// The engine's model disagrees with the protocol's authoritative state
  ModelDivergence,
  Other,
}

impl RejectionKind {
  pub fn is_recoverable(self) -> bool {
    matches!(self, Self::HealthFactor)
  }
}

impl fmt::Display for RejectionKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::HealthFactor => "health-factor",
      Self::ZeroAmount => "zero-amount",
      Self::UnsupportedAsset => "unsupported-asset",
      Self::InsufficientCollateral => "insufficient-collateral",
      Self::InsufficientBalance => "insufficient-balance",
      Self::InsufficientAllowance => "insufficient-allowance",
      Self::InvalidPrice => "invalid-price",
      Self::Arithmetic => "arithmetic",
      Self::ModelDivergence => "model-divergence",
      Self::Other => "other",
    };
    f.write_str(name)
  }
}

/// Rejection raised by the protocol; `kind` drives dispatch, `reason` is diagnostic only
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
#[error("{kind}: {reason}")]
pub struct ProtocolError {
  pub kind: RejectionKind,
  pub reason: String,
}

impl ProtocolError {
  pub fn new(kind: RejectionKind, reason: impl Into<String>) -> Self {
    Self { kind, reason: reason.into() }
  }
}

/// The collateral-backed synthetic-asset protocol under test
pub trait Protocol {
  /// Address the protocol holds deposited collateral under
  fn address(&self) -> Account;

  fn deposit_collateral(&mut self, caller: Account, asset: CollateralAsset, amount: Amount) -> Result<(), ProtocolError>;

  fn redeem_collateral(&mut self, caller: Account, asset: CollateralAsset, amount: Amount) -> Result<(), ProtocolError>;

  fn mint_synthetic(&mut self, caller: Account, amount: Amount) -> Result<(), ProtocolError>;

  fn collateral_balance_of(&self, account: Account, asset: CollateralAsset) -> Result<Amount, ProtocolError>;

  /// Token amount worth `value` USD at the current oracle price
  fn token_amount_from_value(&self, asset: CollateralAsset, value: Amount) -> Result<Amount, ProtocolError>;

  fn usd_value(&self, asset: CollateralAsset, amount: Amount) -> Result<Amount, ProtocolError>;

  fn price_feed_of(&self, asset: CollateralAsset) -> Result<OracleRef, ProtocolError>;

  /// Total issued supply of the synthetic asset
  fn total_supply(&self) -> Result<Amount, ProtocolError>;
}

pub trait PriceOracle {
  fn current_price(&self, oracle: OracleRef) -> Result<Price, ProtocolError>;

  fn set_price(&mut self, oracle: OracleRef, price: Price) -> Result<(), ProtocolError>;
}

pub trait CollateralToken {
  /// Mint test collateral straight to `to`
  fn mint_test_tokens(&mut self, to: Account, asset: CollateralAsset, amount: Amount) -> Result<(), ProtocolError>;

  fn approve(&mut self, owner: Account, asset: CollateralAsset, spender: Account, amount: Amount) -> Result<(), ProtocolError>;

  fn balance_of(&self, asset: CollateralAsset, holder: Account) -> Result<Amount, ProtocolError>;
}

/// Everything a trial needs from one deployed fixture
pub trait ProtocolAdapter: Protocol + PriceOracle + CollateralToken {
  /// Create `count` distinct funded test accounts
  fn provision_accounts(&mut self, count: usize) -> Result<Vec<Account>, ProtocolError>;
}

/// Produces an isolated, freshly deployed fixture for every trial and replay
pub trait AdapterFactory {
  type Adapter: ProtocolAdapter;

  fn fresh(&self) -> Result<Self::Adapter, ProtocolError>;
}
