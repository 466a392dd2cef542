//! The engine's projection of protocol state
//! Updated only after an operation has been applied successfully; no I/O

use std::collections::BTreeMap;

use dsc_fuzz_core::{Account, Amount, CollateralAsset, Price, ProtocolAdapter, ProtocolError, RejectionKind};
use thiserror::Error;

use crate::invariant::collateral_value;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
  #[error("redeeming {amount} {asset} from {account} exceeds the recorded balance {balance}")]
  Underflow {
    account: Account,
    asset: CollateralAsset,
    balance: Amount,
    amount: Amount,
  },

  #[error("model arithmetic overflow while recording {0}")]
  Overflow(&'static str),
}

impl From<ModelError> for ProtocolError {
  fn from(error: ModelError) -> Self {
    let kind = match error {
      ModelError::Underflow { .. } => RejectionKind::ModelDivergence,
      ModelError::Overflow(_) => RejectionKind::Arithmetic,
    };
    ProtocolError::new(kind, error.to_string())
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelState {
  balances: BTreeMap<(Account, CollateralAsset), Amount>,
  prices: BTreeMap<CollateralAsset, Price>,
  supply: Amount,
}

impl ModelState {
  pub fn new() -> Self {
    Self::default()
  }

  /// Seed the model from the adapter's view of a freshly deployed fixture
  pub fn from_adapter<A: ProtocolAdapter>(adapter: &A, accounts: &[Account]) -> Result<Self, ProtocolError> {
    let mut model = Self::new();
    for asset in CollateralAsset::ALL {
      let price = adapter.current_price(adapter.price_feed_of(asset)?)?;
      model.record_price(asset, price);

      for account in accounts {
        let balance = adapter.collateral_balance_of(*account, asset)?;
        if balance > 0 {
          model.balances.insert((*account, asset), balance);
        }
      }
    }
    model.supply = adapter.total_supply()?;
    Ok(model)
  }

  pub fn balance_of(&self, account: Account, asset: CollateralAsset) -> Amount {
    self.balances.get(&(account, asset)).copied().unwrap_or(0)
  }

  /// Last price the engine pushed or observed; may be stale relative to the oracle
  pub fn price_of(&self, asset: CollateralAsset) -> Option<Price> {
    self.prices.get(&asset).copied()
  }

  pub fn total_supply(&self) -> Amount {
    self.supply
  }

  pub fn record_deposit(&mut self, account: Account, asset: CollateralAsset, amount: Amount) -> Result<(), ModelError> {
    let balance = self
      .balance_of(account, asset)
      .checked_add(amount)
      .ok_or(ModelError::Overflow("deposit"))?;
    self.balances.insert((account, asset), balance);
    Ok(())
  }

  pub fn record_redeem(&mut self, account: Account, asset: CollateralAsset, amount: Amount) -> Result<(), ModelError> {
    let balance = self.balance_of(account, asset);
    let remaining = balance.checked_sub(amount).ok_or(ModelError::Underflow {
      account,
      asset,
      balance,
      amount,
    })?;
    self.balances.insert((account, asset), remaining);
    Ok(())
  }

  pub fn record_mint(&mut self, amount: Amount) -> Result<(), ModelError> {
    self.supply = self.supply.checked_add(amount).ok_or(ModelError::Overflow("mint"))?;
    Ok(())
  }

  pub fn record_price(&mut self, asset: CollateralAsset, price: Price) {
    self.prices.insert(asset, price);
  }

  /// `balance * percentage / 100`, floor-divided; never exceeds the balance
  pub fn redeemable(&self, account: Account, asset: CollateralAsset, percentage: u8) -> Amount {
    let balance = self.balance_of(account, asset);
    let percentage = percentage.min(100) as u128;
    (balance / 100) * percentage + (balance % 100) * percentage / 100
  }

  /// USD value of everything deposited in `asset` at the model's last known price
  pub fn aggregate_value(&self, asset: CollateralAsset) -> Option<Amount> {
    let price = self.price_of(asset)?;
    let deposited = self
      .balances
      .iter()
      .filter(|((_, a), _)| *a == asset)
      .try_fold(0u128, |sum, (_, balance)| sum.checked_add(*balance))?;
    collateral_value(&[(deposited, price)])
  }
}
