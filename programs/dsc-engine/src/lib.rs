//! DSC engine - an in-memory collateral-backed synthetic asset protocol
//! Users deposit whitelisted collateral, mint DSC against it and redeem collateral
//! as long as their health factor stays above the minimum

use std::collections::BTreeMap;

/// Return early with `$err` unless `$cond` holds
#[macro_export]
macro_rules! require {
  ($cond:expr, $err:expr $(,)?) => {
    if !($cond) {
      return Err($err.into());
    }
  };
}

pub mod constants;
pub mod math;
pub mod invariants;
pub mod state;
pub mod token;
pub mod oracle;
pub mod instructions;
pub mod error;
mod views;

pub use error::{DscError, Result};
pub use instructions::initialize::{CollateralParams, InitializeParams};
pub use state::Address;

use oracle::MockV3Aggregator;
use state::EngineState;
use token::MockToken;

#[derive(Debug, Clone)]
pub struct DscEngine {
  pub state: EngineState,
  tokens: BTreeMap<Address, MockToken>,
  price_feeds: BTreeMap<Address, MockV3Aggregator>,
}

impl DscEngine {
  /// Deploy the DSC token, collateral tokens, their price feeds and the engine
  pub fn initialize(params: InitializeParams) -> Result<Self> {
    instructions::initialize::handler(params)
  }

  /// Deposit whitelisted collateral previously approved to the engine
  pub fn deposit_collateral(&mut self, caller: Address, token: Address, amount: u128) -> Result<()> {
    instructions::deposit_collateral::handler(self, caller, token, amount)
  }

  /// Withdraw deposited collateral, keeping the caller's health factor intact
  pub fn redeem_collateral(&mut self, caller: Address, token: Address, amount: u128) -> Result<()> {
    instructions::redeem_collateral::handler(self, caller, token, amount)
  }

  /// Mint DSC against the caller's deposited collateral
  pub fn mint_dsc(&mut self, caller: Address, amount: u128) -> Result<()> {
    instructions::mint_dsc::handler(self, caller, amount)
  }
}
