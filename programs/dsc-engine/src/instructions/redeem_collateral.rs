//! Redeem collateral instruction
//! Returns deposited collateral to the caller if their health factor survives

use tracing::debug;

use crate::error::{DscError, Result};
use crate::invariants::{assert_health_factor_not_broken, assert_more_than_zero};
use crate::math::health_factor;
use crate::state::Address;
use crate::DscEngine;

pub fn handler(engine: &mut DscEngine, caller: Address, token: Address, amount: u128) -> Result<()> {
  assert_more_than_zero(amount)?;
  require!(engine.state.is_allowed(token), DscError::TokenNotAllowed);

  let new_deposit = engine
    .state
    .deposited(caller, token)
    .checked_sub(amount)
    .ok_or(DscError::InsufficientCollateral)?;

  // Simulate post-state for the health check
  let collateral_value = engine.collateral_value_with(caller, Some((token, new_deposit)))?;
  let post_health_factor = health_factor(
    engine.state.dsc_minted(caller),
    collateral_value,
    engine.state.liquidation_threshold,
  );
  assert_health_factor_not_broken(post_health_factor)?;

  let engine_address = engine.address();
  engine.token_mut(token)?.transfer(engine_address, caller, amount)?;

  engine
    .state
    .user_to_token_to_amount_deposited
    .insert((caller, token), new_deposit);

  debug!(%caller, %token, amount, new_deposit, "collateral redeemed");
  Ok(())
}
