//! Mint DSC instruction - creates synthetic debt
//! The caller's post-mint health factor must stay above the minimum

use tracing::debug;

use crate::error::{DscError, Result};
use crate::invariants::{assert_health_factor_not_broken, assert_more_than_zero};
use crate::math::health_factor;
use crate::state::Address;
use crate::DscEngine;

pub fn handler(engine: &mut DscEngine, caller: Address, amount: u128) -> Result<()> {
  assert_more_than_zero(amount)?;

  let new_minted = engine
    .state
    .dsc_minted(caller)
    .checked_add(amount)
    .ok_or(DscError::MathOverflow)?;

  let collateral_value = engine.get_account_collateral_value(caller)?;
  let post_health_factor = health_factor(new_minted, collateral_value, engine.state.liquidation_threshold);

  debug!(%caller, amount, collateral_value, post_health_factor, "post-mint health factor");
  assert_health_factor_not_broken(post_health_factor)?;

  let dsc = engine.dsc();
  engine.token_mut(dsc)?.mint(caller, amount)?;
  engine.state.user_to_dsc_minted.insert(caller, new_minted);

  debug!(%caller, amount, new_minted, "dsc minted");
  Ok(())
}
