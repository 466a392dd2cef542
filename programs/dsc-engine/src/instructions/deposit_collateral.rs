//! Deposit collateral instruction
//! Pulls approved collateral from the caller into the engine

use tracing::debug;

use crate::error::{DscError, Result};
use crate::invariants::assert_more_than_zero;
use crate::state::Address;
use crate::DscEngine;

pub fn handler(engine: &mut DscEngine, caller: Address, token: Address, amount: u128) -> Result<()> {
  assert_more_than_zero(amount)?;
  require!(engine.state.is_allowed(token), DscError::TokenNotAllowed);

  let new_deposit = engine
    .state
    .deposited(caller, token)
    .checked_add(amount)
    .ok_or(DscError::MathOverflow)?;

  // Transfer first: it is the only fallible step left
  let engine_address = engine.address();
  engine
    .token_mut(token)?
    .transfer_from(engine_address, caller, engine_address, amount)?;

  engine
    .state
    .user_to_token_to_amount_deposited
    .insert((caller, token), new_deposit);

  debug!(%caller, %token, amount, new_deposit, "collateral deposited");
  Ok(())
}
