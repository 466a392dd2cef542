//! Mock ERC20 token used for both collateral and the synthetic asset
//! Anyone may mint collateral for testing; the engine is the only minter of DSC

use std::collections::BTreeMap;

use crate::error::{DscError, Result};
use crate::state::Address;

#[derive(Debug, Clone)]
pub struct MockToken {
  pub symbol: String,
  pub decimals: u8,
  total_supply: u128,
  balances: BTreeMap<Address, u128>,
  allowances: BTreeMap<(Address, Address), u128>,
}

impl MockToken {
  pub fn new(symbol: impl Into<String>, decimals: u8) -> Self {
    Self {
      symbol: symbol.into(),
      decimals,
      total_supply: 0,
      balances: BTreeMap::new(),
      allowances: BTreeMap::new(),
    }
  }

  pub fn total_supply(&self) -> u128 {
    self.total_supply
  }

  pub fn balance_of(&self, holder: Address) -> u128 {
    self.balances.get(&holder).copied().unwrap_or(0)
  }

  pub fn allowance(&self, owner: Address, spender: Address) -> u128 {
    self.allowances.get(&(owner, spender)).copied().unwrap_or(0)
  }

  pub fn mint(&mut self, to: Address, amount: u128) -> Result<()> {
    require!(!to.is_zero(), DscError::ZeroAddress);

    let new_supply = self.total_supply.checked_add(amount).ok_or(DscError::MathOverflow)?;
    let new_balance = self.balance_of(to).checked_add(amount).ok_or(DscError::MathOverflow)?;

    self.total_supply = new_supply;
    self.balances.insert(to, new_balance);
    Ok(())
  }

  pub fn approve(&mut self, owner: Address, spender: Address, amount: u128) -> Result<()> {
    require!(!owner.is_zero() && !spender.is_zero(), DscError::ZeroAddress);
    self.allowances.insert((owner, spender), amount);
    Ok(())
  }

  pub fn transfer(&mut self, from: Address, to: Address, amount: u128) -> Result<()> {
    require!(!to.is_zero(), DscError::ZeroAddress);

    let from_balance = self.balance_of(from).checked_sub(amount).ok_or(DscError::InsufficientBalance)?;
    self.balances.insert(from, from_balance);

    let to_balance = self.balance_of(to).checked_add(amount).ok_or(DscError::MathOverflow)?;
    self.balances.insert(to, to_balance);
    Ok(())
  }

  /// Move `amount` from `from` to `to` on behalf of `spender`, consuming allowance
  pub fn transfer_from(
    &mut self,
    spender: Address,
    from: Address,
    to: Address,
    amount: u128,
  ) -> Result<()> {
    let remaining = self
      .allowance(from, spender)
      .checked_sub(amount)
      .ok_or(DscError::InsufficientAllowance)?;
    require!(self.balance_of(from) >= amount, DscError::InsufficientBalance);

    self.transfer(from, to, amount)?;
    self.allowances.insert((from, spender), remaining);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Address {
        Address::derive("alice", 0)
    }

    fn bob() -> Address {
        Address::derive("bob", 0)
    }

    #[test]
    fn mint_then_transfer_moves_balance() {
        let mut token = MockToken::new("WETH", 18);
        token.mint(alice(), 100).unwrap();
        token.transfer(alice(), bob(), 40).unwrap();

        assert_eq!(token.balance_of(alice()), 60);
        assert_eq!(token.balance_of(bob()), 40);
        assert_eq!(token.total_supply(), 100);
    }

    #[test]
    fn transfer_from_requires_allowance() {
        let mut token = MockToken::new("WETH", 18);
        token.mint(alice(), 100).unwrap();

        let err = token.transfer_from(bob(), alice(), bob(), 10).unwrap_err();
        assert_eq!(err, DscError::InsufficientAllowance);

        token.approve(alice(), bob(), 10).unwrap();
        token.transfer_from(bob(), alice(), bob(), 10).unwrap();
        assert_eq!(token.allowance(alice(), bob()), 0);
        assert_eq!(token.balance_of(bob()), 10);
    }

    #[test]
    fn transfer_from_fails_without_balance_and_keeps_allowance() {
        let mut token = MockToken::new("WBTC", 18);
        token.approve(alice(), bob(), 50).unwrap();

        let err = token.transfer_from(bob(), alice(), bob(), 50).unwrap_err();
        assert_eq!(err, DscError::InsufficientBalance);
        assert_eq!(token.allowance(alice(), bob()), 50);
    }

    #[test]
    fn mint_to_zero_address_is_rejected() {
        let mut token = MockToken::new("DSC", 18);
        assert_eq!(token.mint(Address::ZERO, 1).unwrap_err(), DscError::ZeroAddress);
    }
}
