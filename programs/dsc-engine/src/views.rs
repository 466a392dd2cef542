//! Read-only queries over engine, token and price feed state

use crate::error::{DscError, Result};
use crate::math::{health_factor, token_amount_from_usd, usd_value};
use crate::oracle::MockV3Aggregator;
use crate::state::Address;
use crate::token::MockToken;
use crate::DscEngine;

impl DscEngine {
  pub fn address(&self) -> Address {
    self.state.address
  }

  pub fn dsc(&self) -> Address {
    self.state.dsc
  }

  pub fn collateral_tokens(&self) -> &[Address] {
    &self.state.collateral_tokens
  }

  pub fn token(&self, token: Address) -> Result<&MockToken> {
    self.tokens.get(&token).ok_or(DscError::UnknownToken)
  }

  pub fn token_mut(&mut self, token: Address) -> Result<&mut MockToken> {
    self.tokens.get_mut(&token).ok_or(DscError::UnknownToken)
  }

  pub fn price_feed(&self, feed: Address) -> Result<&MockV3Aggregator> {
    self.price_feeds.get(&feed).ok_or(DscError::UnknownPriceFeed)
  }

  pub fn price_feed_mut(&mut self, feed: Address) -> Result<&mut MockV3Aggregator> {
    self.price_feeds.get_mut(&feed).ok_or(DscError::UnknownPriceFeed)
  }

  pub fn token_to_price_feed(&self, token: Address) -> Result<Address> {
    self
      .state
      .token_to_price_feed
      .get(&token)
      .copied()
      .ok_or(DscError::TokenNotAllowed)
  }

  pub fn get_collateral_balance_of_user(&self, user: Address, token: Address) -> u128 {
    self.state.deposited(user, token)
  }

  pub fn get_dsc_minted(&self, user: Address) -> u128 {
    self.state.dsc_minted(user)
  }

  pub fn get_usd_value(&self, token: Address, amount: u128) -> Result<u128> {
    let price = self.latest_price(token)?;
    usd_value(amount, price).ok_or(DscError::MathOverflow)
  }

  pub fn get_token_amount_from_usd(&self, token: Address, usd_amount_in_wei: u128) -> Result<u128> {
    let price = self.latest_price(token)?;
    token_amount_from_usd(usd_amount_in_wei, price).ok_or(DscError::MathOverflow)
  }

  /// Sum of the USD value of every collateral token the user has deposited
  pub fn get_account_collateral_value(&self, user: Address) -> Result<u128> {
    self.collateral_value_with(user, None)
  }

  /// (total DSC minted, collateral value in USD)
  pub fn get_account_information(&self, user: Address) -> Result<(u128, u128)> {
    Ok((self.state.dsc_minted(user), self.get_account_collateral_value(user)?))
  }

  pub fn health_factor(&self, user: Address) -> Result<u128> {
    let (minted, collateral_value) = self.get_account_information(user)?;
    Ok(health_factor(minted, collateral_value, self.state.liquidation_threshold))
  }

  /// Collateral value with one token balance optionally replaced, for post-state checks
  pub(crate) fn collateral_value_with(&self, user: Address, replaced: Option<(Address, u128)>) -> Result<u128> {
    let mut total = 0u128;
    for token in &self.state.collateral_tokens {
      let balance = match replaced {
        Some((replaced_token, balance)) if replaced_token == *token => balance,
        _ => self.state.deposited(user, *token),
      };
      let value = self.get_usd_value(*token, balance)?;
      total = total.checked_add(value).ok_or(DscError::MathOverflow)?;
    }
    Ok(total)
  }

  fn latest_price(&self, token: Address) -> Result<u128> {
    let feed = self.token_to_price_feed(token)?;
    Ok(self.price_feed(feed)?.latest_answer())
  }
}
