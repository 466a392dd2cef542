//! Mock price aggregator with a settable answer
//! Answers carry FEED_DECIMALS (8) decimals

use crate::constants::FEED_DECIMALS;
use crate::error::{DscError, Result};

#[derive(Debug, Clone)]
pub struct MockV3Aggregator {
  pub decimals: u8,
  latest_answer: u128,
  latest_round: u64,
}

impl MockV3Aggregator {
  pub fn new(initial_answer: u128) -> Result<Self> {
    require!(initial_answer > 0, DscError::InvalidPrice);
    Ok(Self {
      decimals: FEED_DECIMALS,
      latest_answer: initial_answer,
      latest_round: 1,
    })
  }

  pub fn latest_answer(&self) -> u128 {
    self.latest_answer
  }

  pub fn latest_round(&self) -> u64 {
    self.latest_round
  }

  pub fn update_answer(&mut self, answer: u128) -> Result<()> {
    require!(answer > 0, DscError::InvalidPrice);
    self.latest_answer = answer;
    self.latest_round = self.latest_round.saturating_add(1);
    Ok(())
  }
}
