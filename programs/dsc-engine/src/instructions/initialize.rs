//! Initialize instruction - deploys the protocol
//! Creates the DSC token, each collateral token with its price feed, and the engine

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::*;
use crate::error::{DscError, Result};
use crate::invariants::assert_valid_liquidation_threshold;
use crate::oracle::MockV3Aggregator;
use crate::state::*;
use crate::token::MockToken;
use crate::DscEngine;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralParams {
  pub symbol: String,
  /// Initial feed answer (1e8 precision)
  pub initial_price: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializeParams {
  pub liquidation_threshold: u128,
  pub collateral: Vec<CollateralParams>,
}

impl Default for InitializeParams {
  fn default() -> Self {
    Self {
      liquidation_threshold: DEFAULT_LIQUIDATION_THRESHOLD,
      collateral: vec![
        CollateralParams { symbol: "WETH".to_string(), initial_price: INITIAL_ETH_USD_PRICE },
        CollateralParams { symbol: "WBTC".to_string(), initial_price: INITIAL_BTC_USD_PRICE },
      ],
    }
  }
}

pub fn handler(params: InitializeParams) -> Result<DscEngine> {
  assert_valid_liquidation_threshold(params.liquidation_threshold)?;
  require!(!params.collateral.is_empty(), DscError::InvalidParameter);

  let mut state = EngineState {
    address: Address::derive(ENGINE_SEED, 0),
    dsc: Address::derive(DSC_SEED, 0),
    liquidation_threshold: params.liquidation_threshold,
    ..EngineState::default()
  };

  let mut tokens = BTreeMap::new();
  let mut price_feeds = BTreeMap::new();
  tokens.insert(state.dsc, MockToken::new("DSC", TOKEN_DECIMALS));

  for (index, collateral) in params.collateral.iter().enumerate() {
    let token = Address::derive(TOKEN_SEED, index as u64);
    let feed = Address::derive(FEED_SEED, index as u64);

    tokens.insert(token, MockToken::new(collateral.symbol.clone(), TOKEN_DECIMALS));
    price_feeds.insert(feed, MockV3Aggregator::new(collateral.initial_price)?);
    state.collateral_tokens.push(token);
    state.token_to_price_feed.insert(token, feed);

    debug!(symbol = %collateral.symbol, %token, %feed, price = collateral.initial_price, "collateral whitelisted");
  }

  debug!(
    engine = %state.address,
    dsc = %state.dsc,
    liquidation_threshold = state.liquidation_threshold,
    "protocol initialized"
  );

  Ok(DscEngine { state, tokens, price_feeds })
}
