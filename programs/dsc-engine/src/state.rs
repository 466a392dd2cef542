//! State for the DSC engine
//! Holds the collateral ledger, minted debt and the token/price-feed whitelist

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// 20-byte account or contract address
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
  pub const ZERO: Address = Address([0; 20]);

  /// Deterministic address derived from a label and an index
  pub fn derive(label: &str, index: u64) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(label.as_bytes());
    hasher.update(index.to_le_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest[..20]);
    Address(bytes)
  }

  pub fn is_zero(&self) -> bool {
    *self == Self::ZERO
  }
}

impl fmt::Display for Address {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("0x")?;
    for byte in self.0 {
      write!(f, "{byte:02x}")?;
    }
    Ok(())
  }
}

/// Engine storage - the single source of truth for deposits and debt
#[derive(Debug, Clone, Default)]
pub struct EngineState {
  /// Address the engine holds collateral under
  pub address: Address,

  /// Synthetic asset token contract
  pub dsc: Address,

  /// Percentage of collateral value counted towards debt
  pub liquidation_threshold: u128,

  /// Whitelisted collateral tokens in deployment order
  pub collateral_tokens: Vec<Address>,

  pub token_to_price_feed: BTreeMap<Address, Address>,

  pub user_to_token_to_amount_deposited: BTreeMap<(Address, Address), u128>,

  pub user_to_dsc_minted: BTreeMap<Address, u128>,
}

impl EngineState {
  pub fn deposited(&self, user: Address, token: Address) -> u128 {
    self
      .user_to_token_to_amount_deposited
      .get(&(user, token))
      .copied()
      .unwrap_or(0)
  }

  pub fn dsc_minted(&self, user: Address) -> u128 {
    self.user_to_dsc_minted.get(&user).copied().unwrap_or(0)
  }

  pub fn is_allowed(&self, token: Address) -> bool {
    self.token_to_price_feed.contains_key(&token)
  }
}

pub const ENGINE_SEED: &str = "dsc_engine";

pub const DSC_SEED: &str = "decentralized_stable_coin";

pub const TOKEN_SEED: &str = "collateral_token";

pub const FEED_SEED: &str = "price_feed";
