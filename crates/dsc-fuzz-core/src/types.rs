use std::fmt;

use serde::{Deserialize, Serialize};

/// Token and synthetic-asset amounts in base units (1e18 per whole token)
pub type Amount = u128;

/// Price feed answers carry 8 decimals
pub const FEED_PRECISION: u128 = 100_000_000;

/// Address-like account identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Account(pub [u8; 20]);

impl fmt::Display for Account {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("0x")?;
    for byte in self.0 {
      write!(f, "{byte:02x}")?;
    }
    Ok(())
  }
}

/// Handle to the price oracle backing a collateral asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OracleRef(pub [u8; 20]);

/// The two collateral kinds accepted by the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollateralAsset {
  Weth,
  Wbtc,
}

impl CollateralAsset {
  pub const ALL: [CollateralAsset; 2] = [CollateralAsset::Weth, CollateralAsset::Wbtc];

  /// Seed 0 selects WETH, anything else WBTC
  pub fn from_seed(seed: u8) -> Self {
    if seed == 0 {
      Self::Weth
    } else {
      Self::Wbtc
    }
  }

  pub fn index(self) -> usize {
    match self {
      Self::Weth => 0,
      Self::Wbtc => 1,
    }
  }

  pub fn symbol(self) -> &'static str {
    match self {
      Self::Weth => "WETH",
      Self::Wbtc => "WBTC",
    }
  }
}

impl fmt::Display for CollateralAsset {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.symbol())
  }
}

/// Strictly positive oracle price with FEED_PRECISION decimals
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u128", into = "u128")]
pub struct Price(u128);

impl Price {
  pub fn new(raw: u128) -> Option<Self> {
    (raw > 0).then_some(Self(raw))
  }

  pub fn raw(self) -> u128 {
    self.0
  }

  /// New price after applying `multiplier`, floored and never below one unit
  pub fn scaled(self, multiplier: PriceMultiplier) -> Option<Self> {
    let scaled = self
      .0
      .checked_mul(multiplier.bps() as u128)?
      / PriceMultiplier::BPS_PRECISION as u128;
    Some(Self(scaled.max(1)))
  }
}

impl TryFrom<u128> for Price {
  type Error = String;

  fn try_from(raw: u128) -> Result<Self, Self::Error> {
    Price::new(raw).ok_or_else(|| "price must be greater than zero".to_string())
  }
}

impl From<Price> for u128 {
  fn from(price: Price) -> Self {
    price.0
  }
}

impl fmt::Display for Price {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let whole = self.0 / FEED_PRECISION;
    let frac = self.0 % FEED_PRECISION;
    write!(f, "{whole}.{frac:08}")
  }
}

/// Price perturbation in basis points, restricted to [0.2, 1.15]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PriceMultiplier(u32);

impl PriceMultiplier {
  pub const BPS_PRECISION: u32 = 10_000;
  pub const MIN_BPS: u32 = 2_000;
  pub const MAX_BPS: u32 = 11_500;
  pub const NEUTRAL: PriceMultiplier = PriceMultiplier(Self::BPS_PRECISION);

  pub fn from_bps(bps: u32) -> Option<Self> {
    (Self::MIN_BPS..=Self::MAX_BPS).contains(&bps).then_some(Self(bps))
  }

  pub fn bps(self) -> u32 {
    self.0
  }

  pub fn as_f64(self) -> f64 {
    self.0 as f64 / Self::BPS_PRECISION as f64
  }
}

impl TryFrom<u32> for PriceMultiplier {
  type Error = String;

  fn try_from(bps: u32) -> Result<Self, Self::Error> {
    PriceMultiplier::from_bps(bps).ok_or_else(|| {
      format!(
        "multiplier {bps} bps outside [{}, {}]",
        PriceMultiplier::MIN_BPS,
        PriceMultiplier::MAX_BPS
      )
    })
  }
}

impl From<PriceMultiplier> for u32 {
  fn from(multiplier: PriceMultiplier) -> Self {
    multiplier.0
  }
}

impl fmt::Display for PriceMultiplier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "x{:.4}", self.as_f64())
  }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_scaling_floors_and_stays_positive() {
        let price = Price::new(2_000 * FEED_PRECISION).unwrap();
        let devalued = price.scaled(PriceMultiplier::from_bps(2_000).unwrap()).unwrap();
        assert_eq!(devalued.raw(), 400 * FEED_PRECISION);

        let dust = Price::new(1).unwrap();
        assert_eq!(dust.scaled(PriceMultiplier::from_bps(2_000).unwrap()).unwrap().raw(), 1);
    }

    #[test]
    fn multiplier_range_is_enforced() {
        assert!(PriceMultiplier::from_bps(1_999).is_none());
        assert!(PriceMultiplier::from_bps(11_501).is_none());
        assert_eq!(PriceMultiplier::from_bps(11_500).unwrap().as_f64(), 1.15);
        assert!(serde_json::from_str::<PriceMultiplier>("50").is_err());
    }

    #[test]
    fn zero_price_is_not_constructible() {
        assert!(Price::new(0).is_none());
        assert!(serde_json::from_str::<Price>("0").is_err());
    }

    #[test]
    fn price_display_uses_feed_decimals() {
        assert_eq!(Price::new(150_000_000).unwrap().to_string(), "1.50000000");
    }

    #[test]
    fn asset_seed_selection() {
        assert_eq!(CollateralAsset::from_seed(0), CollateralAsset::Weth);
        assert_eq!(CollateralAsset::from_seed(1), CollateralAsset::Wbtc);
        assert_eq!(CollateralAsset::Wbtc.index(), 1);
    }
}
