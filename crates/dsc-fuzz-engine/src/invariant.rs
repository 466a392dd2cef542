//! Solvency invariant: deposited collateral must be worth at least the synthetic supply
//! Compared exactly; no tolerance is applied

use dsc_fuzz_core::{
  Amount, CollateralAsset, Invariant, InvariantViolation, Price, ProtocolAdapter, ProtocolError, RejectionKind,
  FEED_PRECISION,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coverage {
  Covered { collateral_value: Amount, total_supply: Amount },
  Violated(InvariantViolation),
}

/// floor(Σ amount × price / FEED_PRECISION) without rounding each term separately
///
/// Since supply is an integer, `value >= supply` on this floor is the same as the
/// exact rational comparison.
pub fn collateral_value(holdings: &[(Amount, Price)]) -> Option<Amount> {
  let mut whole = 0u128;
  let mut remainder = 0u128;

  for (amount, price) in holdings {
    let price = price.raw();
    let high = (amount / FEED_PRECISION).checked_mul(price)?;
    let low = (amount % FEED_PRECISION).checked_mul(price)?;

    whole = whole.checked_add(high)?.checked_add(low / FEED_PRECISION)?;
    remainder = remainder.checked_add(low % FEED_PRECISION)?;
  }

  whole.checked_add(remainder / FEED_PRECISION)
}

/// Assert Σ(asset value) ≥ total supply over already-gathered holdings
pub fn assert_collateral_covers_supply(
  holdings: &[(Amount, Price)],
  total_supply: Amount,
) -> Result<Coverage, ProtocolError> {
  let value = collateral_value(holdings)
    .ok_or_else(|| ProtocolError::new(RejectionKind::Arithmetic, "collateral value exceeds u128"))?;

  if value >= total_supply {
    Ok(Coverage::Covered { collateral_value: value, total_supply })
  } else {
    Ok(Coverage::Violated(InvariantViolation {
      invariant: Invariant::CollateralCoversSupply,
      collateral_value: value,
      total_supply,
    }))
  }
}

/// Query the adapter's authoritative state and check the solvency invariant
pub fn check_invariants<A: ProtocolAdapter>(adapter: &A) -> Result<Coverage, ProtocolError> {
  let protocol = adapter.address();
  let mut holdings = Vec::with_capacity(CollateralAsset::ALL.len());

  for asset in CollateralAsset::ALL {
    let deposited = adapter.balance_of(asset, protocol)?;
    let price = adapter.current_price(adapter.price_feed_of(asset)?)?;
    holdings.push((deposited, price));
  }

  assert_collateral_covers_supply(&holdings, adapter.total_supply()?)
}
