//! Pure mathematical functions for the DSC engine
//! All functions are deterministic and use fixed-point arithmetic
//! Intermediate products are computed at 256-bit width so u128 inputs never overflow mid-way

use crate::constants::{FEED_PRECISION, LIQUIDATION_PRECISION, PRECISION};

/// Full 256-bit product of two u128 values as (high, low) words
fn widening_mul(a: u128, b: u128) -> (u128, u128) {
  let mask = u64::MAX as u128;
  let (a_hi, a_lo) = (a >> 64, a & mask);
  let (b_hi, b_lo) = (b >> 64, b & mask);

  let lo_lo = a_lo * b_lo;
  let hi_lo = a_hi * b_lo;
  let lo_hi = a_lo * b_hi;
  let hi_hi = a_hi * b_hi;

  let cross = (lo_lo >> 64) + (hi_lo & mask) + (lo_hi & mask);
  let lo = (lo_lo & mask) | (cross << 64);
  let hi = hi_hi + (hi_lo >> 64) + (lo_hi >> 64) + (cross >> 64);
  (hi, lo)
}

/// Divide a 256-bit value by `c`, returning (quotient, remainder)
/// Returns None when `c` is zero or the quotient does not fit in u128
fn div_wide(hi: u128, lo: u128, c: u128) -> Option<(u128, u128)> {
  if c == 0 || hi >= c {
    return None;
  }

  let mut rem = hi;
  let mut quot = 0u128;
  for bit in (0..128).rev() {
    let carry = rem >> 127;
    rem = (rem << 1) | ((lo >> bit) & 1);
    quot <<= 1;
    if carry == 1 || rem >= c {
      rem = rem.wrapping_sub(c);
      quot |= 1;
    }
  }
  Some((quot, rem))
}

/// Multiply two u128 values and divide by a third, rounding DOWN
/// Used for valuations that must never overstate what the protocol holds
/// Returns None on overflow or division by zero
pub fn mul_div_down(a: u128, b: u128, c: u128) -> Option<u128> {
  let (hi, lo) = widening_mul(a, b);
  div_wide(hi, lo, c).map(|(quot, _)| quot)
}

/// Multiply two u128 values and divide by a third, rounding UP
/// Returns None on overflow or division by zero
pub fn mul_div_up(a: u128, b: u128, c: u128) -> Option<u128> {
  let (hi, lo) = widening_mul(a, b);
  let (quot, rem) = div_wide(hi, lo, c)?;
  if rem > 0 {
    quot.checked_add(1)
  } else {
    Some(quot)
  }
}

/// Compute the USD value (1e18 precision) of a token amount
///
/// # Arguments
/// * `amount` - Token amount in wei (1e18 precision)
/// * `price` - Feed answer in USD (1e8 precision)
///
/// # Returns
/// `price * ADDITIONAL_FEED_PRECISION * amount / PRECISION`, which reduces to `amount * price / 1e8`
pub fn usd_value(amount: u128, price: u128) -> Option<u128> {
  mul_div_down(amount, price, FEED_PRECISION)
}

/// Compute how many token wei a USD amount buys at the given feed price
///
/// # Arguments
/// * `usd_amount_in_wei` - USD amount (1e18 precision)
/// * `price` - Feed answer in USD (1e8 precision)
pub fn token_amount_from_usd(usd_amount_in_wei: u128, price: u128) -> Option<u128> {
  if price == 0 {
    return None;
  }
  mul_div_down(usd_amount_in_wei, FEED_PRECISION, price)
}

/// Collateral value discounted by the liquidation threshold
pub fn collateral_adjusted_for_threshold(collateral_value_usd: u128, liquidation_threshold: u128) -> Option<u128> {
  mul_div_down(collateral_value_usd, liquidation_threshold, LIQUIDATION_PRECISION)
}

/// Compute a user's health factor (1e18 precision)
///
/// # Arguments
/// * `total_dsc_minted` - Debt owed by the user
/// * `collateral_value_usd` - Total USD value of the user's deposits
/// * `liquidation_threshold` - Percentage of collateral counted towards debt
///
/// # Returns
/// u128::MAX when no debt exists or the ratio is too large to represent
pub fn health_factor(total_dsc_minted: u128, collateral_value_usd: u128, liquidation_threshold: u128) -> u128 {
  if total_dsc_minted == 0 {
    return u128::MAX;
  }

  collateral_adjusted_for_threshold(collateral_value_usd, liquidation_threshold)
    .and_then(|adjusted| mul_div_down(adjusted, PRECISION, total_dsc_minted))
    .unwrap_or(u128::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_div_handles_products_wider_than_u128() {
        let a = u128::MAX / 3;
        assert_eq!(mul_div_down(a, 6, 3), Some(a * 2));
        assert_eq!(mul_div_down(u128::MAX, u128::MAX, u128::MAX), Some(u128::MAX));
    }

    #[test]
    fn mul_div_rejects_zero_divisor_and_overflow() {
        assert_eq!(mul_div_down(1, 1, 0), None);
        assert_eq!(mul_div_down(u128::MAX, 2, 1), None);
        assert_eq!(mul_div_up(u128::MAX, u128::MAX, u128::MAX - 1), None);
    }

    #[test]
    fn mul_div_up_rounds_only_with_remainder() {
        assert_eq!(mul_div_up(10, 3, 5), Some(6));
        assert_eq!(mul_div_up(10, 3, 4), Some(8));
        assert_eq!(mul_div_down(10, 3, 4), Some(7));
    }

    #[test]
    fn usd_value_matches_feed_scaling() {
        // 15 ETH at 2000 USD = 30_000 USD
        let amount = 15 * PRECISION;
        let price = 2_000 * FEED_PRECISION;
        assert_eq!(usd_value(amount, price), Some(30_000 * PRECISION));
    }

    #[test]
    fn token_amount_from_usd_inverts_value() {
        // 100 USD at 2000 USD/ETH = 0.05 ETH
        let price = 2_000 * FEED_PRECISION;
        assert_eq!(token_amount_from_usd(100 * PRECISION, price), Some(50_000_000_000_000_000));
        assert_eq!(token_amount_from_usd(100 * PRECISION, 0), None);
    }

    #[test]
    fn health_factor_is_max_without_debt() {
        assert_eq!(health_factor(0, 1_000, 50), u128::MAX);
    }

    #[test]
    fn health_factor_at_exact_threshold_is_one() {
        // 200 USD collateral, 50% threshold, 100 USD debt
        let hf = health_factor(100 * PRECISION, 200 * PRECISION, 50);
        assert_eq!(hf, PRECISION);
    }
}
