//! Invariant assertions for the DSC engine
//! Every state-changing instruction validates its post-state with these before committing

use crate::constants::MIN_HEALTH_FACTOR;
use crate::error::{DscError, Result};

/// Assert that an amount is strictly positive
pub fn assert_more_than_zero(amount: u128) -> Result<()> {
  require!(amount > 0, DscError::NeedsMoreThanZero);
  Ok(())
}

/// Assert that a user's health factor is at or above the minimum
///
/// # Arguments
/// * `health_factor` - Post-operation health factor (1e18 precision)
pub fn assert_health_factor_not_broken(health_factor: u128) -> Result<()> {
  require!(
    health_factor >= MIN_HEALTH_FACTOR,
    DscError::BreaksHealthFactor { health_factor }
  );
  Ok(())
}

/// Assert that the liquidation threshold is a usable percentage
pub fn assert_valid_liquidation_threshold(threshold: u128) -> Result<()> {
  require!(threshold > 0 && threshold <= 100, DscError::InvalidParameter);
  Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PRECISION;

    #[test]
    fn test_zero_amount_rejected() {
        assert_eq!(assert_more_than_zero(0), Err(DscError::NeedsMoreThanZero));
        assert!(assert_more_than_zero(1).is_ok());
    }

    #[test]
    fn test_health_factor_exact_minimum() {
        assert!(assert_health_factor_not_broken(PRECISION).is_ok());
    }

    #[test]
    fn test_health_factor_below_minimum() {
        let result = assert_health_factor_not_broken(PRECISION - 1);
        assert_eq!(
            result,
            Err(DscError::BreaksHealthFactor { health_factor: PRECISION - 1 })
        );
    }

    #[test]
    fn test_liquidation_threshold_bounds() {
        assert!(assert_valid_liquidation_threshold(0).is_err());
        assert!(assert_valid_liquidation_threshold(50).is_ok());
        assert!(assert_valid_liquidation_threshold(100).is_ok());
        assert!(assert_valid_liquidation_threshold(101).is_err());
    }
}
