use thiserror::Error;

pub type Result<T> = std::result::Result<T, DscError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DscError {
  #[error("DSCEngine__NeedsMoreThanZero: amount must be greater than zero")]
  NeedsMoreThanZero,

  #[error("DSCEngine__TokenNotAllowed: token is not whitelisted as collateral")]
  TokenNotAllowed,

  #[error("DSCEngine__BreaksHealthFactor: health factor {health_factor} is below the minimum")]
  BreaksHealthFactor { health_factor: u128 },

  #[error("DSCEngine__InsufficientCollateral: cannot redeem more collateral than deposited")]
  InsufficientCollateral,

  #[error("ERC20: transfer amount exceeds balance")]
  InsufficientBalance,

  #[error("ERC20: insufficient allowance")]
  InsufficientAllowance,

  #[error("ERC20: zero address is not a valid party")]
  ZeroAddress,

  #[error("Unknown token contract - no token deployed at this address")]
  UnknownToken,

  #[error("Unknown price feed - no aggregator deployed at this address")]
  UnknownPriceFeed,

  #[error("Price feed answer must be greater than zero")]
  InvalidPrice,

  #[error("Math overflow occurred - values exceeded u128 bounds")]
  MathOverflow,

  #[error("Invalid parameter value provided")]
  InvalidParameter,
}
