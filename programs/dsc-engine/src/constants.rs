//! Protocol-wide constants
//! Centralized location for all configuration values

// PRECISION CONSTANTS
pub const PRECISION: u128 = 1_000_000_000_000_000_000;          // 1e18 (token and USD wei)
pub const FEED_PRECISION: u128 = 100_000_000;                   // 1e8 (price feed answers)
pub const ADDITIONAL_FEED_PRECISION: u128 = 10_000_000_000;     // 1e10 (feed -> 1e18)
pub const FEED_DECIMALS: u8 = 8;
pub const TOKEN_DECIMALS: u8 = 18;

// RISK PARAMETERS
pub const LIQUIDATION_PRECISION: u128 = 100;
pub const DEFAULT_LIQUIDATION_THRESHOLD: u128 = 50;             // 200% overcollateralized
pub const MIN_HEALTH_FACTOR: u128 = PRECISION;                  // 1.0

// DEPLOYMENT DEFAULTS
pub const INITIAL_ETH_USD_PRICE: u128 = 2_000 * FEED_PRECISION;
pub const INITIAL_BTC_USD_PRICE: u128 = 1_000 * FEED_PRECISION;
