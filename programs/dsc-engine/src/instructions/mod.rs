//! Core protocol instructions
//! Each instruction validates its post-state before committing any change

pub mod initialize;
pub mod deposit_collateral;
pub mod redeem_collateral;
pub mod mint_dsc;
