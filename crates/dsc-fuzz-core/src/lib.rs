//! Shared domain types for the solvency fuzzer
//! Accounts, assets, prices, operations, run results and the protocol collaborator traits

pub mod adapter;
pub mod operation;
pub mod types;

pub use adapter::{
  AdapterFactory, CollateralToken, PriceOracle, Protocol, ProtocolAdapter, ProtocolError, RejectionKind,
};
pub use operation::{
  FailureSignature, Invariant, InvariantViolation, Operation, OperationKind, RunResult, Sequence,
};
pub use types::{Account, Amount, CollateralAsset, OracleRef, Price, PriceMultiplier, FEED_PRECISION};
