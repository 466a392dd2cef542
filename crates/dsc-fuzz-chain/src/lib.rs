//! Simulated chain binding the in-memory DSC engine to the fuzzer's collaborator traits
//! Each factory call deploys a fresh engine so trials and replays never share state

use dsc_engine::{Address, DscEngine, DscError, InitializeParams};
use dsc_fuzz_core::{
  Account, AdapterFactory, Amount, CollateralAsset, CollateralToken, OracleRef, Price, PriceOracle, Protocol,
  ProtocolAdapter, ProtocolError, RejectionKind,
};
use tracing::debug;

const ACCOUNT_SEED: &str = "fuzz_account";

/// Map an engine error onto the structured rejection tag
pub fn classify(error: &DscError) -> RejectionKind {
  match error {
    DscError::BreaksHealthFactor { .. } => RejectionKind::HealthFactor,
    DscError::NeedsMoreThanZero => RejectionKind::ZeroAmount,
    DscError::TokenNotAllowed | DscError::UnknownToken | DscError::UnknownPriceFeed => {
      RejectionKind::UnsupportedAsset
    }
    DscError::InsufficientCollateral => RejectionKind::InsufficientCollateral,
    DscError::InsufficientBalance => RejectionKind::InsufficientBalance,
    DscError::InsufficientAllowance => RejectionKind::InsufficientAllowance,
    DscError::InvalidPrice => RejectionKind::InvalidPrice,
    DscError::MathOverflow => RejectionKind::Arithmetic,
    DscError::ZeroAddress | DscError::InvalidParameter => RejectionKind::Other,
  }
}

fn rejected(error: DscError) -> ProtocolError {
  ProtocolError::new(classify(&error), error.to_string())
}

fn address(account: Account) -> Address {
  Address(account.0)
}

fn account(address: Address) -> Account {
  Account(address.0)
}

#[derive(Debug, Clone)]
pub struct SimulatedChain {
  engine: DscEngine,
  provisioned: u64,
}

impl SimulatedChain {
  pub fn deploy(params: InitializeParams) -> Result<Self, ProtocolError> {
    let engine = DscEngine::initialize(params).map_err(rejected)?;
    Ok(Self { engine, provisioned: 0 })
  }

  pub fn engine(&self) -> &DscEngine {
    &self.engine
  }

  pub fn engine_mut(&mut self) -> &mut DscEngine {
    &mut self.engine
  }

  fn token(&self, asset: CollateralAsset) -> Result<Address, ProtocolError> {
    self
      .engine
      .collateral_tokens()
      .get(asset.index())
      .copied()
      .ok_or_else(|| ProtocolError::new(RejectionKind::UnsupportedAsset, format!("{asset} is not deployed")))
  }
}

impl Protocol for SimulatedChain {
  fn address(&self) -> Account {
    account(self.engine.address())
  }

  fn deposit_collateral(&mut self, caller: Account, asset: CollateralAsset, amount: Amount) -> Result<(), ProtocolError> {
    let token = self.token(asset)?;
    self.engine.deposit_collateral(address(caller), token, amount).map_err(rejected)
  }

  fn redeem_collateral(&mut self, caller: Account, asset: CollateralAsset, amount: Amount) -> Result<(), ProtocolError> {
    let token = self.token(asset)?;
    self.engine.redeem_collateral(address(caller), token, amount).map_err(rejected)
  }

  fn mint_synthetic(&mut self, caller: Account, amount: Amount) -> Result<(), ProtocolError> {
    self.engine.mint_dsc(address(caller), amount).map_err(rejected)
  }

  fn collateral_balance_of(&self, account: Account, asset: CollateralAsset) -> Result<Amount, ProtocolError> {
    let token = self.token(asset)?;
    Ok(self.engine.get_collateral_balance_of_user(address(account), token))
  }

  fn token_amount_from_value(&self, asset: CollateralAsset, value: Amount) -> Result<Amount, ProtocolError> {
    let token = self.token(asset)?;
    self.engine.get_token_amount_from_usd(token, value).map_err(rejected)
  }

  fn usd_value(&self, asset: CollateralAsset, amount: Amount) -> Result<Amount, ProtocolError> {
    let token = self.token(asset)?;
    self.engine.get_usd_value(token, amount).map_err(rejected)
  }

  fn price_feed_of(&self, asset: CollateralAsset) -> Result<OracleRef, ProtocolError> {
    let token = self.token(asset)?;
    let feed = self.engine.token_to_price_feed(token).map_err(rejected)?;
    Ok(OracleRef(feed.0))
  }

  fn total_supply(&self) -> Result<Amount, ProtocolError> {
    let dsc = self.engine.dsc();
    Ok(self.engine.token(dsc).map_err(rejected)?.total_supply())
  }
}

impl PriceOracle for SimulatedChain {
  fn current_price(&self, oracle: OracleRef) -> Result<Price, ProtocolError> {
    let answer = self.engine.price_feed(Address(oracle.0)).map_err(rejected)?.latest_answer();
    Price::new(answer).ok_or_else(|| rejected(DscError::InvalidPrice))
  }

  fn set_price(&mut self, oracle: OracleRef, price: Price) -> Result<(), ProtocolError> {
    self
      .engine
      .price_feed_mut(Address(oracle.0))
      .and_then(|feed| feed.update_answer(price.raw()))
      .map_err(rejected)
  }
}

impl CollateralToken for SimulatedChain {
  fn mint_test_tokens(&mut self, to: Account, asset: CollateralAsset, amount: Amount) -> Result<(), ProtocolError> {
    let token = self.token(asset)?;
    self.engine.token_mut(token).and_then(|t| t.mint(address(to), amount)).map_err(rejected)
  }

  fn approve(&mut self, owner: Account, asset: CollateralAsset, spender: Account, amount: Amount) -> Result<(), ProtocolError> {
    let token = self.token(asset)?;
    self
      .engine
      .token_mut(token)
      .and_then(|t| t.approve(address(owner), address(spender), amount))
      .map_err(rejected)
  }

  fn balance_of(&self, asset: CollateralAsset, holder: Account) -> Result<Amount, ProtocolError> {
    let token = self.token(asset)?;
    Ok(self.engine.token(token).map_err(rejected)?.balance_of(address(holder)))
  }
}

impl ProtocolAdapter for SimulatedChain {
  fn provision_accounts(&mut self, count: usize) -> Result<Vec<Account>, ProtocolError> {
    let mut accounts = Vec::with_capacity(count);
    while accounts.len() < count {
      let candidate = Address::derive(ACCOUNT_SEED, self.provisioned);
      self.provisioned += 1;
      if candidate.is_zero() || candidate == self.engine.address() {
        continue;
      }
      accounts.push(account(candidate));
    }
    debug!(count, "accounts provisioned");
    Ok(accounts)
  }
}

/// Deploys a fresh [`SimulatedChain`] with fixed parameters on every call
#[derive(Debug, Clone, Default)]
pub struct SimulatedChainFactory {
  params: InitializeParams,
}

impl SimulatedChainFactory {
  pub fn new(params: InitializeParams) -> Self {
    Self { params }
  }
}

impl AdapterFactory for SimulatedChainFactory {
  type Adapter = SimulatedChain;

  fn fresh(&self) -> Result<SimulatedChain, ProtocolError> {
    SimulatedChain::deploy(self.params.clone())
  }
}
