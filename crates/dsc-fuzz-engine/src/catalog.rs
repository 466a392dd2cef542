//! Operation catalog: parameter generators, preconditions and effects per operation kind
//! Generators read the model at generation time; effects update it only after the adapter accepts

use dsc_fuzz_config::{FuzzConfig, MAX_MULTIPLIER_BPS, MIN_MULTIPLIER_BPS};
use dsc_fuzz_core::{
  Account, Amount, CollateralAsset, Operation, OperationKind, PriceMultiplier, ProtocolAdapter, ProtocolError,
  RejectionKind,
};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::model::ModelState;

/// How an operation was carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
  Executed,
  /// Precondition failed at application time; neither adapter nor model was touched
  Skipped,
  /// Mint succeeded after one remedial collateral top-up
  Remediated,
}

#[derive(Debug, Clone)]
pub struct Catalog {
  kinds: WeightedIndex<u32>,
  max_deposit: Amount,
  composite_multiplier: PriceMultiplier,
  remedial_margin: u128,
}

impl Catalog {
  pub fn new(config: &FuzzConfig) -> Result<Self, EngineError> {
    config.validate()?;

    let weights = config.weights;
    let kinds = WeightedIndex::new([
      weights.deposit,
      weights.redeem,
      weights.mint,
      weights.update_price,
      weights.composite,
    ])
    .map_err(|e| dsc_fuzz_config::ConfigError::Validation(e.to_string()))?;

    let composite_multiplier = PriceMultiplier::from_bps(config.composite_multiplier_bps).ok_or_else(|| {
      dsc_fuzz_config::ConfigError::Validation("composite multiplier outside update-price range".to_string())
    })?;

    Ok(Self {
      kinds,
      max_deposit: config.max_deposit,
      composite_multiplier,
      remedial_margin: config.remedial_margin,
    })
  }

  pub fn pick_kind<R: Rng + ?Sized>(&self, rng: &mut R) -> OperationKind {
    OperationKind::ALL[self.kinds.sample(rng)]
  }

  /// Draw one operation by weight; `None` means nothing applicable this draw
  pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R, model: &ModelState, accounts: &[Account]) -> Option<Operation> {
    let kind = self.pick_kind(rng);
    self.generate(kind, rng, model, accounts)
  }

  pub fn generate<R: Rng + ?Sized>(
    &self,
    kind: OperationKind,
    rng: &mut R,
    model: &ModelState,
    accounts: &[Account],
  ) -> Option<Operation> {
    if accounts.is_empty() {
      return None;
    }

    match kind {
      OperationKind::Deposit => Some(Operation::Deposit {
        account: rng.gen_range(0..accounts.len()),
        asset: draw_asset(rng),
        amount: self.draw_amount(rng),
      }),
      OperationKind::Redeem => {
        let account = rng.gen_range(0..accounts.len());
        let asset = draw_asset(rng);
        let percentage = rng.gen_range(1..=100u8);

        if model.redeemable(accounts[account], asset, percentage) == 0 {
          return None;
        }
        Some(Operation::Redeem { account, asset, percentage })
      }
      OperationKind::MintSynthetic => Some(Operation::MintSynthetic {
        account: rng.gen_range(0..accounts.len()),
        asset: draw_asset(rng),
        amount: self.draw_amount(rng),
      }),
      OperationKind::UpdatePrice => {
        let bps = rng.gen_range(MIN_MULTIPLIER_BPS..=MAX_MULTIPLIER_BPS);
        Some(Operation::UpdatePrice {
          asset: draw_asset(rng),
          multiplier: PriceMultiplier::from_bps(bps)?,
        })
      }
      OperationKind::DepositAndUpdatePrice => Some(Operation::DepositAndUpdatePrice {
        account: rng.gen_range(0..accounts.len()),
        asset: draw_asset(rng),
        amount: self.draw_amount(rng),
        multiplier: self.composite_multiplier,
      }),
    }
  }

  /// Execute `operation` against the adapter and mirror the effect into the model
  pub fn apply<A: ProtocolAdapter>(
    &self,
    operation: &Operation,
    adapter: &mut A,
    model: &mut ModelState,
    accounts: &[Account],
  ) -> Result<Applied, ProtocolError> {
    match *operation {
      Operation::Deposit { account, asset, amount } => {
        let user = resolve(accounts, account)?;
        deposit(adapter, model, user, asset, amount)?;
        Ok(Applied::Executed)
      }
      Operation::Redeem { account, asset, percentage } => {
        let user = resolve(accounts, account)?;
        let to_redeem = model.redeemable(user, asset, percentage);
        if to_redeem == 0 {
          debug!(%user, %asset, percentage, "nothing to redeem, skipping");
          return Ok(Applied::Skipped);
        }

        adapter.redeem_collateral(user, asset, to_redeem)?;
        model.record_redeem(user, asset, to_redeem)?;
        Ok(Applied::Executed)
      }
      Operation::MintSynthetic { account, asset, amount } => {
        let user = resolve(accounts, account)?;
        self.mint(adapter, model, user, asset, amount)
      }
      Operation::UpdatePrice { asset, multiplier } => {
        update_price(adapter, model, asset, multiplier)?;
        Ok(Applied::Executed)
      }
      Operation::DepositAndUpdatePrice { account, asset, amount, multiplier } => {
        let user = resolve(accounts, account)?;
        deposit(adapter, model, user, asset, amount)?;
        update_price(adapter, model, asset, multiplier)?;
        Ok(Applied::Executed)
      }
    }
  }

  /// Mint, with a single collateral top-up and retry on a recoverable rejection
  fn mint<A: ProtocolAdapter>(
    &self,
    adapter: &mut A,
    model: &mut ModelState,
    user: Account,
    asset: CollateralAsset,
    amount: Amount,
  ) -> Result<Applied, ProtocolError> {
    let rejection = match adapter.mint_synthetic(user, amount) {
      Ok(()) => {
        model.record_mint(amount)?;
        return Ok(Applied::Executed);
      }
      Err(rejection) if rejection.kind.is_recoverable() => rejection,
      Err(rejection) => return Err(rejection),
    };

    // rounded up, so the top-up is never worth less than `margin × amount`
    let equivalent = adapter
      .token_amount_from_value(asset, amount)?
      .checked_add(1)
      .ok_or_else(|| ProtocolError::new(RejectionKind::Arithmetic, "collateral equivalent overflows"))?;
    let top_up = equivalent
      .checked_mul(self.remedial_margin)
      .ok_or_else(|| ProtocolError::new(RejectionKind::Arithmetic, "remedial collateral amount overflows"))?;

    warn!(%user, %asset, amount, top_up, reason = %rejection.reason, "mint rejected, topping up collateral");
    deposit(adapter, model, user, asset, top_up)?;

    adapter.mint_synthetic(user, amount)?;
    model.record_mint(amount)?;
    Ok(Applied::Remediated)
  }

  /// Uniform in [1, max_deposit], with the bounds themselves drawn more often
  fn draw_amount<R: Rng + ?Sized>(&self, rng: &mut R) -> Amount {
    match rng.gen_range(0..16u8) {
      0 => 1,
      1 => self.max_deposit,
      _ => rng.gen_range(1..=self.max_deposit),
    }
  }
}

fn draw_asset<R: Rng + ?Sized>(rng: &mut R) -> CollateralAsset {
  CollateralAsset::from_seed(rng.gen_range(0..=1u8))
}

fn resolve(accounts: &[Account], index: usize) -> Result<Account, ProtocolError> {
  accounts.get(index).copied().ok_or_else(|| {
    ProtocolError::new(
      RejectionKind::Other,
      format!("account index {index} outside pool of {}", accounts.len()),
    )
  })
}

/// Mint test collateral to `user`, approve the protocol and deposit
fn deposit<A: ProtocolAdapter>(
  adapter: &mut A,
  model: &mut ModelState,
  user: Account,
  asset: CollateralAsset,
  amount: Amount,
) -> Result<(), ProtocolError> {
  let protocol = adapter.address();
  adapter.mint_test_tokens(user, asset, amount)?;
  adapter.approve(user, asset, protocol, amount)?;
  adapter.deposit_collateral(user, asset, amount)?;
  model.record_deposit(user, asset, amount)?;
  Ok(())
}

/// Push `current × multiplier` to the asset's oracle; oracle updates always land in the model
fn update_price<A: ProtocolAdapter>(
  adapter: &mut A,
  model: &mut ModelState,
  asset: CollateralAsset,
  multiplier: PriceMultiplier,
) -> Result<(), ProtocolError> {
  let oracle = adapter.price_feed_of(asset)?;
  let current = adapter.current_price(oracle)?;
  let next = current
    .scaled(multiplier)
    .ok_or_else(|| ProtocolError::new(RejectionKind::Arithmetic, "scaled price overflows"))?;

  adapter.set_price(oracle, next)?;
  model.record_price(asset, next);
  debug!(%asset, from = %current, to = %next, %multiplier, "price updated");
  Ok(())
}
