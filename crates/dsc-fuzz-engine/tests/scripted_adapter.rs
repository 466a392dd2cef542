//! Retry and skip behaviour against an adapter whose responses are fixed up front

use std::collections::BTreeMap;

use dsc_fuzz_config::FuzzConfig;
use dsc_fuzz_core::{
    Account, AdapterFactory, Amount, CollateralAsset, CollateralToken, OracleRef, Operation, Price,
    PriceOracle, Protocol, ProtocolAdapter, ProtocolError, RejectionKind, RunResult, Sequence,
    FEED_PRECISION,
};
use dsc_fuzz_engine::{Applied, Fuzzer, Scheduler, StepFailure};
use proptest::prelude::*;

const PROTOCOL: Account = Account([0xEE; 20]);

/// Bookkeeping-only protocol that rejects every mint with `mint_rejection`, if set
#[derive(Debug, Clone)]
struct ScriptedAdapter {
    mint_rejection: Option<RejectionKind>,
    deposits: BTreeMap<(Account, CollateralAsset), Amount>,
    held: [Amount; 2],
    prices: [Price; 2],
    supply: Amount,
    mint_calls: usize,
    deposit_calls: usize,
    redeem_calls: usize,
}

impl ScriptedAdapter {
    fn new(mint_rejection: Option<RejectionKind>) -> Self {
        let par = Price::new(FEED_PRECISION).unwrap();
        Self {
            mint_rejection,
            deposits: BTreeMap::new(),
            held: [0; 2],
            prices: [par; 2],
            supply: 0,
            mint_calls: 0,
            deposit_calls: 0,
            redeem_calls: 0,
        }
    }
}

impl Protocol for ScriptedAdapter {
    fn address(&self) -> Account {
        PROTOCOL
    }

    fn deposit_collateral(
        &mut self,
        caller: Account,
        asset: CollateralAsset,
        amount: Amount,
    ) -> Result<(), ProtocolError> {
        self.deposit_calls += 1;
        *self.deposits.entry((caller, asset)).or_default() += amount;
        self.held[asset.index()] += amount;
        Ok(())
    }

    fn redeem_collateral(
        &mut self,
        caller: Account,
        asset: CollateralAsset,
        amount: Amount,
    ) -> Result<(), ProtocolError> {
        self.redeem_calls += 1;
        let balance = self.deposits.entry((caller, asset)).or_default();
        *balance = balance
            .checked_sub(amount)
            .ok_or_else(|| ProtocolError::new(RejectionKind::InsufficientCollateral, "scripted"))?;
        self.held[asset.index()] -= amount;
        Ok(())
    }

    fn mint_synthetic(&mut self, _caller: Account, amount: Amount) -> Result<(), ProtocolError> {
        self.mint_calls += 1;
        if let Some(kind) = self.mint_rejection {
            return Err(ProtocolError::new(kind, "scripted rejection"));
        }
        self.supply += amount;
        Ok(())
    }

    fn collateral_balance_of(&self, account: Account, asset: CollateralAsset) -> Result<Amount, ProtocolError> {
        Ok(self.deposits.get(&(account, asset)).copied().unwrap_or(0))
    }

    fn token_amount_from_value(&self, asset: CollateralAsset, value: Amount) -> Result<Amount, ProtocolError> {
        Ok(value * FEED_PRECISION / self.prices[asset.index()].raw())
    }

    fn usd_value(&self, asset: CollateralAsset, amount: Amount) -> Result<Amount, ProtocolError> {
        Ok(amount * self.prices[asset.index()].raw() / FEED_PRECISION)
    }

    fn price_feed_of(&self, asset: CollateralAsset) -> Result<OracleRef, ProtocolError> {
        Ok(OracleRef([asset.index() as u8; 20]))
    }

    fn total_supply(&self) -> Result<Amount, ProtocolError> {
        Ok(self.supply)
    }
}

impl PriceOracle for ScriptedAdapter {
    fn current_price(&self, oracle: OracleRef) -> Result<Price, ProtocolError> {
        Ok(self.prices[oracle.0[0] as usize])
    }

    fn set_price(&mut self, oracle: OracleRef, price: Price) -> Result<(), ProtocolError> {
        self.prices[oracle.0[0] as usize] = price;
        Ok(())
    }
}

impl CollateralToken for ScriptedAdapter {
    fn mint_test_tokens(&mut self, _to: Account, _asset: CollateralAsset, _amount: Amount) -> Result<(), ProtocolError> {
        Ok(())
    }

    fn approve(
        &mut self,
        _owner: Account,
        _asset: CollateralAsset,
        _spender: Account,
        _amount: Amount,
    ) -> Result<(), ProtocolError> {
        Ok(())
    }

    fn balance_of(&self, asset: CollateralAsset, holder: Account) -> Result<Amount, ProtocolError> {
        Ok(if holder == PROTOCOL { self.held[asset.index()] } else { 0 })
    }
}

impl ProtocolAdapter for ScriptedAdapter {
    fn provision_accounts(&mut self, count: usize) -> Result<Vec<Account>, ProtocolError> {
        Ok((1..=count).map(|n| Account([n as u8; 20])).collect())
    }
}

struct ScriptedFactory {
    mint_rejection: Option<RejectionKind>,
}

impl AdapterFactory for ScriptedFactory {
    type Adapter = ScriptedAdapter;

    fn fresh(&self) -> Result<ScriptedAdapter, ProtocolError> {
        Ok(ScriptedAdapter::new(self.mint_rejection))
    }
}

fn mint(amount: Amount) -> Operation {
    Operation::MintSynthetic { account: 0, asset: CollateralAsset::Weth, amount }
}

#[test]
fn recoverable_rejection_gets_exactly_one_remedial_cycle() {
    let config = FuzzConfig::default();
    let factory = ScriptedFactory { mint_rejection: Some(RejectionKind::HealthFactor) };
    let scheduler = Scheduler::new(&config, &factory).unwrap();
    let mut trial = scheduler.setup().unwrap();
    let user = trial.accounts()[0];

    match trial.execute(scheduler.catalog(), &mint(10)) {
        Err(StepFailure::Error(error)) => {
            assert_eq!(error.kind, RejectionKind::HealthFactor);
            assert_eq!(error.reason, "scripted rejection");
        }
        other => panic!("second rejection must surface, got {other:?}"),
    }

    assert_eq!(trial.adapter().mint_calls, 2);
    assert_eq!(trial.adapter().deposit_calls, 1);
    // (10 * 1e8 / 1e8 + 1) * 2
    assert_eq!(trial.adapter().collateral_balance_of(user, CollateralAsset::Weth).unwrap(), 22);
    assert_eq!(trial.model().balance_of(user, CollateralAsset::Weth), 22);
    assert_eq!(trial.model().total_supply(), 0);
}

#[test]
fn unrecoverable_rejection_is_not_retried() {
    let config = FuzzConfig::default();
    let factory = ScriptedFactory { mint_rejection: Some(RejectionKind::InsufficientBalance) };
    let scheduler = Scheduler::new(&config, &factory).unwrap();
    let mut trial = scheduler.setup().unwrap();

    match trial.execute(scheduler.catalog(), &mint(10)) {
        Err(StepFailure::Error(error)) => assert_eq!(error.kind, RejectionKind::InsufficientBalance),
        other => panic!("expected an execution error, got {other:?}"),
    }
    assert_eq!(trial.adapter().mint_calls, 1);
    assert_eq!(trial.adapter().deposit_calls, 0);
}

#[test]
fn persistent_rejection_is_reported_with_its_step() {
    let factory = ScriptedFactory { mint_rejection: Some(RejectionKind::HealthFactor) };
    let fuzzer = Fuzzer::new(FuzzConfig::default(), factory).unwrap();
    let sequence = Sequence {
        seed: 3,
        operations: vec![
            Operation::Deposit { account: 1, asset: CollateralAsset::Wbtc, amount: 50 },
            mint(10),
        ],
    };

    match fuzzer.replay(&sequence).unwrap() {
        RunResult::ExecutionError { step, error, .. } => {
            assert_eq!(step, 1);
            assert_eq!(error.kind, RejectionKind::HealthFactor);
        }
        other => panic!("expected an execution error, got {other:?}"),
    }
}

#[test]
fn accepted_mint_updates_supply_once() {
    let config = FuzzConfig::default();
    let factory = ScriptedFactory { mint_rejection: None };
    let scheduler = Scheduler::new(&config, &factory).unwrap();
    let mut trial = scheduler.setup().unwrap();
    let catalog = scheduler.catalog();

    let deposit = Operation::Deposit { account: 0, asset: CollateralAsset::Weth, amount: 100 };
    assert_eq!(trial.execute(catalog, &deposit), Ok(Applied::Executed));
    assert_eq!(trial.execute(catalog, &mint(10)), Ok(Applied::Executed));

    assert_eq!(trial.adapter().mint_calls, 1);
    assert_eq!(trial.model().total_supply(), 10);
}

proptest! {
    #[test]
    fn zero_redeem_touches_neither_adapter_nor_model(
        (percentage, amount) in (1u8..=99).prop_flat_map(|p| (Just(p), 1u128..=99 / p as u128)),
    ) {
        prop_assert_eq!(amount * percentage as u128 / 100, 0);

        let config = FuzzConfig::default();
        let factory = ScriptedFactory { mint_rejection: None };
        let scheduler = Scheduler::new(&config, &factory).unwrap();
        let mut trial = scheduler.setup().unwrap();
        let catalog = scheduler.catalog();

        let deposit = Operation::Deposit { account: 0, asset: CollateralAsset::Wbtc, amount };
        trial.execute(catalog, &deposit).unwrap();
        let model_before = trial.model().clone();
        let adapter_before = trial.adapter().clone();

        let redeem = Operation::Redeem { account: 0, asset: CollateralAsset::Wbtc, percentage };
        prop_assert_eq!(trial.execute(catalog, &redeem), Ok(Applied::Skipped));
        prop_assert_eq!(trial.model(), &model_before);
        prop_assert_eq!(trial.adapter().redeem_calls, 0);
        prop_assert_eq!(&trial.adapter().deposits, &adapter_before.deposits);
    }
}
