use dsc_fuzz_chain::{SimulatedChain, SimulatedChainFactory};
use dsc_fuzz_core::{
    AdapterFactory, CollateralAsset, CollateralToken, PriceOracle, Protocol, ProtocolAdapter,
    RejectionKind, FEED_PRECISION,
};

const ONE: u128 = 1_000_000_000_000_000_000;

fn chain() -> SimulatedChain {
    SimulatedChainFactory::default().fresh().unwrap()
}

#[test]
fn provisioned_accounts_are_distinct_and_nonzero() {
    let mut chain = chain();
    let accounts = chain.provision_accounts(10).unwrap();
    assert_eq!(accounts.len(), 10);

    let mut unique = accounts.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 10);
    assert!(accounts.iter().all(|a| a.0 != [0u8; 20]));
    assert!(!accounts.contains(&chain.address()));
}

#[test]
fn fresh_fixtures_do_not_share_state() {
    let factory = SimulatedChainFactory::default();
    let mut first = factory.fresh().unwrap();
    let user = first.provision_accounts(1).unwrap()[0];
    first.mint_test_tokens(user, CollateralAsset::Weth, ONE).unwrap();

    let second = factory.fresh().unwrap();
    assert_eq!(second.balance_of(CollateralAsset::Weth, user).unwrap(), 0);
}

#[test]
fn deposit_flow_lands_collateral_with_the_protocol() {
    let mut chain = chain();
    let user = chain.provision_accounts(1).unwrap()[0];
    let protocol = chain.address();

    chain.mint_test_tokens(user, CollateralAsset::Wbtc, 3 * ONE).unwrap();
    chain.approve(user, CollateralAsset::Wbtc, protocol, 3 * ONE).unwrap();
    chain.deposit_collateral(user, CollateralAsset::Wbtc, 3 * ONE).unwrap();

    assert_eq!(chain.collateral_balance_of(user, CollateralAsset::Wbtc).unwrap(), 3 * ONE);
    assert_eq!(chain.balance_of(CollateralAsset::Wbtc, protocol).unwrap(), 3 * ONE);
    assert_eq!(chain.usd_value(CollateralAsset::Wbtc, 3 * ONE).unwrap(), 3_000 * ONE);
}

#[test]
fn undercollateralized_mint_is_tagged_recoverable() {
    let mut chain = chain();
    let user = chain.provision_accounts(1).unwrap()[0];

    let err = chain.mint_synthetic(user, ONE).unwrap_err();
    assert_eq!(err.kind, RejectionKind::HealthFactor);
    assert!(err.kind.is_recoverable());
    assert!(err.reason.contains("BreaksHealthFactor"));
    assert_eq!(chain.total_supply().unwrap(), 0);
}

#[test]
fn other_rejections_are_not_recoverable() {
    let mut chain = chain();
    let user = chain.provision_accounts(1).unwrap()[0];

    let err = chain.deposit_collateral(user, CollateralAsset::Weth, ONE).unwrap_err();
    assert_eq!(err.kind, RejectionKind::InsufficientAllowance);
    assert!(!err.kind.is_recoverable());

    let err = chain.redeem_collateral(user, CollateralAsset::Weth, 1).unwrap_err();
    assert_eq!(err.kind, RejectionKind::InsufficientCollateral);
}

#[test]
fn oracle_round_trip_through_price_feed_handle() {
    let mut chain = chain();
    let oracle = chain.price_feed_of(CollateralAsset::Weth).unwrap();
    assert_eq!(chain.current_price(oracle).unwrap().raw(), 2_000 * FEED_PRECISION);

    let devalued = chain.current_price(oracle).unwrap().scaled(
        dsc_fuzz_core::PriceMultiplier::from_bps(2_000).unwrap(),
    );
    chain.set_price(oracle, devalued.unwrap()).unwrap();
    assert_eq!(chain.current_price(oracle).unwrap().raw(), 400 * FEED_PRECISION);
    assert_eq!(chain.token_amount_from_value(CollateralAsset::Weth, 400 * ONE).unwrap(), ONE);
}
