/// Harvest pipeline: claim, oracle-bounded conversion, reinvestment
mod common;

use anchor_lang::prelude::*;
use common::*;
use yield_vault::{
    errors::VaultError,
    harvester::{HarvestStage, Harvester},
    oracle::{OracleGuard, PricedMint},
    state::{RewardRoute, VaultState},
    swap::SwapBridge,
};

const NOW: i64 = 1_700_000_000;
const FEED_A: [u8; 32] = [0xa1; 32];
const FEED_B: [u8; 32] = [0xb2; 32];

struct Rewards {
    world: Shared,
    vault: VaultState,
    mint_a: Pubkey,
    mint_b: Pubkey,
}

/// Two reward tokens: A at $2.00 and B at $0.50, both 6 decimals
fn setup() -> Rewards {
    let world = World::new();
    let (mint_a, mint_b) = (Pubkey::new_unique(), Pubkey::new_unique());

    let mut config = lending_config();
    config.reward_routes = vec![
        RewardRoute {
            mint: mint_a,
            decimals: 6,
            feed: FEED_A,
        },
        RewardRoute {
            mint: mint_b,
            decimals: 6,
            feed: FEED_B,
        },
    ];
    let vault = vault_state(&world, config);

    {
        let mut w = world.borrow_mut();
        let asset = w.asset_mint;
        w.prices.insert(FEED_A, usd(2.0, NOW - 5));
        w.prices.insert(FEED_B, usd(0.5, NOW - 5));
        w.pending_rewards = vec![(mint_a, 100), (mint_b, 50)];
        w.router_rates.insert((mint_a, asset), (2, 1));
        w.router_rates.insert((mint_b, asset), (1, 2));
        w.venue_position = 10_000;
    }

    Rewards {
        world,
        vault,
        mint_a,
        mint_b,
    }
}

fn asset_of(r: &Rewards) -> PricedMint {
    PricedMint {
        mint: r.vault.asset_mint,
        decimals: r.vault.asset_decimals,
        feed: r.vault.config.asset_feed,
    }
}

#[test]
fn test_harvest_converts_and_reinvests() {
    let mut r = setup();
    let feed = MockFeed(r.world.clone());
    let slippage = r.vault.config.slippage_bps;
    let mut conversions: Vec<SwapBridge> = (0..2)
        .map(|_| {
            SwapBridge::new(
                Box::new(MockRouter(r.world.clone())),
                OracleGuard::new(&feed, NOW),
                slippage,
            )
        })
        .collect();
    let mut venue = MockVenue(r.world.clone());
    let mut custody = MockCustody(r.world.clone());
    let asset = asset_of(&r);

    let mut harvester = Harvester::new(&mut venue, &mut custody, &mut conversions, asset);
    let report = harvester.run(&mut r.vault, NOW).unwrap();
    assert_eq!(harvester.stage(), HarvestStage::Idle);

    assert_eq!(report.reward_mints, vec![r.mint_a, r.mint_b]);
    assert_eq!(report.reward_amounts, vec![100, 50]);
    // 100 A at $2 -> 200 asset, 50 B at $0.50 -> 25 asset
    assert_eq!(report.swapped_amounts, vec![200, 25]);
    assert_eq!(report.assets_reinvested, 225);
    assert_eq!(report.total_assets_before, 10_000);
    assert_eq!(report.total_assets, 10_225);
    assert!(report.total_assets >= report.total_assets_before);

    assert_eq!(r.vault.last_harvest, NOW);
    assert!(!r.vault.locked);
    let w = r.world.borrow();
    assert_eq!(w.float(), 0);
    assert_eq!(w.balance(&w.vault, &r.mint_a), 0);
    assert_eq!(w.balance(&w.vault, &r.mint_b), 0);
    assert_eq!(w.swaps_executed.len(), 2);
}

#[test]
fn test_harvest_reverts_whole_when_one_swap_is_below_bound() {
    let mut r = setup();
    {
        // B fills at a third of its $0.50 fair price per unit: 16 < min 24
        let mut w = r.world.borrow_mut();
        let asset = w.asset_mint;
        w.router_rates.insert((r.mint_b, asset), (1, 3));
    }
    let before = r.world.borrow().clone();

    let feed = MockFeed(r.world.clone());
    let slippage = r.vault.config.slippage_bps;
    let mut conversions: Vec<SwapBridge> = (0..2)
        .map(|_| {
            SwapBridge::new(
                Box::new(MockRouter(r.world.clone())),
                OracleGuard::new(&feed, NOW),
                slippage,
            )
        })
        .collect();
    let mut venue = MockVenue(r.world.clone());
    let mut custody = MockCustody(r.world.clone());
    let asset = asset_of(&r);

    let mut harvester = Harvester::new(&mut venue, &mut custody, &mut conversions, asset);
    let result = transact(&r.world, &mut r.vault, |vault| harvester.run(vault, NOW));
    assert_vault_error(result, VaultError::ExcessiveSlippage);

    let w = r.world.borrow();
    assert_eq!(w.pending_rewards, before.pending_rewards);
    assert_eq!(w.balances, before.balances);
    assert_eq!(w.venue_position, 10_000);
    assert!(w.swaps_executed.is_empty());
    assert_eq!(r.vault.last_harvest, 0);
    assert!(!r.vault.locked);
}

#[test]
fn test_harvest_rejects_stale_reward_price() {
    let mut r = setup();
    r.world
        .borrow_mut()
        .prices
        .insert(FEED_A, usd(2.0, NOW - 600));

    let feed = MockFeed(r.world.clone());
    let mut conversions: Vec<SwapBridge> = (0..2)
        .map(|_| {
            SwapBridge::new(
                Box::new(MockRouter(r.world.clone())),
                OracleGuard::new(&feed, NOW),
                50,
            )
        })
        .collect();
    let mut venue = MockVenue(r.world.clone());
    let mut custody = MockCustody(r.world.clone());
    let asset = asset_of(&r);

    let mut harvester = Harvester::new(&mut venue, &mut custody, &mut conversions, asset);
    let result = transact(&r.world, &mut r.vault, |vault| harvester.run(vault, NOW));
    assert_vault_error(result, VaultError::StaleOraclePrice);
    assert_eq!(r.world.borrow().pending_rewards.len(), 2);
}

#[test]
fn test_harvest_blocked_while_paused() {
    let mut r = setup();
    r.vault.paused = true;

    let feed = MockFeed(r.world.clone());
    let mut conversions: Vec<SwapBridge> = (0..2)
        .map(|_| {
            SwapBridge::new(
                Box::new(MockRouter(r.world.clone())),
                OracleGuard::new(&feed, NOW),
                50,
            )
        })
        .collect();
    let mut venue = MockVenue(r.world.clone());
    let mut custody = MockCustody(r.world.clone());
    let asset = asset_of(&r);

    let mut harvester = Harvester::new(&mut venue, &mut custody, &mut conversions, asset);
    assert_vault_error(harvester.run(&mut r.vault, NOW), VaultError::VaultPaused);
    assert_eq!(r.world.borrow().pending_rewards.len(), 2);
}

#[test]
fn test_harvest_needs_a_conversion_per_route() {
    let mut r = setup();
    let feed = MockFeed(r.world.clone());
    let mut conversions = vec![SwapBridge::new(
        Box::new(MockRouter(r.world.clone())),
        OracleGuard::new(&feed, NOW),
        50,
    )];
    let mut venue = MockVenue(r.world.clone());
    let mut custody = MockCustody(r.world.clone());
    let asset = asset_of(&r);

    let mut harvester = Harvester::new(&mut venue, &mut custody, &mut conversions, asset);
    assert_vault_error(harvester.run(&mut r.vault, NOW), VaultError::InvalidLegLayout);
}

#[test]
fn test_harvest_without_rewards_reinvests_float() {
    let world = World::new();
    let mut vault = vault_state(&world, lending_config());
    {
        let mut w = world.borrow_mut();
        let (owner, asset) = (w.vault, w.asset_mint);
        w.credit(&owner, &asset, 40);
        w.venue_position = 1_000;
    }

    let mut venue = MockVenue(world.clone());
    let mut custody = MockCustody(world.clone());
    let asset = PricedMint {
        mint: vault.asset_mint,
        decimals: 6,
        feed: None,
    };

    let mut conversions: Vec<SwapBridge> = Vec::new();

    let mut harvester = Harvester::new(&mut venue, &mut custody, &mut conversions, asset);
    let report = harvester.run(&mut vault, NOW).unwrap();

    assert!(report.reward_mints.is_empty());
    assert_eq!(report.assets_reinvested, 40);
    assert_eq!(report.total_assets_before, 1_040);
    assert_eq!(report.total_assets, 1_040);
    assert_eq!(world.borrow().venue_position, 1_040);
}
