use anchor_lang::prelude::*;

use crate::{
    cpi::VaultSigner,
    ledger::SplCustody,
    oracle::{OracleGuard, PriceFeed, PricedMint},
    state::VaultState,
    swap::{CpiSwapRouter, SwapBridge},
    venue::{self, CpiVenueEnv, YieldVenue},
};

/// The deposit asset as the oracle guard sees it
pub fn deposit_asset(vault: &VaultState) -> PricedMint {
    PricedMint {
        mint: vault.asset_mint,
        decimals: vault.asset_decimals,
        feed: vault.config.asset_feed,
    }
}

/// Router bounded by the oracle, consuming `legs` one swap at a time
pub fn swap_bridge<'a, 'info: 'a>(
    vault: &VaultState,
    legs: Vec<&'a [AccountInfo<'info>]>,
    feed: &'a dyn PriceFeed,
    now: i64,
    signer: VaultSigner<'a, 'info>,
) -> SwapBridge<'a> {
    let router = CpiSwapRouter::new(vault.config.swap_program, legs, signer);
    SwapBridge::new(
        Box::new(router),
        OracleGuard::new(feed, now),
        vault.config.slippage_bps,
    )
}

/// Connect the configured venue. Its float is `float_accounts`; withdrawals
/// pay into `payees`.
#[allow(clippy::too_many_arguments)]
pub fn open_venue<'a, 'info: 'a>(
    vault: &VaultState,
    venue_leg: &'a [AccountInfo<'info>],
    bridge_legs: Vec<&'a [AccountInfo<'info>]>,
    feed: &'a dyn PriceFeed,
    now: i64,
    signer: VaultSigner<'a, 'info>,
    token_program: AccountInfo<'info>,
    float_accounts: Vec<AccountInfo<'info>>,
    payees: Vec<AccountInfo<'info>>,
) -> Result<Box<dyn YieldVenue + 'a>> {
    let float = SplCustody::new(
        token_program,
        vault.asset_mint,
        float_accounts,
        payees,
        None,
        signer.clone(),
    );

    let bridge = if venue::needs_bridge(&vault.config) {
        Some(swap_bridge(vault, bridge_legs, feed, now, signer.clone()))
    } else {
        None
    };

    venue::connect(
        &vault.config,
        deposit_asset(vault),
        CpiVenueEnv {
            accounts: venue_leg,
            signer,
            float: Box::new(float),
            bridge,
        },
    )
}
