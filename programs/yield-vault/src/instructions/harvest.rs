use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::{
    constants::*,
    cpi::{Legs, VaultSigner},
    errors::*,
    events::*,
    harvester::Harvester,
    ledger::SplCustody,
    oracle::PythPriceFeed,
    state::*,
};

use super::wiring::{deposit_asset, open_venue, swap_bridge};

/// Claim venue rewards, swap them into the deposit asset and reinvest
///
/// Permissionless. Remaining accounts are `[venue, oracle, reward_0 ..
/// reward_n-1, bridge swaps ...]` with one swap leg per configured reward
/// route; each reward leg carries the vault's reward token account.
#[derive(Accounts)]
pub struct Harvest<'info> {
    pub caller: Signer<'info>,

    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref(), &vault_state.vault_id.to_le_bytes()],
        bump = vault_state.bump,
    )]
    pub vault_state: Account<'info, VaultState>,

    /// CHECK: PDA used as authority, validated by seeds
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, vault_state.key().as_ref()],
        bump = vault_state.authority_bump,
    )]
    pub vault_authority: UncheckedAccount<'info>,

    #[account(
        mut,
        address = vault_state.vault_token_account,
    )]
    pub vault_token_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

pub fn handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, Harvest<'info>>,
    legs: Vec<u8>,
) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let legs = Legs::split(ctx.remaining_accounts, &legs)?;
    let accounts = ctx.accounts;

    let route_count = accounts.vault_state.config.reward_routes.len();
    require!(legs.swaps.len() >= route_count, VaultError::InvalidLegLayout);
    let (reward_legs, bridge_legs) = legs.swaps.split_at(route_count);

    let vault_key = accounts.vault_state.key();
    let bump = [accounts.vault_state.authority_bump];
    let seeds: &[&[u8]] = &[VAULT_AUTHORITY_SEED, vault_key.as_ref(), &bump];
    let signer_seeds = [seeds];
    let signer = VaultSigner {
        authority: accounts.vault_authority.to_account_info(),
        seeds: &signer_seeds,
    };

    let token_program = accounts.token_program.to_account_info();
    let float = accounts.vault_token_account.to_account_info();
    let feed = PythPriceFeed::new(legs.oracle);

    let mut venue = open_venue(
        &accounts.vault_state,
        legs.venue,
        bridge_legs.to_vec(),
        &feed,
        now,
        signer.clone(),
        token_program.clone(),
        vec![float.clone()],
        vec![],
    )?;

    // reward balances are read from the vault's accounts wherever they appear
    let mut held = vec![float];
    held.extend(ctx.remaining_accounts.iter().cloned());
    let mut custody = SplCustody::new(
        token_program,
        accounts.vault_state.asset_mint,
        held,
        vec![],
        None,
        signer.clone(),
    );

    let mut conversions: Vec<_> = reward_legs
        .iter()
        .map(|leg| swap_bridge(&accounts.vault_state, vec![*leg], &feed, now, signer.clone()))
        .collect();

    let asset = deposit_asset(&accounts.vault_state);
    let report = Harvester::new(venue.as_mut(), &mut custody, &mut conversions, asset)
        .run(&mut accounts.vault_state, now)?;

    emit!(HarvestCompleted {
        vault: vault_key,
        caller: accounts.caller.key(),
        reward_mints: report.reward_mints,
        reward_amounts: report.reward_amounts,
        swapped_amounts: report.swapped_amounts,
        assets_reinvested: report.assets_reinvested,
        total_assets: report.total_assets,
        timestamp: now,
    });

    Ok(())
}
