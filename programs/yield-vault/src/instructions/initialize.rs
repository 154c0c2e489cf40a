use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token::{Mint, Token, TokenAccount},
};

use crate::{constants::*, events::*, state::*};

/// Initialize a new vault over one deposit asset and one venue
#[derive(Accounts)]
#[instruction(vault_id: u64)]
pub struct Initialize<'info> {
    /// Vault authority - can pause, rescue stray tokens and hand over authority
    /// Security: Must be signer, stored in state
    #[account(mut)]
    pub authority: Signer<'info>,

    /// Vault state PDA
    /// Security: One vault per (asset, vault_id); padded for upgrades
    #[account(
        init,
        payer = authority,
        space = VaultState::SPACE,
        seeds = [VAULT_SEED, asset_mint.key().as_ref(), &vault_id.to_le_bytes()],
        bump
    )]
    pub vault_state: Account<'info, VaultState>,

    /// Deposit asset mint
    pub asset_mint: Account<'info, Mint>,

    /// Share token mint PDA
    /// Security: Mint authority is the vault_authority PDA
    #[account(
        init,
        payer = authority,
        seeds = [SHARE_MINT_SEED, vault_state.key().as_ref()],
        bump,
        mint::decimals = asset_mint.decimals,
        mint::authority = vault_authority,
    )]
    pub share_mint: Account<'info, Mint>,

    /// Vault authority PDA - owns every vault token account and signs venue CPIs
    /// CHECK: PDA used as token authority, validated by seeds
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, vault_state.key().as_ref()],
        bump
    )]
    pub vault_authority: UncheckedAccount<'info>,

    /// Idle float of the deposit asset
    /// Security: Owned by vault_authority PDA, correct mint
    #[account(
        init,
        payer = authority,
        associated_token::mint = asset_mint,
        associated_token::authority = vault_authority,
    )]
    pub vault_token_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<Initialize>, vault_id: u64, config: VaultConfig) -> Result<()> {
    // CHECKS: Wiring is frozen from here on, so validate it all now
    config.validate(&ctx.accounts.asset_mint.key())?;

    let vault_state = &mut ctx.accounts.vault_state;

    // EFFECTS: Initialize vault state
    vault_state.authority = ctx.accounts.authority.key();
    vault_state.asset_mint = ctx.accounts.asset_mint.key();
    vault_state.asset_decimals = ctx.accounts.asset_mint.decimals;
    vault_state.share_mint = ctx.accounts.share_mint.key();
    vault_state.vault_token_account = ctx.accounts.vault_token_account.key();
    vault_state.vault_id = vault_id;
    vault_state.total_shares = 0;
    vault_state.config = config;
    vault_state.paused = false;
    vault_state.locked = false;
    vault_state.last_harvest = 0;
    vault_state.bump = ctx.bumps.vault_state;
    vault_state.share_bump = ctx.bumps.share_mint;
    vault_state.authority_bump = ctx.bumps.vault_authority;
    vault_state._reserved = [0; 64];

    msg!(
        "Vault {} over {} routed to {} venue",
        vault_id,
        vault_state.asset_mint,
        vault_state.config.venue.name()
    );

    emit!(VaultInitialized {
        vault: vault_state.key(),
        authority: vault_state.authority,
        asset_mint: vault_state.asset_mint,
        share_mint: vault_state.share_mint,
        venue: vault_state.config.venue.name().to_string(),
        slippage_bps: vault_state.config.slippage_bps,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
