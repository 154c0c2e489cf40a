use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::{
    accounting::VaultEngine,
    constants::*,
    cpi::{Legs, VaultSigner},
    errors::*,
    events::*,
    ledger::{SplCustody, SplShareLedger},
    oracle::PythPriceFeed,
    state::*,
};

use super::wiring::open_venue;

/// Withdraw exact assets (or redeem exact shares) from an owner's position
///
/// Security checklist:
/// ✅ 1. SIGNER VALIDATION: Caller is the owner or an SPL delegate of the owner's shares
/// ✅ 2. ACCOUNT OWNERSHIP: Vault state PDA validated with seeds
/// ✅ 6. MATH SAFETY: Shares burned round up, assets paid round down
/// ✅ 7. TOKEN ACCOUNT VALIDATION: Validates mints
/// ✅ 8. BUSINESS LOGIC: Shares burned before the venue releases funds
/// ✅ 10. EVENTS: Emits Withdrawn event
#[derive(Accounts)]
pub struct Withdraw<'info> {
    /// Owner or approved spender
    #[account(mut)]
    pub caller: Signer<'info>,

    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref(), &vault_state.vault_id.to_le_bytes()],
        bump = vault_state.bump,
    )]
    pub vault_state: Account<'info, VaultState>,

    #[account(
        mut,
        address = vault_state.share_mint,
    )]
    pub share_mint: Account<'info, Mint>,

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

    /// Share account being burned from; its owner is the position owner
    #[account(
        mut,
        constraint = owner_share_account.mint == vault_state.share_mint @ VaultError::InvalidMint,
    )]
    pub owner_share_account: Account<'info, TokenAccount>,

    /// Receiver's asset token account; its owner is the receiver
    #[account(
        mut,
        constraint = receiver_asset_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
    )]
    pub receiver_asset_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

enum Exit {
    /// Exact assets out
    Assets(u64),
    /// Exact shares in
    Shares(u64),
}

pub fn withdraw_handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, Withdraw<'info>>,
    assets: u64,
    legs: Vec<u8>,
) -> Result<()> {
    exit(ctx, Exit::Assets(assets), legs)
}

pub fn redeem_handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, Withdraw<'info>>,
    shares: u64,
    legs: Vec<u8>,
) -> Result<()> {
    exit(ctx, Exit::Shares(shares), legs)
}

fn exit<'info>(
    ctx: Context<'_, '_, 'info, 'info, Withdraw<'info>>,
    request: Exit,
    legs: Vec<u8>,
) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let legs = Legs::split(ctx.remaining_accounts, &legs)?;
    let accounts = ctx.accounts;

    let vault_key = accounts.vault_state.key();
    let bump = [accounts.vault_state.authority_bump];
    let seeds: &[&[u8]] = &[VAULT_AUTHORITY_SEED, vault_key.as_ref(), &bump];
    let signer_seeds = [seeds];
    let signer = VaultSigner {
        authority: accounts.vault_authority.to_account_info(),
        seeds: &signer_seeds,
    };

    let caller = accounts.caller.key();
    let owner = accounts.owner_share_account.owner;
    let receiver = accounts.receiver_asset_account.owner;
    let token_program = accounts.token_program.to_account_info();
    let float = accounts.vault_token_account.to_account_info();
    let payee = accounts.receiver_asset_account.to_account_info();
    let feed = PythPriceFeed::new(legs.oracle);

    let venue = open_venue(
        &accounts.vault_state,
        legs.venue,
        legs.swaps,
        &feed,
        now,
        signer.clone(),
        token_program.clone(),
        vec![float.clone()],
        vec![payee.clone()],
    )?;
    let shares = SplShareLedger::new(
        token_program.clone(),
        accounts.share_mint.to_account_info(),
        vec![accounts.owner_share_account.to_account_info()],
        accounts.caller.to_account_info(),
        signer.clone(),
    );
    let custody = SplCustody::new(
        token_program,
        accounts.vault_state.asset_mint,
        vec![float],
        vec![payee],
        None,
        signer,
    );
    let mut engine = VaultEngine::new(venue, Box::new(shares), Box::new(custody));

    let vault_state = &mut accounts.vault_state;
    let (assets, shares) = match request {
        Exit::Assets(assets) => {
            let shares = engine.withdraw(vault_state, &caller, assets, &receiver, &owner)?;
            (assets, shares)
        }
        Exit::Shares(shares) => {
            let assets = engine.redeem(vault_state, &caller, shares, &receiver, &owner)?;
            (assets, shares)
        }
    };

    emit!(Withdrawn {
        vault: vault_key,
        caller,
        receiver,
        owner,
        assets,
        shares,
        total_assets: engine.total_assets()?,
        total_shares: vault_state.total_shares,
        timestamp: now,
    });

    Ok(())
}
