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

/// Deposit assets (or mint exact shares) and route the assets to the venue
///
/// Security checklist:
/// ✅ 1. SIGNER VALIDATION: Caller must be signer and owns the source account
/// ✅ 2. ACCOUNT OWNERSHIP: Vault state PDA validated with seeds
/// ✅ 6. MATH SAFETY: Checked u128 share math, rounding favors the vault
/// ✅ 7. TOKEN ACCOUNT VALIDATION: Validates mint and owner
/// ✅ 8. BUSINESS LOGIC: Checks-effects-interactions plus reentrancy lock
/// ✅ 10. EVENTS: Emits Deposited event
#[derive(Accounts)]
pub struct Deposit<'info> {
    /// Depositor
    /// Security: Must be signer
    #[account(mut)]
    pub caller: Signer<'info>,

    /// Vault state PDA
    /// Security: Validated by seeds, holds share supply and frozen config
    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref(), &vault_state.vault_id.to_le_bytes()],
        bump = vault_state.bump,
    )]
    pub vault_state: Account<'info, VaultState>,

    /// Share mint
    /// Security: Must match vault_state.share_mint
    #[account(
        mut,
        address = vault_state.share_mint,
    )]
    pub share_mint: Account<'info, Mint>,

    /// Vault authority PDA
    /// CHECK: PDA used as authority, validated by seeds
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, vault_state.key().as_ref()],
        bump = vault_state.authority_bump,
    )]
    pub vault_authority: UncheckedAccount<'info>,

    /// Vault's idle float
    /// Security: Must be the float recorded at initialization
    #[account(
        mut,
        address = vault_state.vault_token_account,
    )]
    pub vault_token_account: Account<'info, TokenAccount>,

    /// Caller's asset token account (source)
    /// Security: Must be owned by caller and correct mint
    #[account(
        mut,
        constraint = caller_asset_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
        constraint = caller_asset_account.owner == caller.key() @ VaultError::InvalidOwner,
    )]
    pub caller_asset_account: Account<'info, TokenAccount>,

    /// Receiver's share token account (destination); its owner is the receiver
    /// Security: Must be a share account
    #[account(
        mut,
        constraint = receiver_share_account.mint == vault_state.share_mint @ VaultError::InvalidMint,
    )]
    pub receiver_share_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

enum Entry {
    /// Exact assets in
    Assets(u64),
    /// Exact shares out
    Shares(u64),
}

pub fn deposit_handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, Deposit<'info>>,
    assets: u64,
    legs: Vec<u8>,
) -> Result<()> {
    enter(ctx, Entry::Assets(assets), legs)
}

pub fn mint_handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, Deposit<'info>>,
    shares: u64,
    legs: Vec<u8>,
) -> Result<()> {
    enter(ctx, Entry::Shares(shares), legs)
}

fn enter<'info>(
    ctx: Context<'_, '_, 'info, 'info, Deposit<'info>>,
    entry: Entry,
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
    let receiver = accounts.receiver_share_account.owner;
    let token_program = accounts.token_program.to_account_info();
    let float = accounts.vault_token_account.to_account_info();
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
        vec![],
    )?;
    let shares = SplShareLedger::new(
        token_program.clone(),
        accounts.share_mint.to_account_info(),
        vec![accounts.receiver_share_account.to_account_info()],
        accounts.caller.to_account_info(),
        signer.clone(),
    );
    let custody = SplCustody::new(
        token_program,
        accounts.vault_state.asset_mint,
        vec![float],
        vec![accounts.caller_asset_account.to_account_info()],
        Some(accounts.caller.to_account_info()),
        signer,
    );
    let mut engine = VaultEngine::new(venue, Box::new(shares), Box::new(custody));

    let vault_state = &mut accounts.vault_state;
    let (assets, shares) = match entry {
        Entry::Assets(assets) => {
            let shares = engine.deposit(vault_state, &caller, assets, &receiver)?;
            (assets, shares)
        }
        Entry::Shares(shares) => {
            let assets = engine.mint(vault_state, &caller, shares, &receiver)?;
            (assets, shares)
        }
    };

    emit!(Deposited {
        vault: vault_key,
        caller,
        receiver,
        assets,
        shares,
        total_assets: engine.total_assets()?,
        total_shares: vault_state.total_shares,
        timestamp: now,
    });

    Ok(())
}
