use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::{
    constants::*,
    cpi::{split_declared, Legs, VaultSigner},
    errors::*,
    events::*,
    ledger::SplCustody,
    oracle::PythPriceFeed,
    rescue,
    state::*,
};

use super::wiring::open_venue;

/// Return a stray token held by the vault authority
///
/// Security checklist:
/// ✅ 1. SIGNER VALIDATION: Vault authority only
/// ✅ 7. TOKEN ACCOUNT VALIDATION: Source owned by the vault PDA, destination same mint
/// ✅ 8. BUSINESS LOGIC: Vault-managed mints are refused
/// ✅ 10. EVENTS: Emits FundsRescued event
#[derive(Accounts)]
pub struct RescueFunds<'info> {
    pub authority: Signer<'info>,

    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref(), &vault_state.vault_id.to_le_bytes()],
        bump = vault_state.bump,
        constraint = vault_state.authority == authority.key() @ VaultError::Unauthorized,
    )]
    pub vault_state: Account<'info, VaultState>,

    /// CHECK: PDA used as authority, validated by seeds
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, vault_state.key().as_ref()],
        bump = vault_state.authority_bump,
    )]
    pub vault_authority: UncheckedAccount<'info>,

    /// Vault-held account of the stray token
    #[account(
        mut,
        constraint = source.owner == vault_authority.key() @ VaultError::InvalidOwner,
    )]
    pub source: Account<'info, TokenAccount>,

    /// Recipient's account for the same mint; its owner is the recipient
    #[account(
        mut,
        constraint = destination.mint == source.mint @ VaultError::InvalidMint,
    )]
    pub destination: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

pub fn rescue_funds_handler(ctx: Context<RescueFunds>) -> Result<()> {
    let accounts = ctx.accounts;

    let vault_key = accounts.vault_state.key();
    let bump = [accounts.vault_state.authority_bump];
    let seeds: &[&[u8]] = &[VAULT_AUTHORITY_SEED, vault_key.as_ref(), &bump];
    let signer_seeds = [seeds];
    let signer = VaultSigner {
        authority: accounts.vault_authority.to_account_info(),
        seeds: &signer_seeds,
    };

    let mint = accounts.source.mint;
    let to = accounts.destination.owner;
    let mut custody = SplCustody::new(
        accounts.token_program.to_account_info(),
        accounts.vault_state.asset_mint,
        vec![accounts.source.to_account_info()],
        vec![accounts.destination.to_account_info()],
        None,
        signer,
    );

    let caller = accounts.authority.key();
    let amount = rescue::rescue_funds(&mut accounts.vault_state, &caller, &mint, &mut custody, &to)?;

    emit!(FundsRescued {
        vault: vault_key,
        mint,
        to,
        amount,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}

/// Claim venue rewards and hand them to `to` unconverted
///
/// Remaining accounts are `[venue, oracle, swaps ..., payout]`: the declared
/// legs followed by the vault's reward accounts and `to`'s reward accounts.
#[derive(Accounts)]
pub struct RescueRewards<'info> {
    pub authority: Signer<'info>,

    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref(), &vault_state.vault_id.to_le_bytes()],
        bump = vault_state.bump,
        constraint = vault_state.authority == authority.key() @ VaultError::Unauthorized,
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

pub fn rescue_rewards_handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, RescueRewards<'info>>,
    to: Pubkey,
    legs: Vec<u8>,
) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let remaining = ctx.remaining_accounts;

    // everything past the declared legs is payout accounts
    let (leg_accounts, payout) = split_declared(remaining, &legs)?;
    let legs = Legs::split(leg_accounts, &legs)?;
    let accounts = ctx.accounts;

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
        legs.swaps,
        &feed,
        now,
        signer.clone(),
        token_program.clone(),
        vec![float],
        vec![],
    )?;

    let mut custody = SplCustody::new(
        token_program,
        accounts.vault_state.asset_mint,
        remaining.to_vec(),
        payout.to_vec(),
        None,
        signer,
    );

    let caller = accounts.authority.key();
    let swept = rescue::rescue_rewards(
        &mut accounts.vault_state,
        &caller,
        venue.as_mut(),
        &mut custody,
        &to,
    )?;

    for (mint, amount) in swept {
        emit!(RewardsRescued {
            vault: vault_key,
            mint,
            to,
            amount,
            timestamp: now,
        });
    }

    Ok(())
}
