use anchor_lang::prelude::*;
use anchor_lang::solana_program::program::set_return_data;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::{
    accounting::VaultEngine,
    constants::*,
    cpi::{Legs, VaultSigner},
    errors::*,
    ledger::{SplCustody, SplShareLedger},
    oracle::PythPriceFeed,
    state::*,
};

use super::wiring::open_venue;

/// Read-only vault queries; results are returned as little-endian u64 return data
#[derive(Accounts)]
pub struct VaultView<'info> {
    #[account(
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref(), &vault_state.vault_id.to_le_bytes()],
        bump = vault_state.bump,
    )]
    pub vault_state: Account<'info, VaultState>,

    #[account(address = vault_state.share_mint)]
    pub share_mint: Account<'info, Mint>,

    /// CHECK: PDA used as authority, validated by seeds
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, vault_state.key().as_ref()],
        bump = vault_state.authority_bump,
    )]
    pub vault_authority: UncheckedAccount<'info>,

    #[account(address = vault_state.vault_token_account)]
    pub vault_token_account: Account<'info, TokenAccount>,

    /// Required by owner-scoped queries; its owner is the queried holder
    #[account(
        constraint = owner_share_account.mint == vault_state.share_mint @ VaultError::InvalidMint,
    )]
    pub owner_share_account: Option<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
}

#[derive(Clone, Copy, Debug)]
pub enum Query {
    TotalAssets,
    ConvertToShares(u64),
    ConvertToAssets(u64),
    PreviewDeposit(u64),
    PreviewMint(u64),
    PreviewWithdraw(u64),
    PreviewRedeem(u64),
    MaxWithdraw,
    MaxRedeem,
    BalanceOf,
}

pub fn handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, VaultView<'info>>,
    query: Query,
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

    let token_program = accounts.token_program.to_account_info();
    let float = accounts.vault_token_account.to_account_info();
    let feed = PythPriceFeed::new(legs.oracle);
    let owner = accounts.owner_share_account.as_ref().map(|acc| acc.owner);
    let holders: Vec<AccountInfo<'info>> = accounts
        .owner_share_account
        .iter()
        .map(|acc| acc.to_account_info())
        .collect();

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
        holders,
        accounts.vault_authority.to_account_info(),
        signer.clone(),
    );
    let custody = SplCustody::new(
        token_program,
        accounts.vault_state.asset_mint,
        vec![float],
        vec![],
        None,
        signer,
    );
    let engine = VaultEngine::new(venue, Box::new(shares), Box::new(custody));

    let vault = &accounts.vault_state;
    let holder = || owner.ok_or(error!(VaultError::InvalidOwner));
    let value = match query {
        Query::TotalAssets => engine.total_assets()?,
        Query::ConvertToShares(assets) => engine.convert_to_shares(vault, assets)?,
        Query::ConvertToAssets(shares) => engine.convert_to_assets(vault, shares)?,
        Query::PreviewDeposit(assets) => engine.preview_deposit(vault, assets)?,
        Query::PreviewMint(shares) => engine.preview_mint(vault, shares)?,
        Query::PreviewWithdraw(assets) => engine.preview_withdraw(vault, assets)?,
        Query::PreviewRedeem(shares) => engine.preview_redeem(vault, shares)?,
        Query::MaxWithdraw => engine.max_withdraw(vault, &holder()?)?,
        Query::MaxRedeem => engine.max_redeem(vault, &holder()?)?,
        Query::BalanceOf => engine.balance_of(&holder()?)?,
    };

    set_return_data(&value.to_le_bytes());
    Ok(())
}
