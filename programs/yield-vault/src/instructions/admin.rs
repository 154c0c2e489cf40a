use anchor_lang::prelude::*;

use crate::{constants::*, errors::*, events::*, state::*};

/// Authority-only vault controls
#[derive(Accounts)]
pub struct Admin<'info> {
    /// Security: Must be the stored vault authority
    pub authority: Signer<'info>,

    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref(), &vault_state.vault_id.to_le_bytes()],
        bump = vault_state.bump,
        constraint = vault_state.authority == authority.key() @ VaultError::Unauthorized,
    )]
    pub vault_state: Account<'info, VaultState>,
}

/// Pausing blocks harvest, deposit and mint; exits stay open
pub fn set_paused(ctx: Context<Admin>, paused: bool) -> Result<()> {
    let vault_state = &mut ctx.accounts.vault_state;
    vault_state.ensure_authority(&ctx.accounts.authority.key())?;

    vault_state.paused = paused;
    msg!("Vault paused: {}", paused);

    emit!(VaultPauseChanged {
        vault: vault_state.key(),
        paused,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}

pub fn transfer_authority_handler(ctx: Context<Admin>, new_authority: Pubkey) -> Result<()> {
    require!(new_authority != Pubkey::default(), VaultError::ZeroAddress);

    let vault_state = &mut ctx.accounts.vault_state;
    vault_state.ensure_authority(&ctx.accounts.authority.key())?;

    let previous = vault_state.authority;
    vault_state.authority = new_authority;

    emit!(AuthorityTransferred {
        vault: vault_state.key(),
        previous,
        new_authority,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
