// Yield Vault - ERC-4626-style share vault routing one deposit asset into one yield venue
// Security: Checks-effects-interactions with a reentrancy lock on every state-mutating entry point
// Architecture: Venue selected once from immutable config; swaps bounded by Pyth prices

use anchor_lang::prelude::*;

pub mod accounting;
pub mod constants;
pub mod cpi;
pub mod errors;
pub mod events;
pub mod harvester;
pub mod instructions;
pub mod ledger;
pub mod math;
pub mod oracle;
pub mod rescue;
pub mod state;
pub mod swap;
pub mod venue;

use instructions::*;
use state::VaultConfig;

declare_id!("8NL7d4NNKY8xv543b5Fet4Jc9x7WqhD7HrzfzyGgfyJt");

#[program]
pub mod yield_vault {
    use super::*;

    /// Initialize a vault for a deposit asset with frozen venue wiring
    ///
    /// Security considerations:
    /// - Validates the whole configuration before storing it
    /// - Creates share mint with the vault authority PDA as mint authority
    /// - Configuration is never mutated afterwards
    pub fn initialize(ctx: Context<Initialize>, vault_id: u64, config: VaultConfig) -> Result<()> {
        instructions::initialize::handler(ctx, vault_id, config)
    }

    /// Deposit exact assets and receive shares (rounded down)
    ///
    /// `legs` partitions remaining accounts into `[venue, oracle, swaps...]`
    pub fn deposit<'info>(
        ctx: Context<'_, '_, 'info, 'info, Deposit<'info>>,
        assets: u64,
        legs: Vec<u8>,
    ) -> Result<()> {
        instructions::deposit::deposit_handler(ctx, assets, legs)
    }

    /// Mint exact shares, paying assets (rounded up)
    pub fn mint<'info>(
        ctx: Context<'_, '_, 'info, 'info, Deposit<'info>>,
        shares: u64,
        legs: Vec<u8>,
    ) -> Result<()> {
        instructions::deposit::mint_handler(ctx, shares, legs)
    }

    /// Withdraw exact assets, burning shares (rounded up)
    ///
    /// Security considerations:
    /// - Caller must own the shares or be their SPL delegate
    /// - Bounded by max_withdraw, which reflects venue liquidity
    pub fn withdraw<'info>(
        ctx: Context<'_, '_, 'info, 'info, Withdraw<'info>>,
        assets: u64,
        legs: Vec<u8>,
    ) -> Result<()> {
        instructions::withdraw::withdraw_handler(ctx, assets, legs)
    }

    /// Redeem exact shares for assets (rounded down)
    pub fn redeem<'info>(
        ctx: Context<'_, '_, 'info, 'info, Withdraw<'info>>,
        shares: u64,
        legs: Vec<u8>,
    ) -> Result<()> {
        instructions::withdraw::redeem_handler(ctx, shares, legs)
    }

    /// Claim rewards, swap them under oracle bounds and reinvest everything
    ///
    /// Permissionless; blocked while paused
    pub fn harvest_and_deposit_rewards<'info>(
        ctx: Context<'_, '_, 'info, 'info, Harvest<'info>>,
        legs: Vec<u8>,
    ) -> Result<()> {
        instructions::harvest::handler(ctx, legs)
    }

    /// Return a non-protected token held by the vault
    pub fn rescue_funds(ctx: Context<RescueFunds>) -> Result<()> {
        instructions::rescue::rescue_funds_handler(ctx)
    }

    /// Claim and sweep reward tokens without converting them
    pub fn rescue_rewards<'info>(
        ctx: Context<'_, '_, 'info, 'info, RescueRewards<'info>>,
        to: Pubkey,
        legs: Vec<u8>,
    ) -> Result<()> {
        instructions::rescue::rescue_rewards_handler(ctx, to, legs)
    }

    pub fn pause(ctx: Context<Admin>) -> Result<()> {
        instructions::admin::set_paused(ctx, true)
    }

    pub fn unpause(ctx: Context<Admin>) -> Result<()> {
        instructions::admin::set_paused(ctx, false)
    }

    pub fn transfer_authority(ctx: Context<Admin>, new_authority: Pubkey) -> Result<()> {
        instructions::admin::transfer_authority_handler(ctx, new_authority)
    }

    // ============ View Functions (CPI composable) ============

    pub fn total_assets<'info>(
        ctx: Context<'_, '_, 'info, 'info, VaultView<'info>>,
        legs: Vec<u8>,
    ) -> Result<()> {
        instructions::view::handler(ctx, Query::TotalAssets, legs)
    }

    pub fn convert_to_shares<'info>(
        ctx: Context<'_, '_, 'info, 'info, VaultView<'info>>,
        assets: u64,
        legs: Vec<u8>,
    ) -> Result<()> {
        instructions::view::handler(ctx, Query::ConvertToShares(assets), legs)
    }

    pub fn convert_to_assets<'info>(
        ctx: Context<'_, '_, 'info, 'info, VaultView<'info>>,
        shares: u64,
        legs: Vec<u8>,
    ) -> Result<()> {
        instructions::view::handler(ctx, Query::ConvertToAssets(shares), legs)
    }

    pub fn preview_deposit<'info>(
        ctx: Context<'_, '_, 'info, 'info, VaultView<'info>>,
        assets: u64,
        legs: Vec<u8>,
    ) -> Result<()> {
        instructions::view::handler(ctx, Query::PreviewDeposit(assets), legs)
    }

    pub fn preview_mint<'info>(
        ctx: Context<'_, '_, 'info, 'info, VaultView<'info>>,
        shares: u64,
        legs: Vec<u8>,
    ) -> Result<()> {
        instructions::view::handler(ctx, Query::PreviewMint(shares), legs)
    }

    pub fn preview_withdraw<'info>(
        ctx: Context<'_, '_, 'info, 'info, VaultView<'info>>,
        assets: u64,
        legs: Vec<u8>,
    ) -> Result<()> {
        instructions::view::handler(ctx, Query::PreviewWithdraw(assets), legs)
    }

    pub fn preview_redeem<'info>(
        ctx: Context<'_, '_, 'info, 'info, VaultView<'info>>,
        shares: u64,
        legs: Vec<u8>,
    ) -> Result<()> {
        instructions::view::handler(ctx, Query::PreviewRedeem(shares), legs)
    }

    /// Requires `owner_share_account`
    pub fn max_withdraw<'info>(
        ctx: Context<'_, '_, 'info, 'info, VaultView<'info>>,
        legs: Vec<u8>,
    ) -> Result<()> {
        instructions::view::handler(ctx, Query::MaxWithdraw, legs)
    }

    /// Requires `owner_share_account`
    pub fn max_redeem<'info>(
        ctx: Context<'_, '_, 'info, 'info, VaultView<'info>>,
        legs: Vec<u8>,
    ) -> Result<()> {
        instructions::view::handler(ctx, Query::MaxRedeem, legs)
    }

    /// Requires `owner_share_account`
    pub fn balance_of<'info>(
        ctx: Context<'_, '_, 'info, 'info, VaultView<'info>>,
        legs: Vec<u8>,
    ) -> Result<()> {
        instructions::view::handler(ctx, Query::BalanceOf, legs)
    }
}
