use anchor_lang::prelude::*;

use crate::{
    cpi::{
        ensure_leg_scope, find_account, find_vault_ata, invoke_leg, invoke_view_u64,
        token_amount, vault_atas, InstructionData, VaultSigner,
    },
    errors::VaultError,
    ledger::AssetCustody,
    math::gross_up_for_slippage,
    oracle::PricedMint,
    state::{StakingConfig, StakingEntry},
    swap::SwapBridge,
};

use super::YieldVenue;

/// Liquid staking program holding the native side of the derivative
pub trait StakePool {
    /// Wrap native deposit asset into the derivative
    fn stake(&mut self, amount: u64) -> Result<()>;

    fn derivative_balance(&self) -> Result<u64>;

    /// Stake program's own redemption rate
    fn derivative_to_native(&self, amount: u64) -> Result<u64>;

    /// Native liquidity in the stable pool the vault exits through
    fn pool_native_reserve(&self) -> Result<u64>;
}

/// Staking derivative venue. Exits swap the derivative back through the
/// stable pool at no worse than the oracle fair rate less slippage.
pub struct StakingVenue<'a> {
    pool: Box<dyn StakePool + 'a>,
    float: Box<dyn AssetCustody + 'a>,
    bridge: SwapBridge<'a>,
    asset: PricedMint,
    derivative: PricedMint,
    entry: StakingEntry,
}

impl<'a> StakingVenue<'a> {
    pub fn new(
        pool: Box<dyn StakePool + 'a>,
        float: Box<dyn AssetCustody + 'a>,
        bridge: SwapBridge<'a>,
        asset: PricedMint,
        derivative: PricedMint,
        entry: StakingEntry,
    ) -> Self {
        Self {
            pool,
            float,
            bridge,
            asset,
            derivative,
            entry,
        }
    }

    fn position_value(&self) -> Result<u64> {
        let held = self.pool.derivative_balance()?;
        if held == 0 {
            return Ok(0);
        }
        self.pool.derivative_to_native(held)
    }

    fn enter(&mut self, amount: u64) -> Result<()> {
        let before = self.pool.derivative_balance()?;
        match self.entry {
            StakingEntry::Wrap => self.pool.stake(amount)?,
            StakingEntry::StablePool => {
                let received = self.bridge.convert(&self.asset, &self.derivative, amount)?;
                msg!("Bought {} derivative for {}", received, amount);
            }
        }

        let credited = self
            .pool
            .derivative_balance()?
            .checked_sub(before)
            .ok_or(VaultError::PositionNotCredited)?;
        require!(credited > 0, VaultError::PositionNotCredited);
        if let StakingEntry::Wrap = self.entry {
            // the stake program floors the derivative it mints; allow one unit
            let dust = self.pool.derivative_to_native(1)?.saturating_add(1);
            require!(
                self.pool.derivative_to_native(credited)?.saturating_add(dust) >= amount,
                VaultError::PositionNotCredited
            );
        }
        Ok(())
    }

    /// Derivative to sell so that even a fill at the slippage bound covers
    /// `shortfall`, capped at what the vault holds
    fn sell_amount_for(&self, shortfall: u64, held: u64) -> Result<u64> {
        let target = gross_up_for_slippage(shortfall, self.bridge.slippage_bps)?;
        let fair = self.bridge.oracle.quote(&self.asset, &self.derivative, target)?;
        // one unit over the floored quote rounds the sale up
        Ok(fair.saturating_add(1).min(held))
    }
}

impl<'a> YieldVenue for StakingVenue<'a> {
    fn deposit_to_venue(&mut self, amount: u64) -> Result<()> {
        self.enter(amount).map_err(|e| {
            msg!("Staking entry failed: {}", e);
            error!(VaultError::VenueUnavailable)
        })
    }

    fn withdraw_from_venue(&mut self, amount: u64, recipient: &Pubkey) -> Result<()> {
        let idle = self.float.balance(&self.asset.mint)?;

        if idle < amount {
            let shortfall = amount - idle;
            require!(
                self.pool.pool_native_reserve()? >= shortfall,
                VaultError::InsufficientVenueLiquidity
            );

            let held = self.pool.derivative_balance()?;
            let sell = self.sell_amount_for(shortfall, held)?;
            require!(sell > 0, VaultError::InsufficientVenueLiquidity);

            let received = self.bridge.convert(&self.derivative, &self.asset, sell)?;
            msg!("Sold {} derivative for {} (needed {})", sell, received, shortfall);

            require!(
                self.float.balance(&self.asset.mint)? >= amount,
                VaultError::InsufficientVenueLiquidity
            );
        }

        self.float.push(&self.asset.mint, recipient, amount)
    }

    fn venue_balance(&self) -> Result<u64> {
        let idle = self.float.balance(&self.asset.mint)?;
        idle.checked_add(self.position_value()?)
            .ok_or(error!(VaultError::MathOverflow))
    }

    fn available_liquidity(&self) -> Result<u64> {
        let idle = self.float.balance(&self.asset.mint)?;
        let held = self.pool.derivative_balance()?;
        if held == 0 {
            return Ok(idle);
        }
        // what selling everything is guaranteed to fetch
        let worst_fill = self
            .bridge
            .oracle
            .bound(&self.derivative, &self.asset, held, self.bridge.slippage_bps)?
            .min_amount_out;
        let exitable = worst_fill.min(self.pool.pool_native_reserve()?);
        idle.checked_add(exitable)
            .ok_or(error!(VaultError::MathOverflow))
    }

    /// Staking yield accrues in the redemption rate; there is nothing to claim
    fn claim_rewards(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Stake program reached by CPI
pub struct CpiStakePool<'a, 'info> {
    program: Pubkey,
    accounts: &'a [AccountInfo<'info>],
    derivative_account: AccountInfo<'info>,
    pool_reserve: AccountInfo<'info>,
    signer: VaultSigner<'a, 'info>,
}

impl<'a, 'info> CpiStakePool<'a, 'info> {
    pub fn new(
        config: &StakingConfig,
        asset_mint: Pubkey,
        accounts: &'a [AccountInfo<'info>],
        signer: VaultSigner<'a, 'info>,
    ) -> Result<Self> {
        find_account(accounts, &config.stake_program)?;
        find_account(accounts, &config.stake_pool)?;
        let vault = signer.key();
        ensure_leg_scope(
            accounts,
            &vault,
            &vault_atas(&vault, &[config.derivative_mint, asset_mint]),
        )?;

        Ok(Self {
            program: config.stake_program,
            accounts,
            derivative_account: find_vault_ata(accounts, &config.derivative_mint, &vault)?,
            pool_reserve: find_account(accounts, &config.pool_reserve)?,
            signer,
        })
    }
}

impl<'a, 'info> StakePool for CpiStakePool<'a, 'info> {
    fn stake(&mut self, amount: u64) -> Result<()> {
        let data = InstructionData::new("deposit").u64(amount).into_bytes();
        invoke_leg(&self.program, self.accounts, data, &self.signer)
    }

    fn derivative_balance(&self) -> Result<u64> {
        token_amount(&self.derivative_account)
    }

    fn derivative_to_native(&self, amount: u64) -> Result<u64> {
        let data = InstructionData::new("derivative_to_native").u64(amount).into_bytes();
        invoke_view_u64(&self.program, self.accounts, data, &self.signer)
    }

    fn pool_native_reserve(&self) -> Result<u64> {
        token_amount(&self.pool_reserve)
    }
}
