use anchor_lang::prelude::*;

use crate::{
    cpi::{
        ensure_leg_scope, find_account, find_vault_ata, invoke_leg, invoke_view_u64,
        token_amount, vault_atas, InstructionData, VaultSigner,
    },
    errors::VaultError,
    ledger::AssetCustody,
    math::{apply_slippage_floor, mul_div, Rounding},
    state::PoolGaugeConfig,
};

use super::YieldVenue;

/// Pool and gauge operations the venue drives
pub trait PoolGauge {
    /// LP the pool would mint for `amounts`
    fn quote_add_liquidity(&self, amounts: &[u64]) -> Result<u64>;

    /// Returns the LP minted to the vault
    fn add_liquidity(&mut self, amounts: &[u64], min_lp: u64) -> Result<u64>;

    /// Coin `coin_index` the pool would pay for burning `lp`
    fn quote_remove_one_coin(&self, lp: u64, coin_index: u8) -> Result<u64>;

    /// Returns the coin amount that reached the vault
    fn remove_liquidity_one_coin(&mut self, lp: u64, coin_index: u8, min_amount: u64) -> Result<u64>;

    fn stake(&mut self, lp: u64) -> Result<()>;
    fn unstake(&mut self, lp: u64) -> Result<()>;

    /// LP staked in the gauge
    fn staked_balance(&self) -> Result<u64>;

    /// LP held by the vault outside the gauge
    fn unstaked_balance(&self) -> Result<u64>;

    /// Pool's reserve of the deposit coin
    fn coin_reserve(&self) -> Result<u64>;

    fn claim_rewards(&mut self) -> Result<()>;
}

/// Single-sided liquidity provision with the LP staked in a reward gauge
pub struct PoolGaugeVenue<'a> {
    port: Box<dyn PoolGauge + 'a>,
    float: Box<dyn AssetCustody + 'a>,
    asset_mint: Pubkey,
    coin_count: u8,
    coin_index: u8,
    slippage_bps: u16,
}

impl<'a> PoolGaugeVenue<'a> {
    pub fn new(
        port: Box<dyn PoolGauge + 'a>,
        float: Box<dyn AssetCustody + 'a>,
        asset_mint: Pubkey,
        coin_count: u8,
        coin_index: u8,
        slippage_bps: u16,
    ) -> Self {
        Self {
            port,
            float,
            asset_mint,
            coin_count,
            coin_index,
            slippage_bps,
        }
    }

    fn total_lp(&self) -> Result<u64> {
        self.port
            .staked_balance()?
            .checked_add(self.port.unstaked_balance()?)
            .ok_or(error!(VaultError::MathOverflow))
    }

    fn position_value(&self) -> Result<u64> {
        let lp = self.total_lp()?;
        if lp == 0 {
            return Ok(0);
        }
        self.port.quote_remove_one_coin(lp, self.coin_index)
    }

    fn provide(&mut self, amount: u64) -> Result<()> {
        let mut amounts = vec![0u64; self.coin_count as usize];
        amounts[self.coin_index as usize] = amount;

        let expected = self.port.quote_add_liquidity(&amounts)?;
        let min_lp = apply_slippage_floor(expected, self.slippage_bps)?;
        let lp_before = self.total_lp()?;
        let minted = self.port.add_liquidity(&amounts, min_lp)?;
        let credited = self
            .total_lp()?
            .checked_sub(lp_before)
            .ok_or(VaultError::PositionNotCredited)?;
        msg!("Added {} for {} LP (min {}, credited {})", amount, minted, min_lp, credited);
        require!(credited >= min_lp, VaultError::PositionNotCredited);

        // stake every loose LP, including leftovers from earlier exits
        let loose = self.port.unstaked_balance()?;
        let staked_before = self.port.staked_balance()?;
        self.port.stake(loose)?;
        let staked = self
            .port
            .staked_balance()?
            .checked_sub(staked_before)
            .ok_or(VaultError::PositionNotCredited)?;
        require!(staked >= loose, VaultError::PositionNotCredited);
        Ok(())
    }
}

impl<'a> YieldVenue for PoolGaugeVenue<'a> {
    fn deposit_to_venue(&mut self, amount: u64) -> Result<()> {
        self.provide(amount).map_err(|e| {
            msg!("Pool deposit failed: {}", e);
            error!(VaultError::VenueUnavailable)
        })
    }

    fn withdraw_from_venue(&mut self, amount: u64, recipient: &Pubkey) -> Result<()> {
        let idle = self.float.balance(&self.asset_mint)?;

        if idle < amount {
            let shortfall = amount - idle;
            let total_lp = self.total_lp()?;
            let value = self.position_value()?;
            require!(value >= shortfall, VaultError::InsufficientVenueLiquidity);
            require!(
                self.port.coin_reserve()? >= shortfall,
                VaultError::InsufficientVenueLiquidity
            );

            // one extra LP unit absorbs the pool's own rounding
            let lp_needed = mul_div(shortfall, total_lp, value, Rounding::Ceiling)?
                .saturating_add(1)
                .min(total_lp);

            let loose = self.port.unstaked_balance()?;
            if lp_needed > loose {
                self.port.unstake(lp_needed - loose)?;
            }

            let lp_before = self.total_lp()?;
            let received = self
                .port
                .remove_liquidity_one_coin(lp_needed, self.coin_index, shortfall)
                .map_err(|e| {
                    msg!("Pool exit failed: {}", e);
                    error!(VaultError::InsufficientVenueLiquidity)
                })?;

            // anything above the shortfall stays behind as float
            msg!("Burned {} LP for {} (needed {})", lp_needed, received, shortfall);
            require!(received >= shortfall, VaultError::InsufficientVenueLiquidity);
            require!(
                self.total_lp()? >= lp_before - lp_needed,
                VaultError::PositionNotCredited
            );
        }

        self.float.push(&self.asset_mint, recipient, amount)
    }

    fn venue_balance(&self) -> Result<u64> {
        let idle = self.float.balance(&self.asset_mint)?;
        idle.checked_add(self.position_value()?)
            .ok_or(error!(VaultError::MathOverflow))
    }

    fn available_liquidity(&self) -> Result<u64> {
        let idle = self.float.balance(&self.asset_mint)?;
        let exitable = self.position_value()?.min(self.port.coin_reserve()?);
        idle.checked_add(exitable)
            .ok_or(error!(VaultError::MathOverflow))
    }

    fn claim_rewards(&mut self) -> Result<()> {
        self.port.claim_rewards()
    }
}

/// Pool and gauge programs reached by CPI; both receive the whole venue leg
pub struct CpiPoolGauge<'a, 'info> {
    pool_program: Pubkey,
    gauge_program: Pubkey,
    accounts: &'a [AccountInfo<'info>],
    lp_account: AccountInfo<'info>,
    gauge_account: AccountInfo<'info>,
    coin_account: AccountInfo<'info>,
    pool_reserve: AccountInfo<'info>,
    signer: VaultSigner<'a, 'info>,
}

impl<'a, 'info> CpiPoolGauge<'a, 'info> {
    pub fn new(
        config: &PoolGaugeConfig,
        asset_mint: Pubkey,
        accounts: &'a [AccountInfo<'info>],
        signer: VaultSigner<'a, 'info>,
    ) -> Result<Self> {
        for key in [&config.pool_program, &config.pool, &config.gauge_program, &config.gauge] {
            find_account(accounts, key)?;
        }
        let vault = signer.key();
        ensure_leg_scope(
            accounts,
            &vault,
            &vault_atas(&vault, &[config.lp_mint, config.gauge_mint, asset_mint]),
        )?;
        let owned = |mint: &Pubkey| find_vault_ata(accounts, mint, &vault);

        Ok(Self {
            pool_program: config.pool_program,
            gauge_program: config.gauge_program,
            accounts,
            lp_account: owned(&config.lp_mint)?,
            gauge_account: owned(&config.gauge_mint)?,
            coin_account: owned(&asset_mint)?,
            pool_reserve: find_account(accounts, &config.pool_reserve)?,
            signer,
        })
    }

    fn pool(&self, data: InstructionData) -> Result<()> {
        invoke_leg(&self.pool_program, self.accounts, data.into_bytes(), &self.signer)
    }

    fn gauge(&self, data: InstructionData) -> Result<()> {
        invoke_leg(&self.gauge_program, self.accounts, data.into_bytes(), &self.signer)
    }

    fn delta(account: &AccountInfo, before: u64) -> Result<u64> {
        token_amount(account)?
            .checked_sub(before)
            .ok_or(error!(VaultError::MathOverflow))
    }
}

impl<'a, 'info> PoolGauge for CpiPoolGauge<'a, 'info> {
    fn quote_add_liquidity(&self, amounts: &[u64]) -> Result<u64> {
        let data = InstructionData::new("calc_token_amount").u64_vec(amounts).into_bytes();
        invoke_view_u64(&self.pool_program, self.accounts, data, &self.signer)
    }

    fn add_liquidity(&mut self, amounts: &[u64], min_lp: u64) -> Result<u64> {
        let before = token_amount(&self.lp_account)?;
        self.pool(InstructionData::new("add_liquidity").u64_vec(amounts).u64(min_lp))?;
        Self::delta(&self.lp_account, before)
    }

    fn quote_remove_one_coin(&self, lp: u64, coin_index: u8) -> Result<u64> {
        let data = InstructionData::new("calc_withdraw_one_coin")
            .u64(lp)
            .u8(coin_index)
            .into_bytes();
        invoke_view_u64(&self.pool_program, self.accounts, data, &self.signer)
    }

    fn remove_liquidity_one_coin(&mut self, lp: u64, coin_index: u8, min_amount: u64) -> Result<u64> {
        let before = token_amount(&self.coin_account)?;
        self.pool(
            InstructionData::new("remove_liquidity_one_coin")
                .u64(lp)
                .u8(coin_index)
                .u64(min_amount),
        )?;
        Self::delta(&self.coin_account, before)
    }

    fn stake(&mut self, lp: u64) -> Result<()> {
        if lp == 0 {
            return Ok(());
        }
        self.gauge(InstructionData::new("deposit").u64(lp))
    }

    fn unstake(&mut self, lp: u64) -> Result<()> {
        self.gauge(InstructionData::new("withdraw").u64(lp))
    }

    fn staked_balance(&self) -> Result<u64> {
        token_amount(&self.gauge_account)
    }

    fn unstaked_balance(&self) -> Result<u64> {
        token_amount(&self.lp_account)
    }

    fn coin_reserve(&self) -> Result<u64> {
        token_amount(&self.pool_reserve)
    }

    fn claim_rewards(&mut self) -> Result<()> {
        self.gauge(InstructionData::new("claim_rewards"))
    }
}
