use anchor_lang::prelude::*;

use crate::{
    cpi::{
        ensure_leg_scope, find_account, find_vault_ata, invoke_leg, invoke_view_u64,
        token_amount, vault_atas, InstructionData, VaultSigner,
    },
    errors::VaultError,
    ledger::AssetCustody,
    math::{gross_up_for_slippage, mul_div, rescale, Rounding},
    oracle::PricedMint,
    state::LendingConfig,
    swap::SwapBridge,
};

use super::YieldVenue;

/// Raw lending reserve operations, in the market's unit of account
pub trait LendingMarket {
    /// Supply liquidity from the vault, receiving receipts
    fn supply(&mut self, amount: u64) -> Result<()>;

    /// Burn receipts; returns the liquidity that reached the vault
    fn redeem(&mut self, receipts: u64) -> Result<u64>;

    fn receipt_balance(&self) -> Result<u64>;

    /// Reserve exchange rate applied to `receipts`
    fn receipts_to_liquidity(&self, receipts: u64) -> Result<u64>;

    /// Unborrowed liquidity the reserve can pay out now
    fn free_liquidity(&self) -> Result<u64>;

    fn claim_rewards(&mut self) -> Result<()>;
}

/// Lending venue. With a market bridge, deposit asset is swapped into the
/// market unit on the way in and back on the way out; the position is valued
/// at par between the two, rescaled for decimals.
pub struct LendingVenue<'a> {
    market: Box<dyn LendingMarket + 'a>,
    float: Box<dyn AssetCustody + 'a>,
    asset: PricedMint,
    bridge: Option<(PricedMint, SwapBridge<'a>)>,
}

impl<'a> LendingVenue<'a> {
    pub fn new(
        market: Box<dyn LendingMarket + 'a>,
        float: Box<dyn AssetCustody + 'a>,
        asset: PricedMint,
        bridge: Option<(PricedMint, SwapBridge<'a>)>,
    ) -> Self {
        Self {
            market,
            float,
            asset,
            bridge,
        }
    }

    fn to_asset_units(&self, market_amount: u64) -> Result<u64> {
        match &self.bridge {
            Some((market, _)) => rescale(market_amount, market.decimals, self.asset.decimals),
            None => Ok(market_amount),
        }
    }

    fn position_value(&self) -> Result<u64> {
        let receipts = self.market.receipt_balance()?;
        if receipts == 0 {
            return Ok(0);
        }
        self.to_asset_units(self.market.receipts_to_liquidity(receipts)?)
    }

    /// Market liquidity to redeem so that `shortfall` of deposit asset arrives.
    /// Bridged, this is enough that even a fill at the slippage bound covers
    /// the shortfall.
    fn market_amount_for(&self, shortfall: u64) -> Result<u64> {
        match &self.bridge {
            Some((market, bridge)) => {
                let target = gross_up_for_slippage(shortfall, bridge.slippage_bps)?;
                // one unit over the floored quote rounds the sale up
                Ok(bridge.oracle.quote(&self.asset, market, target)?.saturating_add(1))
            }
            None => Ok(shortfall),
        }
    }

    /// Deposit asset that `market_amount` is guaranteed to become on exit
    fn exit_value(&self, market_amount: u64) -> Result<u64> {
        match &self.bridge {
            Some((market, bridge)) => Ok(bridge
                .oracle
                .bound(market, &self.asset, market_amount, bridge.slippage_bps)?
                .min_amount_out),
            None => Ok(market_amount),
        }
    }

    fn supply(&mut self, amount: u64) -> Result<()> {
        let amount = match &mut self.bridge {
            Some((market, bridge)) => bridge.convert(&self.asset, market, amount)?,
            None => amount,
        };

        let before = self.market.receipt_balance()?;
        self.market.supply(amount)?;
        let minted = self
            .market
            .receipt_balance()?
            .checked_sub(before)
            .ok_or(VaultError::PositionNotCredited)?;
        require!(minted > 0, VaultError::PositionNotCredited);

        // receipts are floored at the reserve rate; allow one receipt of rounding
        let credited = self.market.receipts_to_liquidity(minted)?;
        let dust = self.market.receipts_to_liquidity(1)?.saturating_add(1);
        msg!("Supplied {} for {} receipts worth {}", amount, minted, credited);
        require!(
            credited.saturating_add(dust) >= amount,
            VaultError::PositionNotCredited
        );
        Ok(())
    }
}

impl<'a> YieldVenue for LendingVenue<'a> {
    fn deposit_to_venue(&mut self, amount: u64) -> Result<()> {
        self.supply(amount).map_err(|e| {
            msg!("Lending supply failed: {}", e);
            error!(VaultError::VenueUnavailable)
        })
    }

    fn withdraw_from_venue(&mut self, amount: u64, recipient: &Pubkey) -> Result<()> {
        let idle = self.float.balance(&self.asset.mint)?;

        if idle < amount {
            let receipts = self.market.receipt_balance()?;
            let position = if receipts == 0 {
                0
            } else {
                self.market.receipts_to_liquidity(receipts)?
            };

            let exitable = position.min(self.market.free_liquidity()?);
            let needed = self.market_amount_for(amount - idle)?.min(exitable);
            require!(needed > 0, VaultError::InsufficientVenueLiquidity);

            // round the receipt burn up so the payout covers the shortfall
            let burn = mul_div(needed, receipts, position, Rounding::Ceiling)?.min(receipts);
            let received = self.market.redeem(burn)?;
            msg!("Redeemed {} receipts for {} liquidity", burn, received);
            require!(
                self.market.receipt_balance()? >= receipts - burn,
                VaultError::PositionNotCredited
            );

            if let Some((market, bridge)) = &mut self.bridge {
                bridge.convert(market, &self.asset, received)?;
            }

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
        let receipts = self.market.receipt_balance()?;
        if receipts == 0 {
            return Ok(idle);
        }
        let position = self.market.receipts_to_liquidity(receipts)?;
        let exitable = position.min(self.market.free_liquidity()?);
        idle.checked_add(self.exit_value(exitable)?)
            .ok_or(error!(VaultError::MathOverflow))
    }

    fn claim_rewards(&mut self) -> Result<()> {
        self.market.claim_rewards()
    }
}

/// Lending reserve reached by CPI; every call receives the whole venue leg
pub struct CpiLendingMarket<'a, 'info> {
    program: Pubkey,
    accounts: &'a [AccountInfo<'info>],
    receipt_account: AccountInfo<'info>,
    liquidity_account: AccountInfo<'info>,
    liquidity_supply: AccountInfo<'info>,
    signer: VaultSigner<'a, 'info>,
}

impl<'a, 'info> CpiLendingMarket<'a, 'info> {
    pub fn new(
        config: &LendingConfig,
        market_mint: Pubkey,
        accounts: &'a [AccountInfo<'info>],
        signer: VaultSigner<'a, 'info>,
    ) -> Result<Self> {
        find_account(accounts, &config.program)?;
        find_account(accounts, &config.reserve)?;
        let vault = signer.key();
        ensure_leg_scope(
            accounts,
            &vault,
            &vault_atas(&vault, &[config.receipt_mint, market_mint]),
        )?;

        Ok(Self {
            program: config.program,
            accounts,
            receipt_account: find_vault_ata(accounts, &config.receipt_mint, &vault)?,
            liquidity_account: find_vault_ata(accounts, &market_mint, &vault)?,
            liquidity_supply: find_account(accounts, &config.liquidity_supply)?,
            signer,
        })
    }

    fn invoke(&self, data: InstructionData) -> Result<()> {
        invoke_leg(&self.program, self.accounts, data.into_bytes(), &self.signer)
    }
}

impl<'a, 'info> LendingMarket for CpiLendingMarket<'a, 'info> {
    fn supply(&mut self, amount: u64) -> Result<()> {
        self.invoke(InstructionData::new("deposit_reserve_liquidity").u64(amount))
    }

    fn redeem(&mut self, receipts: u64) -> Result<u64> {
        let before = token_amount(&self.liquidity_account)?;
        self.invoke(InstructionData::new("redeem_reserve_collateral").u64(receipts))?;
        let after = token_amount(&self.liquidity_account)?;
        after
            .checked_sub(before)
            .ok_or(error!(VaultError::MathOverflow))
    }

    fn receipt_balance(&self) -> Result<u64> {
        token_amount(&self.receipt_account)
    }

    fn receipts_to_liquidity(&self, receipts: u64) -> Result<u64> {
        let data = InstructionData::new("collateral_to_liquidity")
            .u64(receipts)
            .into_bytes();
        invoke_view_u64(&self.program, self.accounts, data, &self.signer)
    }

    fn free_liquidity(&self) -> Result<u64> {
        token_amount(&self.liquidity_supply)
    }

    fn claim_rewards(&mut self) -> Result<()> {
        self.invoke(InstructionData::new("claim_rewards"))
    }
}
