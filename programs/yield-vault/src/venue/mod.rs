//! Yield venues: one capability interface, one implementation per venue kind.

use anchor_lang::prelude::*;

use crate::{
    cpi::VaultSigner,
    errors::VaultError,
    ledger::AssetCustody,
    oracle::PricedMint,
    state::{VaultConfig, VenueConfig},
    swap::SwapBridge,
};

pub mod lending;
pub mod liquidity_gauge;
pub mod staking;

pub use lending::*;
pub use liquidity_gauge::*;
pub use staking::*;

/// Where the vault's capital works.
///
/// `venue_balance` is the deposit-asset value redeemable right now, valued by
/// the venue's own exchange rate plus any idle float the vault holds.
pub trait YieldVenue {
    /// Move `amount` of idle deposit asset into the venue.
    /// Fails only with `VenueUnavailable`.
    fn deposit_to_venue(&mut self, amount: u64) -> Result<()>;

    /// Release `amount` of deposit asset to `recipient`.
    /// Fails with `InsufficientVenueLiquidity` when the venue cannot supply it now.
    fn withdraw_from_venue(&mut self, amount: u64, recipient: &Pubkey) -> Result<()>;

    fn venue_balance(&self) -> Result<u64>;

    /// Portion of `venue_balance` that can leave the venue immediately
    fn available_liquidity(&self) -> Result<u64>;

    /// Pull pending reward tokens into the vault's reward accounts
    fn claim_rewards(&mut self) -> Result<()>;
}

/// Everything a CPI-backed venue needs from the current instruction
pub struct CpiVenueEnv<'a, 'info> {
    pub accounts: &'a [AccountInfo<'info>],
    pub signer: VaultSigner<'a, 'info>,
    pub float: Box<dyn AssetCustody + 'a>,
    pub bridge: Option<SwapBridge<'a>>,
}

/// Build the venue named by `config`. The choice is made once, here.
pub fn connect<'a, 'info: 'a>(
    config: &VaultConfig,
    asset: PricedMint,
    env: CpiVenueEnv<'a, 'info>,
) -> Result<Box<dyn YieldVenue + 'a>> {
    let CpiVenueEnv {
        accounts,
        signer,
        float,
        bridge,
    } = env;

    let venue: Box<dyn YieldVenue + 'a> = match &config.venue {
        VenueConfig::Lending(c) => {
            let market_mint = c
                .market_bridge
                .as_ref()
                .map(|b| b.market_mint)
                .unwrap_or(asset.mint);
            let market = CpiLendingMarket::new(c, market_mint, accounts, signer)?;
            let bridge = match &c.market_bridge {
                Some(b) => {
                    let market = PricedMint {
                        mint: b.market_mint,
                        decimals: b.market_decimals,
                        feed: Some(b.market_feed),
                    };
                    let bridge = bridge.ok_or(VaultError::InvalidLegLayout)?;
                    Some((market, bridge))
                }
                None => None,
            };
            Box::new(LendingVenue::new(Box::new(market), float, asset, bridge))
        }
        VenueConfig::LiquidityGauge(c) => {
            let port = CpiPoolGauge::new(c, asset.mint, accounts, signer)?;
            Box::new(PoolGaugeVenue::new(
                Box::new(port),
                float,
                asset.mint,
                c.coin_count,
                c.coin_index,
                config.slippage_bps,
            ))
        }
        VenueConfig::Staking(c) => {
            let port = CpiStakePool::new(c, asset.mint, accounts, signer)?;
            let derivative = PricedMint {
                mint: c.derivative_mint,
                decimals: c.derivative_decimals,
                feed: Some(c.derivative_feed),
            };
            let bridge = bridge.ok_or(VaultError::InvalidLegLayout)?;
            Box::new(StakingVenue::new(
                Box::new(port),
                float,
                bridge,
                asset,
                derivative,
                c.entry,
            ))
        }
    };

    msg!("Connected {} venue", config.venue.name());
    Ok(venue)
}

/// Whether operations against this venue need the swap router and oracle
pub fn needs_bridge(config: &VaultConfig) -> bool {
    match &config.venue {
        VenueConfig::Lending(c) => c.market_bridge.is_some(),
        VenueConfig::LiquidityGauge(_) => false,
        // exits always swap the derivative back through the pool
        VenueConfig::Staking(_) => true,
    }
}
