use anchor_lang::prelude::*;

use crate::{
    errors::VaultError,
    ledger::AssetCustody,
    oracle::PricedMint,
    state::VaultState,
    swap::SwapBridge,
    venue::YieldVenue,
};

/// Where a harvest currently stands
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HarvestStage {
    Idle,
    ClaimRewards,
    /// Converting the reward route at this index
    QuoteAndSwap(usize),
    Redeposit,
    Done,
}

/// Outcome of a completed harvest
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HarvestReport {
    pub reward_mints: Vec<Pubkey>,
    pub reward_amounts: Vec<u64>,
    pub swapped_amounts: Vec<u64>,
    pub assets_reinvested: u64,
    pub total_assets_before: u64,
    pub total_assets: u64,
}

/// Claim rewards, convert each into the deposit asset under an oracle bound,
/// and put the whole float back to work.
///
/// `conversions[i]` converts `reward_routes[i]`. Any failure aborts the harvest;
/// the transaction carrying it reverts as a unit.
pub struct Harvester<'h, 'a> {
    venue: &'h mut dyn YieldVenue,
    custody: &'h mut dyn AssetCustody,
    conversions: &'h mut [SwapBridge<'a>],
    asset: PricedMint,
    stage: HarvestStage,
}

impl<'h, 'a> Harvester<'h, 'a> {
    pub fn new(
        venue: &'h mut dyn YieldVenue,
        custody: &'h mut dyn AssetCustody,
        conversions: &'h mut [SwapBridge<'a>],
        asset: PricedMint,
    ) -> Self {
        Self {
            venue,
            custody,
            conversions,
            asset,
            stage: HarvestStage::Idle,
        }
    }

    pub fn stage(&self) -> HarvestStage {
        self.stage
    }

    pub fn run(&mut self, vault: &mut VaultState, now: i64) -> Result<HarvestReport> {
        vault.enter()?;
        let result = self.run_locked(vault, now);
        vault.exit();
        self.stage = HarvestStage::Idle;
        result
    }

    fn run_locked(&mut self, vault: &mut VaultState, now: i64) -> Result<HarvestReport> {
        vault.ensure_active()?;
        let routes = vault.config.reward_routes.clone();
        require!(
            self.conversions.len() >= routes.len(),
            VaultError::InvalidLegLayout
        );

        let mut report = HarvestReport {
            total_assets_before: self.venue.venue_balance()?,
            ..HarvestReport::default()
        };

        loop {
            self.stage = match self.stage {
                HarvestStage::Idle => HarvestStage::ClaimRewards,
                HarvestStage::ClaimRewards => {
                    self.venue.claim_rewards()?;
                    HarvestStage::QuoteAndSwap(0)
                }
                HarvestStage::QuoteAndSwap(i) if i < routes.len() => {
                    let route = &routes[i];
                    let amount = self.custody.balance(&route.mint)?;
                    let swapped = if amount == 0 {
                        0
                    } else {
                        let reward = PricedMint {
                            mint: route.mint,
                            decimals: route.decimals,
                            feed: Some(route.feed),
                        };
                        self.conversions[i].convert(&reward, &self.asset, amount)?
                    };
                    msg!("Reward {}: {} -> {}", route.mint, amount, swapped);

                    report.reward_mints.push(route.mint);
                    report.reward_amounts.push(amount);
                    report.swapped_amounts.push(swapped);
                    HarvestStage::QuoteAndSwap(i + 1)
                }
                HarvestStage::QuoteAndSwap(_) => HarvestStage::Redeposit,
                HarvestStage::Redeposit => {
                    let float = self.custody.balance(&self.asset.mint)?;
                    if float > 0 {
                        self.venue.deposit_to_venue(float)?;
                    }
                    report.assets_reinvested = float;
                    HarvestStage::Done
                }
                HarvestStage::Done => break,
            };
        }

        report.total_assets = self.venue.venue_balance()?;
        vault.last_harvest = now;
        Ok(report)
    }
}
