use anchor_lang::prelude::*;
use pyth_solana_receiver_sdk::price_update::{PriceUpdateV2, VerificationLevel};

use crate::{
    constants::{BPS_DENOMINATOR, MAX_CONFIDENCE_BPS, MAX_PRICE_AGE_SECS, ORACLE_PRICE_DECIMALS},
    errors::VaultError,
    math::{apply_slippage_floor, mul_div_u128, pow10, Rounding},
};

/// Raw feed reading before validation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PriceObservation {
    pub price: i64,
    pub conf: u64,
    pub exponent: i32,
    pub publish_time: i64,
}

/// Validated USD price scaled to `decimals`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NormalizedPrice {
    pub price: u64,
    pub decimals: u8,
}

/// A mint together with how to price it. `feed: None` prices the mint at 1 USD.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PricedMint {
    pub mint: Pubkey,
    pub decimals: u8,
    pub feed: Option<[u8; 32]>,
}

/// Bound for a single swap, computed immediately before it executes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapBound {
    pub oracle_price_in: NormalizedPrice,
    pub oracle_price_out: NormalizedPrice,
    pub max_slippage_bps: u16,
    pub fair_amount_out: u64,
    pub min_amount_out: u64,
}

/// Source of raw price observations keyed by feed id
pub trait PriceFeed {
    fn observe(&self, feed_id: &[u8; 32]) -> Result<PriceObservation>;
}

/// Validates feed observations and derives swap bounds from them.
///
/// Prices bound swap outputs only; nothing here values vault assets.
#[derive(Clone, Copy)]
pub struct OracleGuard<'a> {
    feed: &'a dyn PriceFeed,
    now: i64,
}

impl<'a> OracleGuard<'a> {
    pub fn new(feed: &'a dyn PriceFeed, now: i64) -> Self {
        Self { feed, now }
    }

    /// Validated price of `feed_id`, scaled to ORACLE_PRICE_DECIMALS
    pub fn price(&self, feed_id: &[u8; 32]) -> Result<NormalizedPrice> {
        let observation = self.feed.observe(feed_id)?;
        normalize(&observation, self.now)
    }

    /// USD price of `asset`; unpriced assets are taken at 1 USD
    pub fn usd_price(&self, asset: &PricedMint) -> Result<NormalizedPrice> {
        match &asset.feed {
            Some(feed_id) => self.price(feed_id),
            None => Ok(NormalizedPrice {
                price: pow10(ORACLE_PRICE_DECIMALS)? as u64,
                decimals: ORACLE_PRICE_DECIMALS,
            }),
        }
    }

    /// Fair amount of `to` for `amount_in` of `from` at oracle prices
    pub fn quote(&self, from: &PricedMint, to: &PricedMint, amount_in: u64) -> Result<u64> {
        let price_in = self.usd_price(from)?;
        let price_out = self.usd_price(to)?;
        cross_amount(amount_in, from.decimals, &price_in, to.decimals, &price_out)
    }

    /// Oracle-derived bound: fair output reduced by `slippage_bps`
    pub fn bound(
        &self,
        from: &PricedMint,
        to: &PricedMint,
        amount_in: u64,
        slippage_bps: u16,
    ) -> Result<SwapBound> {
        let price_in = self.usd_price(from)?;
        let price_out = self.usd_price(to)?;
        let fair = cross_amount(amount_in, from.decimals, &price_in, to.decimals, &price_out)?;
        let min_amount_out = apply_slippage_floor(fair, slippage_bps)?;

        Ok(SwapBound {
            oracle_price_in: price_in,
            oracle_price_out: price_out,
            max_slippage_bps: slippage_bps,
            fair_amount_out: fair,
            min_amount_out,
        })
    }
}

/// Reject stale, non-positive or uncertain observations and rescale to 9
/// decimals
pub fn normalize(observation: &PriceObservation, now: i64) -> Result<NormalizedPrice> {
    require!(observation.price > 0, VaultError::InvalidOraclePrice);

    // conf shares the price's exponent
    let spread = (observation.conf as u128) * (BPS_DENOMINATOR as u128);
    let allowed = (observation.price as u128) * (MAX_CONFIDENCE_BPS as u128);
    require!(spread <= allowed, VaultError::OracleConfidenceTooWide);

    let age = now.saturating_sub(observation.publish_time).max(0);
    require!(age <= MAX_PRICE_AGE_SECS, VaultError::StaleOraclePrice);

    let raw = observation.price as u128;
    let shift = ORACLE_PRICE_DECIMALS as i32 + observation.exponent;
    let scaled = if shift >= 0 {
        let factor = pow10(u8::try_from(shift).map_err(|_| error!(VaultError::MathOverflow))?)?;
        raw.checked_mul(factor).ok_or(VaultError::MathOverflow)?
    } else {
        let factor = pow10(u8::try_from(-shift).map_err(|_| error!(VaultError::MathOverflow))?)?;
        raw / factor
    };

    // a price that rounds to zero at 9 decimals cannot bound anything
    require!(scaled > 0, VaultError::InvalidOraclePrice);

    Ok(NormalizedPrice {
        price: u64::try_from(scaled).map_err(|_| error!(VaultError::MathOverflow))?,
        decimals: ORACLE_PRICE_DECIMALS,
    })
}

/// amount_in · p_in / p_out, rescaled from `in_decimals` to `out_decimals`
fn cross_amount(
    amount_in: u64,
    in_decimals: u8,
    price_in: &NormalizedPrice,
    out_decimals: u8,
    price_out: &NormalizedPrice,
) -> Result<u64> {
    require!(price_out.price > 0, VaultError::InvalidOraclePrice);

    let value = (amount_in as u128)
        .checked_mul(price_in.price as u128)
        .ok_or(VaultError::MathOverflow)?;

    let out = if out_decimals >= in_decimals {
        let scale = pow10(out_decimals - in_decimals)?;
        mul_div_u128(value, scale, price_out.price as u128, Rounding::Floor)?
    } else {
        let scale = pow10(in_decimals - out_decimals)?;
        let denominator = (price_out.price as u128)
            .checked_mul(scale)
            .ok_or(VaultError::MathOverflow)?;
        mul_div_u128(value, 1, denominator, Rounding::Floor)?
    };

    u64::try_from(out).map_err(|_| error!(VaultError::MathOverflow))
}

/// Pyth pull-oracle feed backed by `PriceUpdateV2` accounts
pub struct PythPriceFeed<'a, 'info> {
    accounts: &'a [AccountInfo<'info>],
}

impl<'a, 'info> PythPriceFeed<'a, 'info> {
    pub fn new(accounts: &'a [AccountInfo<'info>]) -> Self {
        Self { accounts }
    }
}

impl<'a, 'info> PriceFeed for PythPriceFeed<'a, 'info> {
    fn observe(&self, feed_id: &[u8; 32]) -> Result<PriceObservation> {
        let owner = <PriceUpdateV2 as Owner>::owner();

        for info in self.accounts.iter().filter(|acc| *acc.owner == owner) {
            let data = info.try_borrow_data()?;
            let update = PriceUpdateV2::try_deserialize(&mut &data[..])?;
            if update.price_message.feed_id != *feed_id {
                continue;
            }

            require!(
                matches!(update.verification_level, VerificationLevel::Full),
                VaultError::InvalidOraclePrice
            );

            let message = &update.price_message;
            return Ok(PriceObservation {
                price: message.price,
                conf: message.conf,
                exponent: message.exponent,
                publish_time: message.publish_time,
            });
        }

        msg!("No price update supplied for feed {:?}", feed_id);
        err!(VaultError::OracleFeedNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FixedFeed(HashMap<[u8; 32], PriceObservation>);

    impl PriceFeed for FixedFeed {
        fn observe(&self, feed_id: &[u8; 32]) -> Result<PriceObservation> {
            self.0
                .get(feed_id)
                .copied()
                .ok_or(error!(VaultError::OracleFeedNotFound))
        }
    }

    #[test]
    fn test_wide_confidence_rejected() {
        // 1.00 USD +/- 0.02 sits on the limit, +/- 0.03 is past it
        let mut observation = obs(100_000_000, -8, 100);
        observation.conf = 2_000_000;
        assert!(normalize(&observation, 100).is_ok());

        observation.conf = 3_000_000;
        match normalize(&observation, 100) {
            Err(anchor_lang::error::Error::AnchorError(e)) => assert_eq!(
                e.error_code_number,
                u32::from(VaultError::OracleConfidenceTooWide)
            ),
            other => panic!("expected a confidence error, got {:?}", other),
        }
    }

    fn obs(price: i64, exponent: i32, publish_time: i64) -> PriceObservation {
        PriceObservation {
            price,
            conf: 0,
            exponent,
            publish_time,
        }
    }

    #[test]
    fn test_normalize_scales_to_nine_decimals() {
        // 1.5 USD at exponent -8
        let price = normalize(&obs(150_000_000, -8, 100), 100).unwrap();
        assert_eq!(price.price, 1_500_000_000);
        assert_eq!(price.decimals, 9);

        // exponent -12 divides down
        let price = normalize(&obs(2_000_000_000_000, -12, 100), 100).unwrap();
        assert_eq!(price.price, 2_000_000_000);
    }

    #[test]
    fn test_stale_price_rejected() {
        assert!(normalize(&obs(100, -8, 0), MAX_PRICE_AGE_SECS).is_ok());
        assert!(normalize(&obs(100, -8, 0), MAX_PRICE_AGE_SECS + 1).is_err());
    }

    #[test]
    fn test_future_publish_time_counts_as_fresh() {
        assert!(normalize(&obs(100, -8, 110), 100).is_ok());
    }

    #[test]
    fn test_non_positive_price_rejected() {
        assert!(normalize(&obs(0, -8, 0), 0).is_err());
        assert!(normalize(&obs(-5, -8, 0), 0).is_err());
    }

    #[test]
    fn test_bound_applies_slippage_to_cross_rate() {
        let reward_feed = [1u8; 32];
        let mut feeds = HashMap::new();
        // reward at 2 USD
        feeds.insert(reward_feed, obs(200_000_000, -8, 0));
        let feed = FixedFeed(feeds);
        let guard = OracleGuard::new(&feed, 10);

        let reward = PricedMint {
            mint: Pubkey::new_unique(),
            decimals: 9,
            feed: Some(reward_feed),
        };
        let usdc = PricedMint {
            mint: Pubkey::new_unique(),
            decimals: 6,
            feed: None,
        };

        // 100 reward tokens -> 200 USDC fair, 0.5% slippage
        let bound = guard.bound(&reward, &usdc, 100_000_000_000, 50).unwrap();
        assert_eq!(bound.fair_amount_out, 200_000_000);
        assert_eq!(bound.min_amount_out, 199_000_000);

        // and back the other way
        let back = guard.quote(&usdc, &reward, 200_000_000).unwrap();
        assert_eq!(back, 100_000_000_000);
    }

    #[test]
    fn test_missing_feed_fails() {
        let feed = FixedFeed(HashMap::new());
        let guard = OracleGuard::new(&feed, 0);
        assert!(guard.price(&[9u8; 32]).is_err());
    }
}
