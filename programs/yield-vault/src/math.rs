use anchor_lang::prelude::*;

use crate::{constants::BPS_DENOMINATOR, errors::VaultError};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Rounding {
    Floor,
    Ceiling,
}

/// Safe multiplication then division with configurable rounding.
///
/// Computes `(value × numerator) / denominator` with a u128 intermediate.
pub fn mul_div(value: u64, numerator: u64, denominator: u64, rounding: Rounding) -> Result<u64> {
    let result = mul_div_u128(value as u128, numerator as u128, denominator as u128, rounding)?;
    u64::try_from(result).map_err(|_| error!(VaultError::MathOverflow))
}

/// u128 variant of [`mul_div`], used by price math where intermediates exceed u64.
pub fn mul_div_u128(value: u128, numerator: u128, denominator: u128, rounding: Rounding) -> Result<u128> {
    require!(denominator > 0, VaultError::DivisionByZero);

    let product = value
        .checked_mul(numerator)
        .ok_or(VaultError::MathOverflow)?;

    let result = match rounding {
        Rounding::Floor => product / denominator,
        Rounding::Ceiling => {
            let quotient = product / denominator;
            if product % denominator == 0 {
                quotient
            } else {
                quotient.checked_add(1).ok_or(VaultError::MathOverflow)?
            }
        }
    };

    Ok(result)
}

/// Convert assets to shares.
///
/// - Empty vault: shares = assets (1:1 bootstrap)
/// - Otherwise: shares = assets × total_shares / total_assets
///
/// A vault holding shares but no assets has lost its principal; new deposits
/// would be diluted to nothing, so the conversion fails instead.
pub fn convert_to_shares(
    assets: u64,
    total_assets: u64,
    total_shares: u64,
    rounding: Rounding,
) -> Result<u64> {
    if total_shares == 0 {
        return Ok(assets);
    }
    mul_div(assets, total_shares, total_assets, rounding)
}

/// Convert shares to assets.
///
/// - Empty vault: assets = shares (1:1 bootstrap)
/// - Otherwise: assets = shares × total_assets / total_shares
pub fn convert_to_assets(
    shares: u64,
    total_assets: u64,
    total_shares: u64,
    rounding: Rounding,
) -> Result<u64> {
    if total_shares == 0 {
        return Ok(shares);
    }
    mul_div(shares, total_assets, total_shares, rounding)
}

/// Remove `slippage_bps` from an amount, rounding down.
pub fn apply_slippage_floor(amount: u64, slippage_bps: u16) -> Result<u64> {
    let kept = BPS_DENOMINATOR
        .checked_sub(slippage_bps as u64)
        .ok_or(VaultError::MathOverflow)?;
    mul_div(amount, kept, BPS_DENOMINATOR, Rounding::Floor)
}

/// Gross an amount up so that removing `slippage_bps` still covers it.
pub fn gross_up_for_slippage(amount: u64, slippage_bps: u16) -> Result<u64> {
    let kept = BPS_DENOMINATOR
        .checked_sub(slippage_bps as u64)
        .ok_or(VaultError::MathOverflow)?;
    mul_div(amount, BPS_DENOMINATOR, kept, Rounding::Ceiling)
}

/// Re-express `amount` from `from_decimals` to `to_decimals`, rounding down
pub fn rescale(amount: u64, from_decimals: u8, to_decimals: u8) -> Result<u64> {
    if from_decimals == to_decimals {
        return Ok(amount);
    }
    let scaled = if to_decimals > from_decimals {
        (amount as u128)
            .checked_mul(pow10(to_decimals - from_decimals)?)
            .ok_or(VaultError::MathOverflow)?
    } else {
        amount as u128 / pow10(from_decimals - to_decimals)?
    };
    u64::try_from(scaled).map_err(|_| error!(VaultError::MathOverflow))
}

/// 10^exp as u128
pub fn pow10(exp: u8) -> Result<u128> {
    10u128
        .checked_pow(exp as u32)
        .ok_or(error!(VaultError::MathOverflow))
}
