use anchor_lang::prelude::*;

use crate::{
    errors::VaultError,
    ledger::AssetCustody,
    state::VaultState,
    venue::YieldVenue,
};

/// Move the vault's entire balance of a stray `mint` to `to`.
///
/// The deposit asset, the share mint, venue position mints and reward mints
/// are never movable here. Returns the amount rescued.
pub fn rescue_funds(
    vault: &mut VaultState,
    caller: &Pubkey,
    mint: &Pubkey,
    custody: &mut dyn AssetCustody,
    to: &Pubkey,
) -> Result<u64> {
    vault.ensure_authority(caller)?;
    require!(*to != Pubkey::default(), VaultError::ZeroAddress);
    require!(!vault.is_protected(mint), VaultError::ProtectedAsset);

    vault.enter()?;
    let result = sweep(custody, mint, to);
    vault.exit();

    let amount = result?;
    msg!("Rescued {} of {}", amount, mint);
    Ok(amount)
}

/// Claim pending rewards and hand every reward balance to `to` without
/// converting it. Returns `(mint, amount)` for each reward route.
pub fn rescue_rewards(
    vault: &mut VaultState,
    caller: &Pubkey,
    venue: &mut dyn YieldVenue,
    custody: &mut dyn AssetCustody,
    to: &Pubkey,
) -> Result<Vec<(Pubkey, u64)>> {
    vault.ensure_authority(caller)?;
    require!(*to != Pubkey::default(), VaultError::ZeroAddress);

    vault.enter()?;
    let result = sweep_rewards(vault, venue, custody, to);
    vault.exit();
    result
}

fn sweep_rewards(
    vault: &VaultState,
    venue: &mut dyn YieldVenue,
    custody: &mut dyn AssetCustody,
    to: &Pubkey,
) -> Result<Vec<(Pubkey, u64)>> {
    venue.claim_rewards()?;

    let mut swept = Vec::with_capacity(vault.config.reward_routes.len());
    for route in &vault.config.reward_routes {
        let amount = sweep(custody, &route.mint, to)?;
        swept.push((route.mint, amount));
    }
    Ok(swept)
}

fn sweep(custody: &mut dyn AssetCustody, mint: &Pubkey, to: &Pubkey) -> Result<u64> {
    let amount = custody.balance(mint)?;
    if amount > 0 {
        custody.push(mint, to, amount)?;
    }
    Ok(amount)
}
